//! Replay server for the student-portal API.
//!
//! Answers `POST /{endpoint}` from a log of recorded calls. The request's
//! `data` form field is decoded, the session credentials (`regID`, `token`)
//! are dropped, and the first recording with the same endpoint and the same
//! JSON body wins. A log collected through a session observer can be replayed
//! as is.

use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Device registration is answered even when it was never recorded.
pub const REGISTER_ENDPOINT: &str = "register.php";

const CREDENTIAL_FIELDS: [&str; 2] = ["regID", "token"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedCall {
    pub endpoint: String,
    /// Request body without credentials.
    pub request: Value,
    /// Full response envelope.
    pub response: Value,
    /// Wait this long before answering.
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplayLog {
    pub calls: Vec<RecordedCall>,
}

impl ReplayLog {
    pub fn new(calls: Vec<RecordedCall>) -> Self {
        Self { calls }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn find(&self, endpoint: &str, request: &Value) -> Option<&RecordedCall> {
        self.calls
            .iter()
            .find(|call| call.endpoint == endpoint && call.request == *request)
    }
}

pub fn app(log: ReplayLog) -> Router {
    Router::new()
        .route("/{endpoint}", post(replay))
        .with_state(Arc::new(log))
}

pub async fn run(listener: TcpListener, log: ReplayLog) -> Result<(), std::io::Error> {
    axum::serve(listener, app(log)).await
}

fn testing_error(message: &str) -> Value {
    json!({ "esito": { "testing-server": { "stato": -1, "error": message } } })
}

/// Decode the `data` form field and strip the credentials.
fn decode_request(body: &str) -> Result<Value, String> {
    let fields: Vec<(String, String)> = serde_urlencoded::from_str(body).map_err(|e| e.to_string())?;
    let (_, data) = fields
        .into_iter()
        .find(|(name, _)| name == "data")
        .ok_or_else(|| "missing form field `data`".to_string())?;

    let mut request: Value = serde_json::from_str(&data).map_err(|e| e.to_string())?;
    let fields = request
        .as_object_mut()
        .ok_or_else(|| "`data` is not a JSON object".to_string())?;
    for name in CREDENTIAL_FIELDS {
        fields.remove(name);
    }
    Ok(request)
}

async fn replay(
    State(log): State<Arc<ReplayLog>>,
    UrlPath(endpoint): UrlPath<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let request = match decode_request(&body) {
        Ok(request) => request,
        Err(reason) => {
            tracing::warn!(%endpoint, %reason, "undecodable request");
            return (StatusCode::BAD_REQUEST, Json(testing_error(&reason)));
        }
    };
    tracing::debug!(%endpoint, %request, "replaying");

    match log.find(&endpoint, &request) {
        Some(call) => {
            if call.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(call.delay_ms)).await;
            }
            (StatusCode::OK, Json(call.response.clone()))
        }
        None if endpoint == REGISTER_ENDPOINT => (StatusCode::OK, Json(json!({}))),
        None => {
            tracing::warn!(%endpoint, %request, "no recording matches");
            (
                StatusCode::NOT_FOUND,
                Json(testing_error("No log entry matches your request")),
            )
        }
    }
}
