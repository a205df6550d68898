//! Network execution of portal requests.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. `send` wraps one
//! round-trip in `tokio::time::timeout`: when the bound expires the transport
//! future is dropped, which for `ReqwestTransport` closes the connection, so a
//! timed-out request leaves nothing running behind it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::PortalClient;
use crate::envelope::Envelope;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Executes one HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.body(request.body).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Post `body` to `endpoint` and return the parsed envelope.
///
/// The envelope is not classified here; see `envelope::check_error`.
pub async fn send<T>(
    transport: &T,
    client: &PortalClient,
    endpoint: &str,
    body: &Value,
    timeout: Duration,
) -> Result<Envelope, TransportError>
where
    T: Transport + ?Sized,
{
    let request = client.build_request(endpoint, body)?;
    tracing::debug!(endpoint, url = %request.url, "posting portal request");

    let response = match tokio::time::timeout(timeout, transport.execute(request)).await {
        Ok(result) => result?,
        Err(_) => {
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(endpoint, timeout_ms, "portal request timed out");
            return Err(TransportError::Timeout { timeout_ms });
        }
    };
    tracing::debug!(endpoint, status = response.status, "portal response received");

    client.parse_response(response)
}
