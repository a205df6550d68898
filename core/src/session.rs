//! Device registration, login and authenticated calls.
//!
//! # Design
//! A `Session` is one device/user pair. Its state is derived from what it
//! holds: no token and never registered is `Unregistered`, a successful
//! `register` makes it `Registered`, and holding a token makes it
//! `Authenticated`.
//!
//! `call` borrows the session immutably, so any number of calls may be in
//! flight at once, each bounded by its own timeout. Operations that replace
//! the token (`login_*`, `logout`) need `&mut self` and therefore cannot
//! overlap with in-flight calls.
//!
//! Every `call` reports a `CallRecord` to the optional observer exactly once,
//! whether it succeeded or not. The observer is a side channel: a panic inside
//! it is caught and logged, and never changes the outcome of the call. It runs
//! inline on the calling task before `call` returns, so it must not block;
//! observers that write files or talk to the network should push the record
//! into a channel and do the work elsewhere.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::client::PortalClient;
use crate::config::{DeviceInfo, PortalConfig};
use crate::envelope::{check_error, Envelope};
use crate::error::{ParseError, PortalError};
use crate::normalize::user::{normalize_login, PersonalData};
use crate::transport::{self, ReqwestTransport, Transport};

const REGISTER: &str = "register.php";
const LOGIN: &str = "login.php";
const LOGOUT: &str = "logout.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered,
    Authenticated,
}

/// One authenticated exchange, as seen by the observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub endpoint: String,
    /// The caller's body, without `regID` and `token`.
    pub request: Value,
    /// The raw response envelope; `None` when no usable response arrived.
    pub response: Option<Value>,
}

pub type Observer = Arc<dyn Fn(&CallRecord) + Send + Sync>;

pub struct Session<T: Transport = ReqwestTransport> {
    device_id: String,
    client: PortalClient,
    transport: T,
    timeout: Duration,
    registered: bool,
    token: Option<String>,
    observer: Option<Observer>,
}

impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("base_url", &self.client.base_url())
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session<ReqwestTransport> {
    pub fn new(device_id: impl Into<String>, config: &PortalConfig) -> Result<Self, PortalError> {
        Self::with_transport(device_id, config, ReqwestTransport::new())
    }

    /// A session for a freshly generated device id.
    pub fn new_device(config: &PortalConfig) -> Result<Self, PortalError> {
        Self::new(Uuid::new_v4().to_string(), config)
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(
        device_id: impl Into<String>,
        config: &PortalConfig,
        transport: T,
    ) -> Result<Self, PortalError> {
        config.validate()?;
        let device_id = device_id.into();
        if device_id.is_empty() {
            return Err(PortalError::Config("device id must not be empty".to_string()));
        }
        Ok(Self {
            device_id,
            client: PortalClient::new(&config.base_url),
            transport,
            timeout: config.timeout(),
            registered: false,
            token: None,
            observer: None,
        })
    }

    /// Report every `call` to `observer`.
    ///
    /// The observer runs synchronously on the task that awaited `call`, after
    /// the outcome is known and before it is returned. Keep it cheap: a slow
    /// observer delays the caller, and a blocking one stalls the runtime
    /// thread. Forward records over a channel for anything heavier.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&CallRecord) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn state(&self) -> SessionState {
        match (&self.token, self.registered) {
            (Some(_), _) => SessionState::Authenticated,
            (None, true) => SessionState::Registered,
            (None, false) => SessionState::Unregistered,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Announce this device to the portal. Safe to repeat.
    pub async fn register(&mut self, device: &DeviceInfo) -> Result<(), PortalError> {
        let body = json!({
            "regID": self.device_id,
            "uuid": self.device_id,
            "device_platform": device.platform,
            "device_version": device.version,
            "device_model": device.model,
            "device_manufacturer": device.manufacturer,
        });
        let envelope = self.exchange(REGISTER, &body).await?;
        classify(REGISTER, envelope)?;
        self.registered = true;
        tracing::debug!(device_id = %self.device_id, "device registered");
        Ok(())
    }

    pub async fn login_with_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<PersonalData, PortalError> {
        let body = json!({
            "regID": self.device_id,
            "username": username,
            "password": password,
        });
        self.login(body, None).await
    }

    /// Resume a previous login. The supplied token stays in use unless the
    /// portal issues a new one.
    pub async fn login_with_token(&mut self, username: &str, token: &str) -> Result<PersonalData, PortalError> {
        let body = json!({
            "regID": self.device_id,
            "username": username,
            "token": token,
        });
        self.login(body, Some(token)).await
    }

    async fn login(&mut self, body: Value, fallback_token: Option<&str>) -> Result<PersonalData, PortalError> {
        let envelope = self.exchange(LOGIN, &body).await?;
        let data = classify(LOGIN, envelope)?;
        let outcome = normalize_login(&data).map_err(|e| PortalError::parse(LOGIN, e))?;

        let token = outcome
            .token
            .or_else(|| fallback_token.map(str::to_owned))
            .ok_or_else(|| PortalError::parse(LOGIN, ParseError::new("login", "response carries no token")))?;
        self.token = Some(token);
        tracing::debug!(device_id = %self.device_id, "logged in");
        Ok(outcome.personal_data)
    }

    /// Invalidate the token on the portal and forget it locally.
    pub async fn logout(&mut self) -> Result<(), PortalError> {
        self.call(LOGOUT, &json!({})).await?;
        self.token = None;
        self.registered = true;
        tracing::debug!(device_id = %self.device_id, "logged out");
        Ok(())
    }

    /// Authenticated POST to `endpoint`; returns the `data` member of the response.
    ///
    /// `body` must serialize to a JSON object. `regID` and `token` are always
    /// set from the session, overriding any caller value.
    pub async fn call<B>(&self, endpoint: &str, body: &B) -> Result<Value, PortalError>
    where
        B: Serialize + ?Sized,
    {
        let token = self.token.as_deref().ok_or(PortalError::NotAuthenticated)?;
        let request = match serde_json::to_value(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => return Err(PortalError::InvalidBody(format!("got {other}"))),
            Err(e) => return Err(PortalError::InvalidBody(e.to_string())),
        };

        let mut signed: Map<String, Value> = request.clone();
        signed.insert("regID".to_string(), Value::String(self.device_id.clone()));
        signed.insert("token".to_string(), Value::String(token.to_string()));

        let result = self.exchange(endpoint, &Value::Object(signed)).await;

        let mut record = CallRecord {
            endpoint: endpoint.to_string(),
            request: Value::Object(request),
            response: None,
        };
        if let Ok(envelope) = &result {
            record.response = serde_json::to_value(envelope).ok();
        }
        self.notify(&record);

        classify(endpoint, result?)
    }

    async fn exchange(&self, endpoint: &str, body: &Value) -> Result<Envelope, PortalError> {
        transport::send(&self.transport, &self.client, endpoint, body, self.timeout)
            .await
            .map_err(|e| PortalError::transport(endpoint, e))
    }

    fn notify(&self, record: &CallRecord) {
        let Some(observer) = &self.observer else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| observer(record))).is_err() {
            tracing::error!(endpoint = %record.endpoint, "call observer panicked");
        }
    }
}

fn classify(endpoint: &str, envelope: Envelope) -> Result<Value, PortalError> {
    if let Err(e) = check_error(&envelope) {
        tracing::warn!(endpoint, context = %e.context, code = e.code, "portal reported failure");
        return Err(PortalError::upstream(endpoint, e));
    }
    Ok(envelope.into_data())
}
