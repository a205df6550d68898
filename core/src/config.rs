//! Session configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_BASE_URL;
use crate::error::PortalError;

/// Device metadata sent to `register.php`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub platform: String,
    pub version: String,
    pub model: String,
    pub manufacturer: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            platform: "Open Polito".to_string(),
            version: "1".to_string(),
            model: "Potato".to_string(),
            manufacturer: "Apple".to_string(),
        }
    }
}

/// Where to reach the portal and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    /// Per-request bound, in milliseconds.
    pub timeout_ms: u64,
    pub device: DeviceInfo,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 3000,
            device: DeviceInfo::default(),
        }
    }
}

impl PortalConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PortalError::Config(format!("failed to read {}: {e}", path.display())))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "toml" => toml::from_str(&content)
                .map_err(|e| PortalError::Config(format!("invalid TOML: {e}"))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| PortalError::Config(format!("invalid JSON: {e}"))),
            _ => Err(PortalError::Config(format!(
                "unsupported config format: {extension}"
            ))),
        }
    }

    /// Apply `PORTAL_*` environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PORTAL_BASE_URL") {
            self.base_url = url;
        }

        if let Ok(timeout) = std::env::var("PORTAL_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => tracing::warn!(value = %timeout, "ignoring unparsable PORTAL_TIMEOUT_MS"),
            }
        }

        if let Ok(platform) = std::env::var("PORTAL_DEVICE_PLATFORM") {
            self.device.platform = platform;
        }
        if let Ok(version) = std::env::var("PORTAL_DEVICE_VERSION") {
            self.device.version = version;
        }
        if let Ok(model) = std::env::var("PORTAL_DEVICE_MODEL") {
            self.device.model = model;
        }
        if let Ok(manufacturer) = std::env::var("PORTAL_DEVICE_MANUFACTURER") {
            self.device.manufacturer = manufacturer;
        }

        self
    }

    pub fn validate(&self) -> Result<(), PortalError> {
        if self.base_url.is_empty() {
            return Err(PortalError::Config("base_url is required".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PortalError::Config(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(PortalError::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
