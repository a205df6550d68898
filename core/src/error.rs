//! Error types for the portal client.
//!
//! # Design
//! Each layer has its own error: the transport fails with `TransportError`,
//! the envelope classifier with `UpstreamError`, normalizers with
//! `ParseError`. Public operations return `PortalError`, which wraps the layer
//! error together with the endpoint that produced it. Nothing is recovered
//! locally; retry policy belongs to the caller.

use thiserror::Error;

/// The network round-trip failed or its body was unusable.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived within the configured bound. The in-flight request
    /// has been dropped.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Connection failure, TLS failure or an aborted body read.
    #[error("network failure: {0}")]
    Network(String),

    /// The response body is not valid JSON.
    #[error("malformed JSON response: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// A business failure reported by the portal in one context of `esito`.
///
/// Code and message are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream reported {context}={code}: {message}")]
pub struct UpstreamError {
    pub context: String,
    pub message: String,
    pub code: i64,
}

/// A normalizer met a payload shape it does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected {what} payload: {message}")]
pub struct ParseError {
    pub what: &'static str,
    pub message: String,
}

impl ParseError {
    pub fn new(what: &'static str, message: impl Into<String>) -> Self {
        Self {
            what,
            message: message.into(),
        }
    }

    pub(crate) fn from_serde(what: &'static str, err: serde_json::Error) -> Self {
        Self::new(what, err.to_string())
    }
}

/// Errors returned by session and feature operations.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    #[error("{endpoint}: {source}")]
    Upstream {
        endpoint: String,
        #[source]
        source: UpstreamError,
    },

    #[error("{endpoint}: {source}")]
    Parse {
        endpoint: String,
        #[source]
        source: ParseError,
    },

    /// An authenticated operation was attempted without a token.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// The caller-supplied body is not a JSON object.
    #[error("request body must be a JSON object: {0}")]
    InvalidBody(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PortalError {
    pub(crate) fn transport(endpoint: &str, source: TransportError) -> Self {
        PortalError::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    pub(crate) fn upstream(endpoint: &str, source: UpstreamError) -> Self {
        PortalError::Upstream {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    pub(crate) fn parse(endpoint: &str, source: ParseError) -> Self {
        PortalError::Parse {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// The upstream status code, when the portal reported the failure.
    pub fn upstream_code(&self) -> Option<i64> {
        match self {
            PortalError::Upstream { source, .. } => Some(source.code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PortalError::Transport {
                source: TransportError::Timeout { .. },
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_display_carries_context_and_code() {
        let err = UpstreamError {
            context: "generale".to_string(),
            message: "Token non valido".to_string(),
            code: -3,
        };
        assert_eq!(err.to_string(), "upstream reported generale=-3: Token non valido");
    }

    #[test]
    fn portal_error_exposes_upstream_code() {
        let err = PortalError::upstream(
            "login.php",
            UpstreamError {
                context: "login".to_string(),
                message: "bad credentials".to_string(),
                code: -2,
            },
        );
        assert_eq!(err.upstream_code(), Some(-2));
        assert!(!err.is_timeout());
        assert!(err.to_string().starts_with("login.php: "));
    }

    #[test]
    fn timeout_is_detected() {
        let err = PortalError::transport("esami.php", TransportError::Timeout { timeout_ms: 3000 });
        assert!(err.is_timeout());
        assert_eq!(err.upstream_code(), None);
        assert_eq!(err.to_string(), "esami.php: request timed out after 3000 ms");
    }
}
