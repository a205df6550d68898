//! The response envelope and the outcome classifier.
//!
//! Every portal response is `{ "data": ..., "esito": { <context>: { "stato": n, "error": ".." } } }`.
//! A negative `stato` in any context means the whole request failed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;

/// Status reported by one named context of `esito`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOutcome {
    #[serde(rename = "stato")]
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parsed response body. `outcome` keeps the order the contexts were sent in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "esito", default)]
    pub outcome: IndexMap<String, ContextOutcome>,
}

impl Envelope {
    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Fail with the first context reporting a negative status.
pub fn check_error(envelope: &Envelope) -> Result<(), UpstreamError> {
    match envelope.outcome.iter().find(|(_, outcome)| outcome.status < 0) {
        Some((context, outcome)) => Err(UpstreamError {
            context: context.clone(),
            message: outcome.error.clone().unwrap_or_default(),
            code: outcome.status,
        }),
        None => Ok(()),
    }
}
