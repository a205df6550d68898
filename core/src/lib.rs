//! Async client core for the student-portal API.
//!
//! # Overview
//! Every portal endpoint is a form POST carrying one URL-encoded JSON field,
//! and every answer is an envelope `{ data, esito }` whose `esito` reports
//! per-context outcomes. This crate builds and signs those requests, runs
//! them through a `Transport` under a timeout, classifies the envelope, and
//! normalizes `data` into typed entities.
//!
//! # Design
//! - `PortalClient` is stateless: it builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network.
//! - `Transport` is the I/O seam; `ReqwestTransport` is the production one,
//!   tests plug in scripted ones.
//! - `Session` owns device id, token and timeout. Feature calls in `api` go
//!   through `Session::call` and hand `data` to a pure normalizer.
//! - Instants are `EpochMillis`, computed from the portal's Europe/Rome wall
//!   clock.

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod normalize;
pub mod session;
pub mod transport;

pub use client::{PortalClient, DEFAULT_BASE_URL};
pub use config::{DeviceInfo, PortalConfig};
pub use envelope::{check_error, ContextOutcome, Envelope};
pub use error::{ParseError, PortalError, TransportError, UpstreamError};
pub use http::{HttpRequest, HttpResponse};
pub use normalize::EpochMillis;
pub use session::{CallRecord, Observer, Session, SessionState};
pub use transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT};
