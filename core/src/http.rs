//! HTTP transport types shared by the request builder and the transports.
//!
//! # Design
//! Requests and responses are plain data. `PortalClient` builds an
//! `HttpRequest` and parses an `HttpResponse`; a `Transport` implementation
//! performs the network round-trip in between. Every portal call is a form
//! POST, so the method is not modelled.

/// A form POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
///
/// The status is kept for logging only: the portal reports failures inside
/// the JSON body, so non-2xx responses are parsed like any other.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
