//! Stateless request builder and response parser for the portal API.
//!
//! # Design
//! `PortalClient` holds only a `base_url`. Every endpoint is reached the same
//! way: a POST whose form body carries one field, `data`, holding the
//! URL-encoded JSON request. `build_request` produces the `HttpRequest` and
//! `parse_response` turns the `HttpResponse` back into an `Envelope`; the
//! round-trip in between belongs to a `Transport`.

use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub const DEFAULT_BASE_URL: &str = "https://app.didattica.polito.it/";

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Builds portal requests and parses portal responses without touching the network.
#[derive(Debug, Clone)]
pub struct PortalClient {
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim_end_matches('/').to_string();
        base_url.push('/');
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request(&self, endpoint: &str, body: &Value) -> Result<HttpRequest, TransportError> {
        let json = serde_json::to_string(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        let form = serde_urlencoded::to_string(&[("data", json.as_str())])
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            url: format!("{}{}", self.base_url, endpoint.trim_start_matches('/')),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: form,
        })
    }

    /// Parse the body whatever the HTTP status: failures live in `esito`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Envelope, TransportError> {
        Ok(serde_json::from_str(&response.body)?)
    }
}

impl Default for PortalClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> PortalClient {
        PortalClient::new("http://localhost:8080")
    }

    fn decode_data(body: &str) -> Value {
        let fields: Vec<(String, String)> = serde_urlencoded::from_str(body).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "data");
        serde_json::from_str(&fields[0].1).unwrap()
    }

    #[test]
    fn build_request_targets_endpoint_under_base_url() {
        let req = client().build_request("login.php", &json!({})).unwrap();
        assert_eq!(req.url, "http://localhost:8080/login.php");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())]
        );
    }

    #[test]
    fn body_is_single_urlencoded_data_field() {
        let body = json!({"username": "S123456", "password": "p&ss=word ?"});
        let req = client().build_request("login.php", &body).unwrap();
        assert!(req.body.starts_with("data="));
        assert!(!req.body.contains('&'), "JSON must be fully percent-encoded");
        assert_eq!(decode_data(&req.body), body);
    }

    #[test]
    fn base_url_slashes_are_normalized() {
        for base in ["http://h", "http://h/", "http://h//"] {
            let req = PortalClient::new(base).build_request("/ping.php", &json!({})).unwrap();
            assert_eq!(req.url, "http://h/ping.php");
        }
    }

    #[test]
    fn default_client_targets_production_portal() {
        assert_eq!(PortalClient::default().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn parse_response_ignores_http_status() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: r#"{"esito":{"testing-server":{"stato":-1,"error":"no match"}}}"#.to_string(),
        };
        let env = client().parse_response(response).unwrap();
        assert_eq!(env.outcome["testing-server"].status, -1);
    }

    #[test]
    fn parse_response_bad_json() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html>maintenance</html>".to_string(),
        };
        let err = client().parse_response(response).unwrap_err();
        assert!(matches!(err, TransportError::MalformedJson(_)));
    }
}
