use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::config::{ClientConfig, load_config};
use crate::error::{Error, Result, ServerError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// Configuration plus a persistent transport. Shared via `Arc` by every
/// [`crate::Dataset`] and [`crate::Entity`] derived from it.
pub struct Client {
    config: ClientConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("api_key", &self.config.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Client {
    /// Creates a client using environment variables and/or `~/.nomenklatura.ini`.
    ///
    /// This is equivalent to `Client::new(load_config(None, None)?)`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(load_config(None, None)?))
    }

    pub fn new(config: ClientConfig) -> Self {
        let transport = HttpTransport::new(config.api_key.clone());
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let base_url = config.base_url();
        Self {
            config,
            base_url,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Turns an endpoint into an absolute URL.
    ///
    /// URLs already under host and prefix (such as the `next` cursor of a
    /// result page) come back unchanged. Anything else, including absolute
    /// URLs on other origins, is appended to host and prefix with one leading
    /// slash dropped, so the API key never leaves the configured server.
    pub fn path(&self, endpoint: &str) -> String {
        if endpoint.starts_with(&self.base_url) {
            return endpoint.to_string();
        }
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        format!("{}{}", self.base_url, endpoint)
    }

    pub fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<(u16, Value)> {
        let request = HttpRequest {
            method: Method::GET,
            url: self.path(endpoint),
            query: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        };
        self.execute(&request)
    }

    pub fn post<T: Serialize + ?Sized>(&self, endpoint: &str, data: &T) -> Result<(u16, Value)> {
        let body = serde_json::to_value(data).map_err(Error::Encode)?;
        let request = HttpRequest {
            method: Method::POST,
            url: self.path(endpoint),
            query: Vec::new(),
            body: Some(body),
        };
        self.execute(&request)
    }

    fn execute(&self, request: &HttpRequest) -> Result<(u16, Value)> {
        let response = self.transport.send(request)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "nomenklatura request"
        );
        evaluate(&request.url, response)
    }
}

/// Decodes a response.
///
/// A failed status is always an [`Error::Server`], built from whatever
/// `status`/`name`/`message`/`description` fields the body carries. A
/// successful status with a non-JSON body is [`Error::InvalidJson`].
pub fn evaluate(url: &str, response: HttpResponse) -> Result<(u16, Value)> {
    let parsed = serde_json::from_str::<Value>(&response.body);

    if !response.is_success() {
        let err = match parsed {
            Ok(data) => ServerError::from_payload(response.status, data),
            Err(_) => ServerError::from_text(response.status, &response.body),
        };
        return Err(Error::Server(err));
    }

    match parsed {
        Ok(data) => Ok((response.status, data)),
        Err(_) => Err(Error::InvalidJson {
            url: url.to_string(),
            status: response.status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(host: &str) -> Client {
        Client::new(ClientConfig::new(host))
    }

    #[test]
    fn test_path_joins_host_and_prefix() {
        let c = client("http://example.org");
        assert_eq!(c.path("entities/42"), "http://example.org/api/2/entities/42");
    }

    #[test]
    fn test_path_strips_one_leading_slash() {
        let c = client("http://example.org");
        assert_eq!(c.path("/entities"), c.path("entities"));
    }

    #[test]
    fn test_path_is_idempotent() {
        let c = client("http://example.org/");
        for endpoint in ["/entities", "datasets/foo", "/entities?page=2", ""] {
            let once = c.path(endpoint);
            assert_eq!(c.path(&once), once);
        }
    }

    #[test]
    fn test_path_keeps_absolute_cursor() {
        let c = client("http://example.org");
        let next = "http://example.org/api/2/entities?dataset=foo&page=2";
        assert_eq!(c.path(next), next);

    }

    #[test]
    fn test_path_does_not_follow_foreign_urls() {
        let c = client("http://example.org");
        let elsewhere = "https://other.example/api/2/entities?page=3";
        assert_eq!(
            c.path(elsewhere),
            "http://example.org/api/2/https://other.example/api/2/entities?page=3"
        );
        assert!(c.path("http://example.org/other/path").starts_with("http://example.org/api/2/"));
    }

    #[test]
    fn test_evaluate_success() {
        let (status, data) = evaluate("u", HttpResponse::new(200, r#"{"name":"foo"}"#)).unwrap();
        assert_eq!(status, 200);
        assert_eq!(data, json!({"name": "foo"}));
    }

    #[test]
    fn test_evaluate_not_json() {
        let err = evaluate("http://x/api/2/datasets/foo", HttpResponse::new(200, "<html>"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidJson { status: 200, .. }));
    }

    #[test]
    fn test_evaluate_structured_error() {
        let err = evaluate(
            "u",
            HttpResponse::new(404, r#"{"status":404,"name":"Not Found","message":"not found"}"#),
        )
        .unwrap_err();
        match err {
            Error::Server(e) => {
                assert_eq!(e.status, 404);
                assert_eq!(e.message.as_deref(), Some("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_unstructured_error_still_fails() {
        let err = evaluate("u", HttpResponse::new(500, r#"{"oops":true}"#)).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.server().unwrap().data, json!({"oops": true}));

        let err = evaluate("u", HttpResponse::new(502, "Bad Gateway")).unwrap_err();
        assert_eq!(err.server().unwrap().message.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let c = Client::new(ClientConfig::new("http://example.org").with_api_key("s3cret"));
        let text = format!("{c:?}");
        assert!(!text.contains("s3cret"));
        assert!(text.contains("<redacted>"));
    }
}
