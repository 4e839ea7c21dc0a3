use reqwest::Method;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL; may already carry a query string (pagination cursors do).
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and hands back the raw status and body.
///
/// [`crate::Client`] owns all JSON and error interpretation; implementors only
/// move bytes. [`HttpTransport`] is the real one.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest::blocking` transport. The underlying session is created on the
/// first request and then reused, so headers and connections persist for the
/// lifetime of the transport.
#[derive(Debug)]
pub struct HttpTransport {
    api_key: Option<String>,
    timeout: Option<Duration>,
    http: OnceLock<HttpClient>,
}

impl HttpTransport {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            timeout: None,
            http: OnceLock::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn session(&self) -> Result<&HttpClient> {
        if let Some(http) = self.http.get() {
            return Ok(http);
        }
        let http = build_session(self.api_key.as_deref(), self.timeout)?;
        Ok(self.http.get_or_init(|| http))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let http = self.session()?;

        let mut req = http.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpResponse { status, body })
    }
}

fn build_session(api_key: Option<&str>, timeout: Option<Duration>) -> Result<HttpClient> {
    let headers = default_headers(api_key)?;

    let mut builder = HttpClient::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

pub(crate) fn default_headers(api_key: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("nomenklatura-rs/{}", env!("CARGO_PKG_VERSION")))
            .unwrap_or(HeaderValue::from_static("nomenklatura-rs")),
    );

    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(key)
            .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}
