use serde_json::Value;
use thiserror::Error;

use crate::entity::EntityId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server did not respond with JSON data (HTTP {status} for url ({url}))")]
    InvalidJson { url: String, status: u16 },

    #[error("{0}")]
    Server(ServerError),

    #[error("invalid request: {0}")]
    InvalidRequest(ServerError),

    #[error("no match: {0}")]
    NoMatch(ServerError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("canonical chain loops back to entity {id}")]
    CanonicalCycle { id: EntityId },

    #[error("canonical chain is deeper than {limit} entities")]
    CanonicalDepth { limit: usize },
}

impl Error {
    /// Structured server payload behind any of the server error variants.
    pub fn server(&self) -> Option<&ServerError> {
        match self {
            Error::Server(e) | Error::InvalidRequest(e) | Error::NoMatch(e) => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.server().map(|e| e.status)
    }
}

/// A failed response from the nomenklatura server.
///
/// The server reports errors as `{"status": .., "name": .., "message": ..,
/// "description": ..}`; every field is optional and the raw payload is kept
/// in `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    /// Status code of the HTTP response itself.
    pub http_status: u16,
    /// `status` from the payload when present, otherwise `http_status`.
    pub status: u16,
    pub name: Option<String>,
    /// `message` from the payload, falling back to `description`.
    pub message: Option<String>,
    pub description: Option<String>,
    pub data: Value,
}

impl ServerError {
    pub(crate) fn from_payload(http_status: u16, data: Value) -> Self {
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

        let status = data
            .get("status")
            .and_then(|s| match s {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(http_status);
        let name = text("name");
        let description = text("description");
        let message = text("message").or_else(|| description.clone());

        Self {
            http_status,
            status,
            name,
            message,
            description,
            data,
        }
    }

    /// Builds an error for a failed response whose body was not JSON.
    pub(crate) fn from_text(http_status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            reqwest::StatusCode::from_u16(http_status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        } else {
            Some(body.to_string())
        };

        Self {
            http_status,
            status: http_status,
            name: None,
            message,
            description: None,
            data: Value::Null,
        }
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server error (HTTP {})", self.status)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}
