//! Error types for Active24 DNS reconciliation
//!
//! Every failure an operation can end in is one variant of [`Error`]. The
//! reconciler converts exactly one of them (a read that finds nothing) into
//! an absent record; everything else is returned to the caller.

use std::fmt;

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// A record that matched an import query, listed in [`Error::Ambiguous`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Remote record identifier
    pub id: u64,
    /// Content (or CAA value) of the record
    pub content: String,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id={} content={:?}", self.id, self.content)
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credentials, malformed base URL, unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Desired state rejected before any API call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Import identifier that matches none of the supported shapes
    #[error("Invalid import identifier: {0}")]
    InvalidImportId(String),

    /// Connect, DNS or timeout failure, message kept verbatim
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from the remote API
    #[error("active24 API error: {status}: {body}")]
    Api {
        /// Status line, e.g. `404 Not Found`
        status: String,
        /// Numeric status code
        code: u16,
        /// Raw response body
        body: String,
    },

    /// Response body that did not match the expected JSON shape
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Decoder message
        message: String,
        /// Raw response body
        body: String,
    },

    /// Lookup returned no matching record
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Import lookup matched more than one record
    #[error("{query} matched {} records, add a content segment to choose one: {}", .candidates.len(), list_candidates(.candidates))]
    Ambiguous {
        /// Human readable description of the lookup
        query: String,
        /// Every record that matched
        candidates: Vec<Candidate>,
    },

    /// The caller cancelled the operation while a request was in flight
    #[error("Request cancelled")]
    Cancelled,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn list_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid import identifier error
    pub fn invalid_import_id(msg: impl Into<String>) -> Self {
        Self::InvalidImportId(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an API error from a status line, code and body
    pub fn api(status: impl Into<String>, code: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status: status.into(),
            code,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// True for lookups that found nothing, local or remote (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { code: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_line_and_body() {
        let err = Error::api("422 Unprocessable Entity", 422, r#"{"error":"bad ttl"}"#);
        assert_eq!(
            err.to_string(),
            r#"active24 API error: 422 Unprocessable Entity: {"error":"bad ttl"}"#
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn remote_404_counts_as_not_found() {
        assert!(Error::api("404 Not Found", 404, "").is_not_found());
        assert!(Error::not_found("www A").is_not_found());
        assert!(!Error::transport("connection refused").is_not_found());
    }

    #[test]
    fn ambiguous_error_lists_every_candidate() {
        let err = Error::Ambiguous {
            query: "www CAA".to_string(),
            candidates: vec![
                Candidate { id: 1, content: "letsencrypt.org".to_string() },
                Candidate { id: 2, content: "sectigo.com".to_string() },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("matched 2 records"));
        assert!(msg.contains("id=1"));
        assert!(msg.contains("id=2"));
        assert!(msg.contains("sectigo.com"));
    }
}
