use std::time::Duration;
use thiserror::Error;

use crate::types::EnvelopeError;

#[derive(Error, Debug)]
pub enum CubeError {
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    TimeoutExpired(Duration),

    #[error("Access token request failed: {code} - {message}")]
    AccessTokenRequest { code: i64, message: String },

    #[error("Access token rejected by the bridge: {code} - {message}")]
    AccessTokenUnauthorized { code: i64, message: String },

    #[error("Invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Parameter error")]
    Parameter,

    #[error("Server exception")]
    ServerException,

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Expected a JSON envelope, received a binary body")]
    UnexpectedBinary,

    #[error("Bridge host is not set")]
    MissingHost,

    #[error("Access token is not set")]
    MissingAccessToken,
}

impl CubeError {
    pub fn access_token_request(code: i64, message: impl Into<String>) -> Self {
        Self::AccessTokenRequest {
            code,
            message: message.into(),
        }
    }

    pub fn access_token_unauthorized(code: i64, message: impl Into<String>) -> Self {
        Self::AccessTokenUnauthorized {
            code,
            message: message.into(),
        }
    }

    /// Failure for a non-200 binary reply.
    pub fn from_binary_status(status: u16) -> Self {
        match status {
            400 => Self::Parameter,
            500 => Self::ServerException,
            other => Self::HttpStatus(other),
        }
    }
}

/// Failures of the event stream. Delivered to the `onerror` handler; the
/// stream client never returns them to its caller.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Stream connection failed: {0}")]
    Connect(#[source] CubeError),

    #[error("Stream transport error: {0}")]
    Transport(#[source] CubeError),

    #[error("Stream connection not established within {0:?}")]
    ConnectTimeout(Duration),

    #[error("No stream data received for {0:?}")]
    ReadTimeout(Duration),

    #[error("Stream closed by the bridge")]
    Closed,

    #[error("Invalid payload for event {event}: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stream line exceeded {0} bytes and was dropped")]
    LineTooLong(usize),

    #[error("Handler for {event} panicked: {message}")]
    Handler { event: String, message: String },
}

impl StreamError {
    /// Whether the failure tears down the connection.
    pub fn is_connection_failure(&self) -> bool {
        !matches!(
            self,
            StreamError::Decode { .. } | StreamError::LineTooLong(_) | StreamError::Handler { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_error_construction() {
        let err = CubeError::access_token_request(500, "Server exception");
        match err {
            CubeError::AccessTokenRequest { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "Server exception");
            }
            _ => panic!("Expected AccessTokenRequest variant"),
        }
    }

    #[test]
    fn test_binary_status_mapping() {
        assert!(matches!(CubeError::from_binary_status(400), CubeError::Parameter));
        assert!(matches!(
            CubeError::from_binary_status(500),
            CubeError::ServerException
        ));
        assert!(matches!(
            CubeError::from_binary_status(404),
            CubeError::HttpStatus(404)
        ));
    }

    #[test]
    fn test_error_display_messages() {
        let timeout_err = CubeError::TimeoutExpired(Duration::from_secs(120));
        assert_eq!(timeout_err.to_string(), "Timed out after 120s");

        let unauthorized = CubeError::access_token_unauthorized(401, "auth failure");
        assert_eq!(
            unauthorized.to_string(),
            "Access token rejected by the bridge: 401 - auth failure"
        );

        let invalid = CubeError::InvalidResponse("Bad format".to_string());
        assert_eq!(invalid.to_string(), "Invalid response: Bad format");
    }

    #[test]
    fn test_envelope_error_conversion() {
        let err: CubeError = EnvelopeError::InvalidErrorCode(999).into();
        assert!(matches!(
            err,
            CubeError::Envelope(EnvelopeError::InvalidErrorCode(999))
        ));
    }

    #[test]
    fn test_stream_error_classification() {
        let decode = StreamError::Decode {
            event: "device#v1#addDevice".into(),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        assert!(!decode.is_connection_failure());
        assert!(StreamError::Closed.is_connection_failure());
        assert!(StreamError::ReadTimeout(Duration::from_secs(1)).is_connection_failure());
        assert!(StreamError::ConnectTimeout(Duration::from_secs(1)).is_connection_failure());
        assert!(!StreamError::LineTooLong(1024).is_connection_failure());
        assert!(!StreamError::Handler {
            event: "onopen".into(),
            message: "boom".into(),
        }
        .is_connection_failure());
    }
}
