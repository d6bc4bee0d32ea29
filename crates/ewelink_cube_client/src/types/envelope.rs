use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::codes::{KnownCode, ResponseCode};

pub const SUCCESS_MESSAGE: &str = "success";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Unknown error code: {0}")]
    InvalidErrorCode(i64),

    #[error("Empty message for error code {0}")]
    EmptyMessage(i64),

    #[error("Success response carries message {0:?} instead of \"success\"")]
    InconsistentSuccessMessage(String),
}

/// The `{error, message, data}` wrapper around every bridge reply.
///
/// Only obtainable through [`ResponseEnvelope::new`], so a value of this type
/// always holds a known error code and a non-empty, consistent message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    error: i64,
    message: String,
    data: Value,
}

/// Wire shape before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope {
    pub error: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn new(
        error: i64,
        message: impl Into<String>,
        data: Value,
    ) -> Result<Self, EnvelopeError> {
        let known = KnownCode::from_code(error).ok_or(EnvelopeError::InvalidErrorCode(error))?;

        let mut message = message.into();
        if message.is_empty() {
            message = known
                .default_message()
                .ok_or(EnvelopeError::EmptyMessage(error))?
                .to_string();
        }

        if known == KnownCode::Response(ResponseCode::Success) && message != SUCCESS_MESSAGE {
            return Err(EnvelopeError::InconsistentSuccessMessage(message));
        }

        Ok(Self {
            error,
            message,
            data,
        })
    }

    /// Envelope reported in place of a reply that could not be parsed.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            error: ResponseCode::Custom.code(),
            message: message.into(),
            data: Value::Object(Default::default()),
        }
    }

    pub(crate) fn from_raw(raw: RawEnvelope) -> Result<Self, EnvelopeError> {
        Self::new(raw.error, raw.message.unwrap_or_default(), raw.data)
    }

    pub fn error(&self) -> i64 {
        self.error
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn known_code(&self) -> Option<KnownCode> {
        KnownCode::from_code(self.error)
    }

    pub fn is_success(&self) -> bool {
        self.error == ResponseCode::Success.code()
    }

    /// Field lookup by wire key: `"error"`, `"message"` or `"data"`.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "error" => Some(Value::from(self.error)),
            "message" => Some(Value::from(self.message.clone())),
            "data" => Some(self.data.clone()),
            _ => None,
        }
    }
}
