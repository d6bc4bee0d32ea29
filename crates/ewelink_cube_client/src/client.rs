use crate::sse::{EventStreamClient, HttpConnector, StreamOptions};
use crate::types::envelope::RawEnvelope;
use crate::types::ResponseEnvelope;
use crate::{paths, CubeConfig, CubeError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::Instrument;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Default)]
struct CredentialState {
    host: String,
    access_token: Option<String>,
}

/// Bridge address and access token, shared by every client built for the
/// same session. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    state: Arc<RwLock<CredentialState>>,
}

impl Credentials {
    pub fn new(host: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CredentialState {
                host: host.into(),
                access_token,
            })),
        }
    }

    // A panic while holding the lock cannot leave the two strings inconsistent.
    fn read(&self) -> RwLockReadGuard<'_, CredentialState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CredentialState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn host(&self) -> String {
        self.read().host.clone()
    }

    pub fn set_host(&self, host: impl Into<String>) {
        self.write().host = host.into();
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        self.write().access_token = Some(token.into());
    }

    pub fn has_access_token(&self) -> bool {
        self.read()
            .access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

/// One request/response exchange with the bridge REST surface.
#[async_trait]
pub trait Transport: Send + Sync {
    fn credentials(&self) -> &Credentials;

    async fn request(
        &self,
        path: &str,
        method: Method,
        params: Option<Value>,
        requires_auth: bool,
    ) -> Result<ResponseEnvelope>;
}

/// Body of a reply, either a validated envelope or raw bytes for
/// `application/octet-stream` responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Envelope(ResponseEnvelope),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct CubeClient {
    config: CubeConfig,
    credentials: Credentials,
    http_client: reqwest::Client,
    span: tracing::Span,
}

impl CubeClient {
    pub fn new(config: CubeConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let credentials = Credentials::new(config.host.clone(), config.access_token.clone());
        let span = tracing::info_span!("cube_bridge", host = %config.host);

        Ok(Self {
            config,
            credentials,
            http_client,
            span,
        })
    }

    /// Replaces the span every request and stream task of this client is recorded under.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Event-stream client sharing this client's credentials and span.
    pub fn event_stream(&self) -> Result<EventStreamClient> {
        let connector = HttpConnector::new()?;
        let options = StreamOptions {
            read_timeout: self.config.stream_read_timeout,
            reconnect_delay: self.config.reconnect_delay,
        };
        Ok(
            EventStreamClient::new(self.credentials.clone(), Arc::new(connector), options)
                .with_span(self.span.clone()),
        )
    }

    pub async fn exchange(
        &self,
        path: &str,
        method: Method,
        params: Option<Value>,
        requires_auth: bool,
    ) -> Result<Reply> {
        self.send(path, method, params, requires_auth)
            .instrument(self.span.clone())
            .await
    }

    async fn send(
        &self,
        path: &str,
        method: Method,
        params: Option<Value>,
        requires_auth: bool,
    ) -> Result<Reply> {
        let url = paths::rest_url(&self.credentials.host(), path);
        tracing::debug!("Sending request: method={:?}, url={}", method, url);

        let mut builder = match method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
            Method::Put => self.http_client.put(&url),
            Method::Delete => self.http_client.delete(&url),
        }
        .header(CONTENT_TYPE, "application/json");

        if requires_auth {
            if let Some(token) = self.credentials.access_token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match (method, params) {
            (Method::Get | Method::Delete, Some(params)) => builder.query(&params),
            (Method::Get | Method::Delete, None) => builder,
            (Method::Post, params) => {
                builder.json(&params.unwrap_or_else(|| Value::Object(Default::default())))
            }
            (Method::Put, params) => builder.json(&params.unwrap_or(Value::Null)),
        };

        let response = builder.send().await?;
        let status = response.status();

        let is_binary = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(OCTET_STREAM));

        if is_binary {
            if status != StatusCode::OK {
                tracing::warn!("Binary request failed: status={}", status);
                return Err(CubeError::from_binary_status(status.as_u16()));
            }
            let bytes = response.bytes().await?;
            tracing::debug!("Binary response received: {} bytes", bytes.len());
            return Ok(Reply::Binary(bytes.to_vec()));
        }

        let body = response.text().await?;
        if self.config.debug {
            tracing::debug!("Response body: status={}, body={}", status, body);
        }

        let envelope = parse_envelope(&body)?;
        tracing::debug!(
            "Request finished: path={}, error={}, message={}",
            path,
            envelope.error(),
            envelope.message()
        );
        Ok(Reply::Envelope(envelope))
    }
}

#[async_trait]
impl Transport for CubeClient {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn request(
        &self,
        path: &str,
        method: Method,
        params: Option<Value>,
        requires_auth: bool,
    ) -> Result<ResponseEnvelope> {
        match self.exchange(path, method, params, requires_auth).await? {
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Binary(_) => Err(CubeError::UnexpectedBinary),
        }
    }
}

/// Unparseable bodies become a `-1` envelope; well-formed bodies must pass
/// envelope validation.
pub(crate) fn parse_envelope(body: &str) -> Result<ResponseEnvelope> {
    if body.trim().is_empty() {
        tracing::error!("Empty response body");
        return Ok(ResponseEnvelope::malformed("Empty response."));
    }

    match serde_json::from_str::<RawEnvelope>(body) {
        Ok(raw) => Ok(ResponseEnvelope::from_raw(raw)?),
        Err(e) => {
            tracing::error!("Invalid JSON response: {} ({})", body, e);
            Ok(ResponseEnvelope::malformed("Invalid JSON response."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnvelopeError;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let config = CubeConfig::new("192.168.1.9", Some("tok".into()));
        let client = CubeClient::new(config.clone()).unwrap();
        assert_eq!(client.config().host, config.host);
        assert_eq!(client.credentials().host(), "192.168.1.9");
        assert_eq!(client.credentials().access_token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_credentials_are_shared() {
        let credentials = Credentials::new("ihost.local", None);
        let copy = credentials.clone();
        assert!(!copy.has_access_token());

        credentials.set_access_token("fresh");
        credentials.set_host("10.0.0.2");
        assert_eq!(copy.access_token().as_deref(), Some("fresh"));
        assert_eq!(copy.host(), "10.0.0.2");
        assert!(copy.has_access_token());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let credentials = Credentials::new("ihost.local", Some(String::new()));
        assert!(!credentials.has_access_token());
    }

    #[test]
    fn test_parse_envelope_success() {
        let envelope =
            parse_envelope(r#"{"error":0,"message":"success","data":{"token":"t"}}"#).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), &json!({"token": "t"}));
    }

    #[test]
    fn test_parse_envelope_malformed_bodies() {
        for body in ["", "   ", "<html>502</html>", r#"{"message":"no code"}"#] {
            let envelope = parse_envelope(body).unwrap();
            assert_eq!(envelope.error(), -1, "body: {body:?}");
        }
        assert_eq!(parse_envelope("").unwrap().message(), "Empty response.");
        assert_eq!(
            parse_envelope("nope").unwrap().message(),
            "Invalid JSON response."
        );
    }

    #[test]
    fn test_parse_envelope_validation_errors() {
        let err = parse_envelope(r#"{"error":42,"message":"x","data":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            CubeError::Envelope(EnvelopeError::InvalidErrorCode(42))
        ));

        let err = parse_envelope(r#"{"error":0,"message":"ok","data":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            CubeError::Envelope(EnvelopeError::InconsistentSuccessMessage(_))
        ));
    }
}
