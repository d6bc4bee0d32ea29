//! Bridge access-token handshake.
//!
//! The bridge only issues a token while its link button is pressed, so the
//! token endpoint is polled until it answers definitively or the deadline
//! passes. A single attempt runs alongside the polling loop; whichever
//! produces a definitive answer first wins and the other is dropped.

use std::time::Duration;

use crate::client::{Method, Transport};
use crate::types::{
    AccessTokenData, DeviceListData, EnvelopeError, ResponseCode, ResponseEnvelope,
};
use crate::{paths, CubeError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2_000);

/// Message the bridge reports until the link button is pressed.
pub const LINK_BUTTON_NOT_PRESSED: &str = "link button not pressed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTokenOptions {
    /// Deadline across every attempt.
    pub timeout: Duration,
    /// Pause between polling attempts.
    pub interval: Duration,
}

impl Default for AccessTokenOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Runs the handshake and stores the issued token on the transport's credentials.
///
/// Fails with [`CubeError::TimeoutExpired`] when no definitive answer arrives in
/// time, [`CubeError::AccessTokenRequest`] when the bridge refuses or answers
/// without a token, and [`CubeError::AccessTokenUnauthorized`] when the issued
/// token does not authorize the device listing. The token stays set in the
/// last case.
pub async fn acquire_access_token<T>(transport: &T, options: AccessTokenOptions) -> Result<String>
where
    T: Transport + ?Sized,
{
    tracing::debug!(
        "Requesting bridge access token: timeout={:?}, interval={:?}",
        options.timeout,
        options.interval
    );

    let token = tokio::time::timeout(options.timeout, race(transport, options.interval))
        .await
        .map_err(|_| {
            tracing::warn!("Access token request timed out after {:?}", options.timeout);
            CubeError::TimeoutExpired(options.timeout)
        })??;

    verify(transport).await?;
    tracing::info!("Bridge access token acquired");
    Ok(token)
}

async fn race<T>(transport: &T, interval: Duration) -> Result<String>
where
    T: Transport + ?Sized,
{
    tokio::select! {
        result = single_attempt(transport) => result,
        result = poll_attempts(transport, interval) => result,
    }
}

async fn single_attempt<T>(transport: &T) -> Result<String>
where
    T: Transport + ?Sized,
{
    match attempt(transport).await? {
        Some(token) => Ok(token),
        // A pending answer must not finish the race.
        None => std::future::pending().await,
    }
}

async fn poll_attempts<T>(transport: &T, interval: Duration) -> Result<String>
where
    T: Transport + ?Sized,
{
    loop {
        if let Some(token) = attempt(transport).await? {
            return Ok(token);
        }
        tokio::time::sleep(interval).await;
    }
}

/// One request to the token endpoint. `Ok(None)` means "keep polling".
async fn attempt<T>(transport: &T) -> Result<Option<String>>
where
    T: Transport + ?Sized,
{
    let response = match transport
        .request(paths::BRIDGE_TOKEN, Method::Get, None, false)
        .await
    {
        Ok(response) => response,
        // A bare 401 carries no message and fails envelope validation.
        Err(CubeError::Envelope(EnvelopeError::EmptyMessage(code)))
            if code == ResponseCode::Authentication.code() =>
        {
            tracing::debug!("Link button not pressed yet: {}", code);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if is_pending(&response) {
        tracing::debug!("Link button not pressed yet: {}", response.message());
        return Ok(None);
    }

    if !response.is_success() {
        return Err(CubeError::access_token_request(
            response.error(),
            response.message(),
        ));
    }

    let data: AccessTokenData = serde_json::from_value(response.data().clone()).map_err(|_| {
        CubeError::access_token_request(response.error(), "Success response without a token")
    })?;

    transport.credentials().set_access_token(data.token.clone());
    Ok(Some(data.token))
}

fn is_pending(response: &ResponseEnvelope) -> bool {
    response.error() == ResponseCode::Authentication.code()
        || response.message() == LINK_BUTTON_NOT_PRESSED
}

async fn verify<T>(transport: &T) -> Result<()>
where
    T: Transport + ?Sized,
{
    let response = transport
        .request(paths::DEVICES, Method::Get, None, true)
        .await?;

    let listed = response.is_success()
        && serde_json::from_value::<DeviceListData>(response.data().clone()).is_ok();

    if !listed {
        tracing::warn!(
            "Access token verification failed: error={}, message={}",
            response.error(),
            response.message()
        );
        return Err(CubeError::access_token_unauthorized(
            response.error(),
            response.message(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn pending_401() -> ResponseEnvelope {
        ResponseEnvelope::new(401, "link button not pressed", json!({})).unwrap()
    }

    fn pending_message_only() -> ResponseEnvelope {
        ResponseEnvelope::new(500, "link button not pressed", json!({})).unwrap()
    }

    fn token(value: &str) -> ResponseEnvelope {
        ResponseEnvelope::new(0, "success", json!({"token": value})).unwrap()
    }

    fn device_list() -> ResponseEnvelope {
        ResponseEnvelope::new(0, "success", json!({"device_list": []})).unwrap()
    }

    struct ScriptedTransport {
        credentials: Credentials,
        token_replies: Mutex<VecDeque<ResponseEnvelope>>,
        fallback: ResponseEnvelope,
        device_reply: ResponseEnvelope,
        token_calls: AtomicUsize,
        verify_calls: AtomicUsize,
        token_at_verify: Mutex<Option<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<ResponseEnvelope>, fallback: ResponseEnvelope) -> Self {
            Self {
                credentials: Credentials::new("ihost.local", None),
                token_replies: Mutex::new(replies.into()),
                fallback,
                device_reply: device_list(),
                token_calls: AtomicUsize::new(0),
                verify_calls: AtomicUsize::new(0),
                token_at_verify: Mutex::new(None),
            }
        }

        fn with_device_reply(mut self, reply: ResponseEnvelope) -> Self {
            self.device_reply = reply;
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
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
            assert_eq!(method, Method::Get);
            assert!(params.is_none());
            match path {
                paths::BRIDGE_TOKEN => {
                    assert!(!requires_auth);
                    self.token_calls.fetch_add(1, Ordering::SeqCst);
                    let next = self.token_replies.lock().unwrap().pop_front();
                    Ok(next.unwrap_or_else(|| self.fallback.clone()))
                }
                paths::DEVICES => {
                    assert!(requires_auth);
                    self.verify_calls.fetch_add(1, Ordering::SeqCst);
                    *self.token_at_verify.lock().unwrap() = self.credentials.access_token();
                    Ok(self.device_reply.clone())
                }
                other => panic!("unexpected path {other}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_token() {
        let transport = ScriptedTransport::new(
            vec![pending_401(), pending_message_only(), pending_401(), pending_401()],
            token("abc"),
        );

        let token = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap();

        assert_eq!(token, "abc");
        assert_eq!(transport.credentials.access_token().as_deref(), Some("abc"));
        assert_eq!(transport.verify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            transport.token_at_verify.lock().unwrap().as_deref(),
            Some("abc")
        );
        assert!(transport.token_calls.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_fires_twice() {
        let transport = ScriptedTransport::new(vec![pending_401(), pending_401()], token("t"));
        let options = AccessTokenOptions {
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(2),
        };

        let start = Instant::now();
        acquire_access_token(&transport, options).await.unwrap();

        // Both opening attempts are pending, the first poll tick succeeds.
        assert_eq!(transport.token_calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_pending_times_out() {
        let transport = ScriptedTransport::new(vec![], pending_401());
        let options = AccessTokenOptions::default();

        let start = Instant::now();
        let err = acquire_access_token(&transport, options).await.unwrap_err();

        assert!(matches!(err, CubeError::TimeoutExpired(t) if t == DEFAULT_TIMEOUT));
        assert!(start.elapsed() >= DEFAULT_TIMEOUT);
        assert!(start.elapsed() < DEFAULT_TIMEOUT + DEFAULT_INTERVAL);
        assert!(transport.credentials.access_token().is_none());
        assert_eq!(transport.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_failure_keeps_token() {
        let transport = ScriptedTransport::new(vec![], token("issued"))
            .with_device_reply(ResponseEnvelope::new(401, "unauthorized", json!({})).unwrap());

        let err = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CubeError::AccessTokenUnauthorized { code: 401, .. }
        ));
        assert_eq!(
            transport.credentials.access_token().as_deref(),
            Some("issued")
        );
        assert_eq!(transport.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_requires_device_list() {
        let transport = ScriptedTransport::new(vec![], token("issued"))
            .with_device_reply(ResponseEnvelope::new(0, "success", json!({})).unwrap());

        let err = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CubeError::AccessTokenUnauthorized { code: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bridge_refusal_is_terminal() {
        let transport = ScriptedTransport::new(
            vec![ResponseEnvelope::new(500, "internal", json!({})).unwrap()],
            pending_401(),
        );

        let err = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CubeError::AccessTokenRequest { code: 500, .. }));
        assert_eq!(transport.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_without_token_is_terminal() {
        let transport = ScriptedTransport::new(
            vec![ResponseEnvelope::new(0, "success", json!({})).unwrap()],
            pending_401(),
        );

        let err = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CubeError::AccessTokenRequest { code: 0, .. }));
        assert!(transport.credentials.access_token().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_reply_is_terminal() {
        let transport = ScriptedTransport::new(
            vec![ResponseEnvelope::malformed("Invalid JSON response.")],
            pending_401(),
        );

        let err = acquire_access_token(&transport, AccessTokenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CubeError::AccessTokenRequest { code: -1, .. }));
    }

    #[test]
    fn test_default_options() {
        let options = AccessTokenOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(120_000));
        assert_eq!(options.interval, Duration::from_millis(2_000));
    }
}
