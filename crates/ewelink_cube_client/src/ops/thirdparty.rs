use serde_json::Value;

use crate::client::{Method, Transport};
use crate::types::ResponseEnvelope;
use crate::{paths, Result};

/// Forwards a third-party device event (`{"event": {...}}`) to the bridge.
pub async fn send_third_party_event<T>(transport: &T, event: Value) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    let params = serde_json::json!({ "event": event });
    transport
        .request(paths::THIRD_PARTY_EVENT, Method::Post, Some(params), true)
        .await
}

pub async fn get_debug_log<T>(transport: &T) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::DEBUG_LOG, Method::Get, None, true)
        .await
}
