use crate::client::{Method, Transport};
use crate::types::{BridgeConfigRequest, ResponseEnvelope};
use crate::{paths, Result};

/// Public bridge information. Needs no access token.
pub async fn get_bridge_info<T>(transport: &T) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::BRIDGE, Method::Get, None, false)
        .await
}

pub async fn get_bridge_runtime<T>(transport: &T) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::BRIDGE_RUNTIME, Method::Get, None, true)
        .await
}

pub async fn update_bridge_config<T>(transport: &T, volume: u8) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    let params = serde_json::to_value(BridgeConfigRequest::new(volume)?)?;
    transport
        .request(paths::BRIDGE_CONFIG, Method::Put, Some(params), true)
        .await
}
