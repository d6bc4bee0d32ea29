use crate::client::{Method, Transport};
use crate::types::{ResponseEnvelope, SpeakerRequest};
use crate::{paths, Result};

pub async fn reboot_bridge<T>(transport: &T) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::HARDWARE_REBOOT, Method::Post, None, true)
        .await
}

pub async fn set_speaker<T>(transport: &T, request: &SpeakerRequest) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    let params = serde_json::to_value(request)?;
    transport
        .request(paths::HARDWARE_SPEAKER, Method::Post, Some(params), true)
        .await
}
