use serde_json::Value;

use crate::client::{Method, Transport};
use crate::types::{DeviceCommandRequest, DeviceListData, DiscoveryRequest, ResponseEnvelope};
use crate::{paths, CubeError, Result};

fn device_path(serial_number: &str) -> String {
    format!("{}/{}", paths::DEVICES, serial_number)
}

/// Starts or stops sub-device discovery.
pub async fn discover_sub_devices<T>(
    transport: &T,
    request: &DiscoveryRequest,
) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    let params = serde_json::to_value(request)?;
    transport
        .request(paths::DEVICE_DISCOVERY, Method::Put, Some(params), true)
        .await
}

/// Manually adds a sub-device (RTSP and ESP32 cameras).
pub async fn add_sub_device<T>(transport: &T, params: Value) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::DEVICES, Method::Post, Some(params), true)
        .await
}

pub async fn get_device_list<T>(transport: &T) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(paths::DEVICES, Method::Get, None, true)
        .await
}

/// Device list decoded from a successful reply.
pub async fn list_devices<T>(transport: &T) -> Result<Vec<Value>>
where
    T: Transport + ?Sized,
{
    let response = get_device_list(transport).await?;
    if !response.is_success() {
        return Err(CubeError::InvalidResponse(format!(
            "Device list failed: {} - {}",
            response.error(),
            response.message()
        )));
    }
    let data: DeviceListData = serde_json::from_value(response.into_data())?;
    Ok(data.device_list)
}

pub async fn update_device_state<T>(
    transport: &T,
    serial_number: &str,
    params: Value,
) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(&device_path(serial_number), Method::Put, Some(params), true)
        .await
}

pub async fn delete_device<T>(transport: &T, serial_number: &str) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    transport
        .request(&device_path(serial_number), Method::Delete, None, true)
        .await
}

pub async fn send_command_to_device<T>(
    transport: &T,
    device_id: &str,
    command: Value,
) -> Result<ResponseEnvelope>
where
    T: Transport + ?Sized,
{
    let request = DeviceCommandRequest {
        device_id: device_id.to_string(),
        command,
    };
    let params = serde_json::to_value(request)?;
    transport
        .request(paths::DEVICES, Method::Put, Some(params), true)
        .await
}
