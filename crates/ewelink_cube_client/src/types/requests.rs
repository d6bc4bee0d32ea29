use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CubeError, Result};

const SUPPORTED_SOUNDS: [&str; 15] = [
    "alert1", "alert2", "alert3", "alert4", "alert5", "doorbell1", "doorbell2", "doorbell3",
    "doorbell4", "doorbell5", "alarm1", "alarm2", "alarm3", "alarm4", "alarm5",
];

const SUPPORTED_BEEPS: [&str; 8] = [
    "bootComplete",
    "networkConnected",
    "networkDisconnected",
    "systemShutdown",
    "deviceDiscovered",
    "systemArmed",
    "systemDisarmed",
    "factoryReset",
];

const MAX_COUNTDOWN: u32 = 1799;

fn check_volume(volume: u8) -> Result<u8> {
    if volume > 100 {
        return Err(CubeError::InvalidParams(
            "Volume must be in the range of 0-100".into(),
        ));
    }
    Ok(volume)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfigRequest {
    pub volume: u8,
}

impl BridgeConfigRequest {
    pub fn new(volume: u8) -> Result<Self> {
        Ok(Self {
            volume: check_volume(volume)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub name: String,
    pub volume: u8,
    pub countdown: u32,
}

impl Sound {
    pub fn new(name: impl Into<String>, volume: u8, countdown: u32) -> Result<Self> {
        let name = name.into();
        if !SUPPORTED_SOUNDS.contains(&name.as_str()) {
            return Err(CubeError::InvalidParams(format!("Unsupported sound name: {}", name)));
        }
        if countdown > MAX_COUNTDOWN {
            return Err(CubeError::InvalidParams(
                "Countdown must be in the range of 0-1799".into(),
            ));
        }
        Ok(Self {
            name,
            volume: check_volume(volume)?,
            countdown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beep {
    pub name: String,
    pub volume: u8,
}

impl Beep {
    pub fn new(name: impl Into<String>, volume: u8) -> Result<Self> {
        let name = name.into();
        if !SUPPORTED_BEEPS.contains(&name.as_str()) {
            return Err(CubeError::InvalidParams(format!("Unsupported beep name: {}", name)));
        }
        Ok(Self {
            name,
            volume: check_volume(volume)?,
        })
    }
}

/// Body of `POST /hardware/speaker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeakerRequest {
    PlaySound { sound: Sound },
    PlayBeep { beep: Beep },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryType {
    Zigbee,
}

/// Body of `PUT /devices/discovery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub enable: bool,
    #[serde(rename = "type")]
    pub device_type: DiscoveryType,
}

/// Body of `PUT /devices`, addressing a device by id with a raw command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommandRequest {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub command: Value,
}
