use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `data` of a successful `GET /bridge/access_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenData {
    pub token: String,
}

/// `data` of a successful `GET /devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListData {
    pub device_list: Vec<Value>,
}
