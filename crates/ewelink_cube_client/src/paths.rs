//! Open API paths, relative to the REST prefix unless noted.

pub const ROOT: &str = "/open-api";
pub const REST_V1: &str = "/v1/rest";
/// Relative to [`ROOT`], not to the REST prefix.
pub const SSE: &str = "/v1/sse/bridge";

pub const BRIDGE: &str = "/bridge";
pub const BRIDGE_TOKEN: &str = "/bridge/access_token";
pub const BRIDGE_RUNTIME: &str = "/bridge/runtime";
pub const BRIDGE_CONFIG: &str = "/bridge/config";
pub const HARDWARE_REBOOT: &str = "/hardware/reboot";
pub const HARDWARE_SPEAKER: &str = "/hardware/speaker";
pub const DEVICE_DISCOVERY: &str = "/devices/discovery";
pub const DEVICES: &str = "/devices";
pub const THIRD_PARTY_EVENT: &str = "/thirdparty/event";
pub const DEBUG_LOG: &str = "/thirdparty/debug-log";

pub fn rest_url(host: &str, path: &str) -> String {
    format!("http://{}{}{}{}", host, ROOT, REST_V1, path)
}

pub fn stream_url(host: &str, access_token: &str) -> String {
    format!("http://{}{}{}?access_token={}", host, ROOT, SSE, access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url() {
        assert_eq!(
            rest_url("192.168.1.5", BRIDGE_TOKEN),
            "http://192.168.1.5/open-api/v1/rest/bridge/access_token"
        );
        assert_eq!(
            rest_url("ihost.local", "/devices/abc"),
            "http://ihost.local/open-api/v1/rest/devices/abc"
        );
    }

    #[test]
    fn test_stream_url() {
        assert_eq!(
            stream_url("ihost.local", "tok"),
            "http://ihost.local/open-api/v1/sse/bridge?access_token=tok"
        );
    }
}
