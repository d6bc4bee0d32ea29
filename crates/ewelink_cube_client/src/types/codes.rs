//! Error-code domains reported by the bridge in the `error` field of every
//! envelope. The set of valid codes is the union of the domains below.

/// Codes shared by every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// Reported locally when the bridge reply could not be parsed.
    Custom,
    Success,
    Parameter,
    Authentication,
    ServerException,
}

impl ResponseCode {
    pub const ALL: [ResponseCode; 5] = [
        ResponseCode::Custom,
        ResponseCode::Success,
        ResponseCode::Parameter,
        ResponseCode::Authentication,
        ResponseCode::ServerException,
    ];

    pub fn code(self) -> i64 {
        match self {
            ResponseCode::Custom => -1,
            ResponseCode::Success => 0,
            ResponseCode::Parameter => 400,
            ResponseCode::Authentication => 401,
            ResponseCode::ServerException => 500,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

/// Codes reported by the sub-device discovery and control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryErrorCode {
    SubdeviceNotExist,
    GatewayDiscoveringZigbeeDevices,
    GroupDevicesNoCommonCapability,
    IncorrectNumberOfDevices,
    IncorrectNumberOfGroups,
    DeviceOffline,
    FailedUpdateDeviceStatus,
    FailedUpdateGroupStatus,
    MaximumGroupsReached,
    CameraDeviceIncorrectIpAddress,
    CameraDeviceAuthorizationError,
    CameraDeviceStreamAddressError,
    CameraDeviceUnsupportedVideoEncoding,
    DeviceAlreadyExists,
    CameraUnsupportedOfflineOperation,
    RtspAddressPasswordInconsistency,
    GatewayDiscoveringOnvifCameras,
    MaximumCamerasAddedExceeded,
    EspCameraPathError,
}

impl DiscoveryErrorCode {
    pub const ALL: [DiscoveryErrorCode; 19] = [
        DiscoveryErrorCode::SubdeviceNotExist,
        DiscoveryErrorCode::GatewayDiscoveringZigbeeDevices,
        DiscoveryErrorCode::GroupDevicesNoCommonCapability,
        DiscoveryErrorCode::IncorrectNumberOfDevices,
        DiscoveryErrorCode::IncorrectNumberOfGroups,
        DiscoveryErrorCode::DeviceOffline,
        DiscoveryErrorCode::FailedUpdateDeviceStatus,
        DiscoveryErrorCode::FailedUpdateGroupStatus,
        DiscoveryErrorCode::MaximumGroupsReached,
        DiscoveryErrorCode::CameraDeviceIncorrectIpAddress,
        DiscoveryErrorCode::CameraDeviceAuthorizationError,
        DiscoveryErrorCode::CameraDeviceStreamAddressError,
        DiscoveryErrorCode::CameraDeviceUnsupportedVideoEncoding,
        DiscoveryErrorCode::DeviceAlreadyExists,
        DiscoveryErrorCode::CameraUnsupportedOfflineOperation,
        DiscoveryErrorCode::RtspAddressPasswordInconsistency,
        DiscoveryErrorCode::GatewayDiscoveringOnvifCameras,
        DiscoveryErrorCode::MaximumCamerasAddedExceeded,
        DiscoveryErrorCode::EspCameraPathError,
    ];

    const BASE: i64 = 110_000;

    pub fn code(self) -> i64 {
        // ALL is declared in code order starting at BASE.
        let offset = Self::ALL.iter().position(|c| *c == self).unwrap_or_default();
        Self::BASE + offset as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let offset = usize::try_from(code.checked_sub(Self::BASE)?).ok()?;
        Self::ALL.get(offset).copied()
    }

    pub fn message(self) -> &'static str {
        match self {
            DiscoveryErrorCode::SubdeviceNotExist => {
                "The sub-device/group corresponding to the id does not exist"
            }
            DiscoveryErrorCode::GatewayDiscoveringZigbeeDevices => {
                "The gateway is in the state of discovering zigbee devices"
            }
            DiscoveryErrorCode::GroupDevicesNoCommonCapability => {
                "Devices in a group do not have a common capability"
            }
            DiscoveryErrorCode::IncorrectNumberOfDevices => "Incorrect number of devices",
            DiscoveryErrorCode::IncorrectNumberOfGroups => "Incorrect number of groups",
            DiscoveryErrorCode::DeviceOffline => "Device Offline",
            DiscoveryErrorCode::FailedUpdateDeviceStatus => "Failed to update device status",
            DiscoveryErrorCode::FailedUpdateGroupStatus => "Failed to update group status",
            DiscoveryErrorCode::MaximumGroupsReached => {
                "The maximum number of groups has been reached. Create up to 50 groups"
            }
            DiscoveryErrorCode::CameraDeviceIncorrectIpAddress => {
                "The IP address of the camera device is incorrect"
            }
            DiscoveryErrorCode::CameraDeviceAuthorizationError => {
                "Camera Device Access Authorization Error"
            }
            DiscoveryErrorCode::CameraDeviceStreamAddressError => {
                "Camera device stream address error"
            }
            DiscoveryErrorCode::CameraDeviceUnsupportedVideoEncoding => {
                "Camera device video encoding is not supported"
            }
            DiscoveryErrorCode::DeviceAlreadyExists => "Device already exists",
            DiscoveryErrorCode::CameraUnsupportedOfflineOperation => {
                "Camera does not support offline operation"
            }
            DiscoveryErrorCode::RtspAddressPasswordInconsistency => {
                "The account password is inconsistent with the account password in the RTSP stream address"
            }
            DiscoveryErrorCode::GatewayDiscoveringOnvifCameras => {
                "The gateway is in the state of discovering onvif cameras"
            }
            DiscoveryErrorCode::MaximumCamerasAddedExceeded => {
                "Exceeded the maximum number of cameras added"
            }
            DiscoveryErrorCode::EspCameraPathError => "The path of the ESP camera is wrong",
        }
    }
}

/// Any code the bridge is known to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCode {
    Response(ResponseCode),
    Discovery(DiscoveryErrorCode),
}

impl KnownCode {
    pub fn from_code(code: i64) -> Option<Self> {
        ResponseCode::from_code(code)
            .map(KnownCode::Response)
            .or_else(|| DiscoveryErrorCode::from_code(code).map(KnownCode::Discovery))
    }

    pub fn code(self) -> i64 {
        match self {
            KnownCode::Response(c) => c.code(),
            KnownCode::Discovery(c) => c.code(),
        }
    }

    /// Message substituted when the bridge omits one. Generic codes have none.
    pub fn default_message(self) -> Option<&'static str> {
        match self {
            KnownCode::Response(_) => None,
            KnownCode::Discovery(c) => Some(c.message()),
        }
    }

    pub fn all() -> impl Iterator<Item = KnownCode> {
        ResponseCode::ALL
            .into_iter()
            .map(KnownCode::Response)
            .chain(DiscoveryErrorCode::ALL.into_iter().map(KnownCode::Discovery))
    }
}
