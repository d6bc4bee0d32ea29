/// Event names the bridge is known to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AddDevice,
    UpdateDeviceState,
    UpdateDeviceInfo,
    UpdateDeviceOnline,
    DeleteDevice,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::AddDevice,
        EventKind::UpdateDeviceState,
        EventKind::UpdateDeviceInfo,
        EventKind::UpdateDeviceOnline,
        EventKind::DeleteDevice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::AddDevice => "device#v1#addDevice",
            EventKind::UpdateDeviceState => "device#v1#updateDeviceState",
            EventKind::UpdateDeviceInfo => "device#v1#updateDeviceInfo",
            EventKind::UpdateDeviceOnline => "device#v1#updateDeviceOnline",
            EventKind::DeleteDevice => "device#v1#deleteDevice",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
