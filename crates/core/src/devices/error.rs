use super::{Action, DeviceType};

/// Everything that can go wrong while resolving or driving a device.
///
/// The `Display` output is the sentence shown to the user, so callers at the
/// registry boundary can turn any failure into a reply with `to_string()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("❌ {name} is offline")]
    Offline { name: String },
    #[error("❌ {name} is off. Turn it on first")]
    PoweredOff { name: String },
    #[error("❌ Action '{action}' not supported for {device_type}")]
    Unsupported {
        action: Action,
        device_type: DeviceType,
    },
    #[error("❌ Please specify {0}")]
    MissingValue(&'static str),
    #[error("❌ Invalid value '{value}' for action '{action}'")]
    InvalidValue { value: String, action: Action },
    #[error("❌ Invalid {what}. Available: {}", .allowed.join(", "))]
    InvalidChoice {
        what: &'static str,
        allowed: &'static [&'static str],
    },
    #[error("❌ Device not found: {device_type} in {location}")]
    NotFound {
        device_type: DeviceType,
        location: String,
    },
    #[error("❌ Please specify the location for the device")]
    MissingLocation,
    #[error("❌ Only 'off' action is supported for all devices")]
    BulkActionUnsupported,
    #[error("❌ Unknown device type: {0}")]
    UnknownDeviceType(String),
    #[error("❌ Unknown action: {0}")]
    UnknownAction(String),
    #[error("❌ No lamps found")]
    NoLamps,
    #[error("❌ No lamps could be controlled")]
    NoLampsControlled,
    #[error("❌ Device '{0}' not found")]
    UnknownDevice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_user_facing() {
        let err = DeviceError::PoweredOff {
            name: "Kitchen AC".to_string(),
        };
        assert_eq!(err.to_string(), "❌ Kitchen AC is off. Turn it on first");

        let err = DeviceError::InvalidChoice {
            what: "fan speed",
            allowed: &["low", "high"],
        };
        assert_eq!(err.to_string(), "❌ Invalid fan speed. Available: low, high");

        let err = DeviceError::Unsupported {
            action: Action::Channel,
            device_type: DeviceType::Lamp,
        };
        assert_eq!(err.to_string(), "❌ Action 'channel' not supported for lamp");
    }
}
