//! Device Registry
//!
//! Owns every simulated device for the lifetime of the process. The device
//! set is fixed once built from [`HomeConfig`]; only device state changes.

use super::{Action, Device, DeviceError, DeviceSnapshot, DeviceType};
use crate::config::HomeConfig;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const ALL_LAMPS: &str = "all_lamps";
const ALL_DEVICES: &str = "all_devices";

/// The fixed collection of devices, keyed by their derived identifier.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl DeviceRegistry {
    /// Creates one device per configured `(location, type)` pair.
    ///
    /// A location listed twice for the same type yields a single device.
    pub fn new(config: &HomeConfig) -> Self {
        let mut registry = Self {
            devices: Vec::new(),
            index: HashMap::new(),
        };
        let layout = [
            (DeviceType::Lamp, &config.lamps),
            (DeviceType::Ac, &config.acs),
            (DeviceType::Tv, &config.tvs),
        ];
        for (device_type, locations) in layout {
            for location in locations {
                let device = Device::new(location, device_type);
                if registry.index.contains_key(&device.id) {
                    warn!(id = %device.id, "Duplicate device location ignored");
                    continue;
                }
                registry.index.insert(device.id.clone(), registry.devices.len());
                registry.devices.push(device);
            }
        }
        info!(count = registry.devices.len(), "Device registry initialised");
        registry
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.index.get(id).map(|&i| &self.devices[i])
    }

    fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.index.get(id).map(|&i| &mut self.devices[i])
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn devices_by_type(&self, device_type: DeviceType) -> impl Iterator<Item = &Device> {
        self.devices
            .iter()
            .filter(move |d| d.device_type() == device_type)
    }

    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.devices.iter().map(Device::snapshot).collect()
    }

    pub fn powered_on_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_powered()).count()
    }

    /// Applies `action` to the device(s) selected by `device_type` and
    /// `location`. Failures come back as `❌` sentences, never as errors.
    pub fn control(
        &mut self,
        device_type: &str,
        action: &str,
        location: Option<&str>,
        value: Option<&str>,
    ) -> String {
        debug!(device_type, action, ?location, ?value, "Controlling device");
        match self.try_control(device_type, action, location, value) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "Device control rejected");
                err.to_string()
            }
        }
    }

    fn try_control(
        &mut self,
        device_type: &str,
        action: &str,
        location: Option<&str>,
        value: Option<&str>,
    ) -> Result<String, DeviceError> {
        match device_type.trim().to_lowercase().as_str() {
            ALL_LAMPS => self.control_all_lamps(action.parse()?, value),
            ALL_DEVICES => self.control_all_devices(action),
            other => {
                let device_type: DeviceType = other.parse()?;
                let location = location
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .ok_or(DeviceError::MissingLocation)?;
                let action: Action = action.parse()?;
                let id = Device::device_id(location, device_type);
                let device = self.device_mut(&id).ok_or_else(|| DeviceError::NotFound {
                    device_type,
                    location: location.to_string(),
                })?;
                device.execute(action, value)
            }
        }
    }

    fn control_all_lamps(&mut self, action: Action, value: Option<&str>) -> Result<String, DeviceError> {
        let mut lines = Vec::new();
        let mut seen_lamp = false;
        for device in self
            .devices
            .iter_mut()
            .filter(|d| d.device_type() == DeviceType::Lamp)
        {
            seen_lamp = true;
            match device.execute(action, value) {
                Ok(line) => lines.push(format!("  • {}", line)),
                Err(err) => debug!(id = %device.id, error = %err, "Skipping lamp"),
            }
        }
        if !seen_lamp {
            return Err(DeviceError::NoLamps);
        }
        if lines.is_empty() {
            return Err(DeviceError::NoLampsControlled);
        }
        Ok(format!("💡 All lamps:\n{}", lines.join("\n")))
    }

    fn control_all_devices(&mut self, action: &str) -> Result<String, DeviceError> {
        if !action.trim().eq_ignore_ascii_case("off") {
            return Err(DeviceError::BulkActionUnsupported);
        }
        let lines: Vec<String> = self
            .devices
            .iter_mut()
            .filter_map(|device| device.turn_off().ok())
            .map(|line| format!("  • {}", line))
            .collect();
        Ok(format!("🔌 All devices turned off:\n{}", lines.join("\n")))
    }

    /// Flips the power state of one device by identifier.
    pub fn toggle(&mut self, id: &str) -> Result<String, DeviceError> {
        self.device_mut(id)
            .ok_or_else(|| DeviceError::UnknownDevice(id.to_string()))?
            .toggle()
    }

    /// Marks a device online or offline. Returns `false` for unknown ids.
    pub fn set_online(&mut self, id: &str, online: bool) -> bool {
        match self.device_mut(id) {
            Some(device) => {
                device.online = online;
                true
            }
            None => false,
        }
    }

    /// Powers off every device.
    pub fn shutdown(&mut self) -> String {
        self.control(ALL_DEVICES, "off", None, None)
    }

    /// Formats the status of all devices (`"all"`) or of the first device
    /// whose identifier or name contains `query`, case-insensitively.
    pub fn status(&self, query: &str) -> String {
        let query = query.trim().to_lowercase();
        if query.is_empty() || query == "all" {
            return self.full_report();
        }
        self.devices
            .iter()
            .find(|d| d.id.contains(&query) || d.name.to_lowercase().contains(&query))
            .map(|d| format!("📊 {}", d.status_line()))
            .unwrap_or_else(|| DeviceError::UnknownDevice(query).to_string())
    }

    fn full_report(&self) -> String {
        let mut lines = vec!["📊 Smart Home Status:".to_string()];
        let groups = [
            (DeviceType::Lamp, "💡 Lamps:"),
            (DeviceType::Ac, "❄️ Air Conditioners:"),
            (DeviceType::Tv, "📺 Televisions:"),
        ];
        for (device_type, header) in groups {
            let mut group = self.devices_by_type(device_type).peekable();
            if group.peek().is_none() {
                continue;
            }
            lines.push(format!("\n{}", header));
            lines.extend(group.map(|d| format!("  • {}", d.status_line())));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(&HomeConfig::default())
    }

    #[test]
    fn test_one_device_per_location_and_type() {
        let config = HomeConfig::default();
        let registry = DeviceRegistry::new(&config);
        assert_eq!(registry.len(), 7);

        for (device_type, locations) in [
            (DeviceType::Lamp, &config.lamps),
            (DeviceType::Ac, &config.acs),
            (DeviceType::Tv, &config.tvs),
        ] {
            for location in locations {
                let id = Device::device_id(location, device_type);
                let first = registry.device(&id).expect("device should exist");
                let second = registry.device(&id).expect("device should exist");
                assert_eq!(first.id, second.id);
                assert_eq!(first.device_type(), device_type);
                assert_eq!(
                    registry.devices().filter(|d| d.id == id).count(),
                    1,
                    "identifier {id} must be unique"
                );
            }
        }
    }

    #[test]
    fn test_duplicate_locations_are_collapsed() {
        let config = HomeConfig {
            lamps: vec!["Kitchen".to_string(), "kitchen".to_string()],
            acs: vec![],
            tvs: vec![],
            ..Default::default()
        };
        assert_eq!(DeviceRegistry::new(&config).len(), 1);
    }

    #[test]
    fn test_ac_temperature_requires_power() {
        let mut registry = registry();
        let result = registry.control("ac", "temperature", Some("kitchen"), Some("22"));
        assert!(result.starts_with("❌"));
        assert!(result.contains("off"));

        let result = registry.control("ac", "on", Some("kitchen"), None);
        assert_eq!(result, "✅ Kitchen AC turned on");

        let result = registry.control("ac", "temperature", Some("kitchen"), Some("22"));
        assert_eq!(result, "🌡️ Kitchen AC temperature set to 22°C");
        assert!(registry.status("kitchen_ac").contains("22"));
    }

    #[test]
    fn test_ac_temperature_clamping_through_registry() {
        let mut registry = registry();
        registry.control("ac", "on", Some("Room 1"), None);
        registry.control("ac", "temperature", Some("Room 1"), Some("35"));
        assert!(registry.status("room_1_ac").contains("30°C"));
        registry.control("ac", "temperature", Some("Room 1"), Some("5"));
        assert!(registry.status("room_1_ac").contains("16°C"));
    }

    #[test]
    fn test_missing_location_and_unknown_device() {
        let mut registry = registry();
        assert_eq!(
            registry.control("lamp", "on", None, None),
            "❌ Please specify the location for the device"
        );
        assert_eq!(
            registry.control("tv", "on", Some("garage"), None),
            "❌ Device not found: tv in garage"
        );
        assert_eq!(
            registry.control("fridge", "on", Some("kitchen"), None),
            "❌ Unknown device type: fridge"
        );
        assert_eq!(
            registry.control("lamp", "dance", Some("kitchen"), None),
            "❌ Unknown action: dance"
        );
    }

    #[test]
    fn test_all_lamps_skips_failures() {
        let mut registry = registry();
        registry.set_online("bathroom_lamp", false);
        let result = registry.control("all_lamps", "on", None, None);
        assert!(result.starts_with("💡 All lamps:"));
        assert_eq!(result.lines().count(), 4);
        assert!(!result.contains("Bathroom"));
        assert!(registry.device("kitchen_lamp").unwrap().is_powered());
        assert!(!registry.device("bathroom_lamp").unwrap().is_powered());
    }

    #[test]
    fn test_all_lamps_when_every_lamp_fails() {
        let mut registry = registry();
        let result = registry.control("all_lamps", "brightness", None, Some("50"));
        assert_eq!(result, "❌ No lamps could be controlled");
    }

    #[test]
    fn test_all_devices_only_supports_off() {
        let mut registry = registry();
        registry.control("all_lamps", "on", None, None);
        let result = registry.control("all_devices", "on", None, None);
        assert_eq!(result, "❌ Only 'off' action is supported for all devices");
        assert_eq!(registry.powered_on_count(), 4);

        let result = registry.control("all_devices", "off", None, None);
        assert!(result.starts_with("🔌 All devices turned off:"));
        assert_eq!(registry.powered_on_count(), 0);
    }

    #[test]
    fn test_status_report_and_lookup() {
        let registry = registry();
        let report = registry.status("all");
        assert!(report.starts_with("📊 Smart Home Status:"));
        assert!(report.contains("💡 Lamps:"));
        assert!(report.contains("❄️ Air Conditioners:"));
        assert!(report.contains("📺 Televisions:"));

        assert_eq!(
            registry.status("LIVING ROOM"),
            "📊 Living Room TV (Living Room): OFF 🔴"
        );
        assert_eq!(registry.status("garage"), "❌ Device 'garage' not found");
    }

    #[test]
    fn test_toggle_by_id() {
        let mut registry = registry();
        assert_eq!(
            registry.toggle("living_room_tv").unwrap(),
            "✅ Living Room TV turned on"
        );
        assert!(registry.toggle("garage_tv").is_err());
    }

    #[test]
    fn test_shutdown_powers_everything_off() {
        let mut registry = registry();
        registry.control("tv", "on", Some("living room"), None);
        registry.shutdown();
        assert_eq!(registry.powered_on_count(), 0);
    }
}
