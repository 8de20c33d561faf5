//! Simulated Household Devices
//!
//! Every device kind is a closed variant of [`DeviceState`] and exposes a
//! fixed capability set through the [`Appliance`] trait. Action names coming
//! from the model are parsed into [`Action`] and checked against those
//! capabilities before anything is mutated.

pub mod air_conditioner;
pub mod error;
pub mod lamp;
pub mod registry;
pub mod television;

pub use air_conditioner::AcState;
pub use error::DeviceError;
pub use lamp::LampState;
pub use registry::DeviceRegistry;
pub use television::TvState;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The three kinds of simulated appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Lamp,
    Ac,
    Tv,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Lamp, DeviceType::Ac, DeviceType::Tv];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Lamp => "lamp",
            DeviceType::Ac => "ac",
            DeviceType::Tv => "tv",
        }
    }

    /// Suffix used in display names, e.g. "Kitchen AC".
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Lamp => "Lamp",
            DeviceType::Ac => "AC",
            DeviceType::Tv => "TV",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lamp" => Ok(DeviceType::Lamp),
            "ac" => Ok(DeviceType::Ac),
            "tv" => Ok(DeviceType::Tv),
            other => Err(DeviceError::UnknownDeviceType(other.to_string())),
        }
    }
}

/// Every action the `control_device` function may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    On,
    Off,
    Toggle,
    Brightness,
    Color,
    Temperature,
    Mode,
    FanSpeed,
    Channel,
    Volume,
    Input,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::On,
        Action::Off,
        Action::Toggle,
        Action::Brightness,
        Action::Color,
        Action::Temperature,
        Action::Mode,
        Action::FanSpeed,
        Action::Channel,
        Action::Volume,
        Action::Input,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "on",
            Action::Off => "off",
            Action::Toggle => "toggle",
            Action::Brightness => "brightness",
            Action::Color => "color",
            Action::Temperature => "temperature",
            Action::Mode => "mode",
            Action::FanSpeed => "fan_speed",
            Action::Channel => "channel",
            Action::Volume => "volume",
            Action::Input => "input",
        }
    }

    /// Power actions are valid on every device and skip the powered-on check.
    pub fn is_power(&self) -> bool {
        matches!(self, Action::On | Action::Off | Action::Toggle)
    }

    /// What to ask the user for when the action arrives without a value.
    fn value_hint(&self) -> &'static str {
        match self {
            Action::Brightness => "brightness level (0-100)",
            Action::Color => "a color",
            Action::Temperature => "temperature (16-30°C)",
            Action::Mode => "mode",
            Action::FanSpeed => "fan speed",
            Action::Channel => "channel number",
            Action::Volume => "volume level",
            Action::Input => "input",
            Action::On | Action::Off | Action::Toggle => "an action",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or(DeviceError::UnknownAction(normalized))
    }
}

/// The capability surface shared by every device kind.
pub trait Appliance {
    /// Type-specific actions this kind accepts, on top of the power actions.
    fn capabilities(&self) -> &'static [Action];

    fn is_powered(&self) -> bool;

    fn set_power(&mut self, on: bool);

    /// Applies a type-specific setting. The caller has already checked that
    /// the device is online and powered on.
    fn apply(&mut self, name: &str, action: Action, value: &str) -> Result<String, DeviceError>;

    /// The detail part of a powered-on status line.
    fn describe(&self) -> String;

    /// Type-specific state fields, excluding power.
    fn snapshot(&self) -> Map<String, Value>;

    fn supports(&self, action: Action) -> bool {
        action.is_power() || self.capabilities().contains(&action)
    }
}

/// Closed set of per-kind device states.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceState {
    Lamp(LampState),
    Ac(AcState),
    Tv(TvState),
}

impl DeviceState {
    pub fn for_type(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Lamp => DeviceState::Lamp(LampState::default()),
            DeviceType::Ac => DeviceState::Ac(AcState::default()),
            DeviceType::Tv => DeviceState::Tv(TvState::default()),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            DeviceState::Lamp(_) => DeviceType::Lamp,
            DeviceState::Ac(_) => DeviceType::Ac,
            DeviceState::Tv(_) => DeviceType::Tv,
        }
    }

    pub fn appliance(&self) -> &dyn Appliance {
        match self {
            DeviceState::Lamp(state) => state,
            DeviceState::Ac(state) => state,
            DeviceState::Tv(state) => state,
        }
    }

    pub fn appliance_mut(&mut self) -> &mut dyn Appliance {
        match self {
            DeviceState::Lamp(state) => state,
            DeviceState::Ac(state) => state,
            DeviceState::Tv(state) => state,
        }
    }
}

/// One simulated appliance.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub location: String,
    pub state: DeviceState,
    pub last_updated: DateTime<Local>,
    pub online: bool,
}

impl Device {
    /// Builds the stable identifier for a `(location, type)` pair,
    /// e.g. `("Room 1", Lamp)` becomes `room_1_lamp`.
    pub fn device_id(location: &str, device_type: DeviceType) -> String {
        format!(
            "{}_{}",
            location.trim().to_lowercase().replace(' ', "_"),
            device_type.as_str()
        )
    }

    /// Creates a powered-off, online device with default settings.
    pub fn new(location: &str, device_type: DeviceType) -> Self {
        Self {
            id: Self::device_id(location, device_type),
            name: format!("{} {}", location, device_type.label()),
            location: location.to_string(),
            state: DeviceState::for_type(device_type),
            last_updated: Local::now(),
            online: true,
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.state.device_type()
    }

    pub fn is_powered(&self) -> bool {
        self.state.appliance().is_powered()
    }

    pub fn turn_on(&mut self) -> Result<String, DeviceError> {
        self.ensure_online()?;
        self.state.appliance_mut().set_power(true);
        self.touch();
        Ok(format!("✅ {} turned on", self.name))
    }

    pub fn turn_off(&mut self) -> Result<String, DeviceError> {
        self.ensure_online()?;
        self.state.appliance_mut().set_power(false);
        self.touch();
        Ok(format!("🔌 {} turned off", self.name))
    }

    pub fn toggle(&mut self) -> Result<String, DeviceError> {
        if self.is_powered() {
            self.turn_off()
        } else {
            self.turn_on()
        }
    }

    /// Runs one action against this device.
    pub fn execute(&mut self, action: Action, value: Option<&str>) -> Result<String, DeviceError> {
        match action {
            Action::On => return self.turn_on(),
            Action::Off => return self.turn_off(),
            Action::Toggle => return self.toggle(),
            _ => {}
        }

        if !self.state.appliance().supports(action) {
            return Err(DeviceError::Unsupported {
                action,
                device_type: self.device_type(),
            });
        }
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(DeviceError::MissingValue(action.value_hint()))?;

        self.ensure_online()?;
        if !self.is_powered() {
            return Err(DeviceError::PoweredOff {
                name: self.name.clone(),
            });
        }

        let result = self.state.appliance_mut().apply(&self.name, action, value)?;
        self.touch();
        Ok(result)
    }

    /// Formatted one-line status.
    pub fn status_line(&self) -> String {
        if !self.online {
            return format!("{} ({}): OFFLINE 🔴", self.name, self.location);
        }
        if self.is_powered() {
            format!(
                "{} ({}): ON 🟢 - {}",
                self.name,
                self.location,
                self.state.appliance().describe()
            )
        } else {
            format!("{} ({}): OFF 🔴", self.name, self.location)
        }
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            device_type: self.device_type(),
            power: self.is_powered(),
            online: self.online,
            last_updated: self.last_updated,
            state: self.state.appliance().snapshot(),
        }
    }

    fn ensure_online(&self) -> Result<(), DeviceError> {
        if self.online {
            Ok(())
        } else {
            Err(DeviceError::Offline {
                name: self.name.clone(),
            })
        }
    }

    fn touch(&mut self) {
        self.last_updated = Local::now();
    }
}

/// Serialisable view of a device for consumers outside the core.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub power: bool,
    pub online: bool,
    pub last_updated: DateTime<Local>,
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

/// Parses a whole-number setting. Integral floats such as "22.0" are
/// accepted; fractional values such as "22.5" are rejected.
pub(crate) fn parse_number(value: &str, action: Action) -> Result<i64, DeviceError> {
    let trimmed = value.trim().trim_end_matches(['%', '°']);
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
        .ok_or_else(|| DeviceError::InvalidValue {
            value: value.to_string(),
            action,
        })
}

/// Matches an enumerated setting case-insensitively after trimming.
pub(crate) fn parse_choice(
    value: &str,
    what: &'static str,
    allowed: &'static [&'static str],
) -> Result<&'static str, DeviceError> {
    let normalized = value.trim().to_lowercase();
    allowed
        .iter()
        .copied()
        .find(|candidate| *candidate == normalized)
        .ok_or(DeviceError::InvalidChoice { what, allowed })
}
