use super::{Action, Appliance, DeviceError, DeviceType, parse_choice, parse_number};
use serde_json::{Map, Value, json};

pub const MIN_TEMPERATURE: i64 = 16;
pub const MAX_TEMPERATURE: i64 = 30;
pub const VALID_MODES: &[&str] = &["cool", "heat", "fan", "auto", "dry"];
pub const VALID_FAN_SPEEDS: &[&str] = &["low", "medium", "high", "auto"];

fn mode_emoji(mode: &str) -> &'static str {
    match mode {
        "heat" => "🔥",
        "fan" => "💨",
        "auto" => "🔄",
        "dry" => "💧",
        _ => "❄️",
    }
}

/// An air conditioner with temperature, mode and fan speed.
#[derive(Debug, Clone, PartialEq)]
pub struct AcState {
    pub power: bool,
    pub temperature: i64,
    pub mode: String,
    pub fan_speed: String,
}

impl Default for AcState {
    fn default() -> Self {
        Self {
            power: false,
            temperature: 22,
            mode: "cool".to_string(),
            fan_speed: "medium".to_string(),
        }
    }
}

impl Appliance for AcState {
    fn capabilities(&self) -> &'static [Action] {
        &[Action::Temperature, Action::Mode, Action::FanSpeed]
    }

    fn is_powered(&self) -> bool {
        self.power
    }

    fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    fn apply(&mut self, name: &str, action: Action, value: &str) -> Result<String, DeviceError> {
        match action {
            Action::Temperature => {
                let temp = parse_number(value, action)?.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
                self.temperature = temp;
                let emoji = if temp <= 20 {
                    "❄️"
                } else if temp >= 25 {
                    "🔥"
                } else {
                    "🌡️"
                };
                Ok(format!("{} {} temperature set to {}°C", emoji, name, temp))
            }
            Action::Mode => {
                let mode = parse_choice(value, "mode", VALID_MODES)?;
                self.mode = mode.to_string();
                Ok(format!("{} {} mode set to {}", mode_emoji(mode), name, mode))
            }
            Action::FanSpeed => {
                let speed = parse_choice(value, "fan speed", VALID_FAN_SPEEDS)?;
                self.fan_speed = speed.to_string();
                Ok(format!("💨 {} fan speed set to {}", name, speed))
            }
            _ => Err(DeviceError::Unsupported {
                action,
                device_type: DeviceType::Ac,
            }),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{}°C 🌡️, {} mode {}, {} fan 💨",
            self.temperature,
            self.mode,
            mode_emoji(&self.mode),
            self.fan_speed
        )
    }

    fn snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("temperature".to_string(), json!(self.temperature));
        map.insert("mode".to_string(), json!(self.mode));
        map.insert("fan_speed".to_string(), json!(self.fan_speed));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_ac() -> AcState {
        AcState {
            power: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_temperature_is_clamped() {
        let mut ac = powered_ac();
        let result = ac.apply("Kitchen AC", Action::Temperature, "35").unwrap();
        assert_eq!(result, "🔥 Kitchen AC temperature set to 30°C");
        assert_eq!(ac.temperature, 30);

        let result = ac.apply("Kitchen AC", Action::Temperature, "5").unwrap();
        assert_eq!(result, "❄️ Kitchen AC temperature set to 16°C");
        assert_eq!(ac.temperature, 16);
    }

    #[test]
    fn test_mode_and_fan_speed() {
        let mut ac = powered_ac();
        assert_eq!(
            ac.apply("Kitchen AC", Action::Mode, "HEAT").unwrap(),
            "🔥 Kitchen AC mode set to heat"
        );
        assert_eq!(
            ac.apply("Kitchen AC", Action::FanSpeed, "high").unwrap(),
            "💨 Kitchen AC fan speed set to high"
        );
        let err = ac.apply("Kitchen AC", Action::FanSpeed, "turbo").unwrap_err();
        assert_eq!(
            err.to_string(),
            "❌ Invalid fan speed. Available: low, medium, high, auto"
        );
        assert_eq!(ac.fan_speed, "high");
    }

    #[test]
    fn test_non_numeric_temperature() {
        let mut ac = powered_ac();
        let err = ac.apply("Kitchen AC", Action::Temperature, "warm").unwrap_err();
        assert_eq!(err.to_string(), "❌ Invalid value 'warm' for action 'temperature'");
        assert_eq!(ac.temperature, 22);
    }
}
