use super::{Action, Appliance, DeviceError, parse_choice, parse_number};
use serde_json::{Map, Value, json};

pub const VALID_COLORS: &[&str] = &["white", "red", "blue", "green", "yellow", "purple", "orange"];

const MIN_BRIGHTNESS: i64 = 0;
const MAX_BRIGHTNESS: i64 = 100;

fn color_emoji(color: &str) -> &'static str {
    match color {
        "white" => "⚪",
        "red" => "🔴",
        "blue" => "🔵",
        "green" => "🟢",
        "yellow" => "🟡",
        "purple" => "🟣",
        "orange" => "🟠",
        _ => "💡",
    }
}

/// A dimmable, colour-changing lamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LampState {
    pub power: bool,
    pub brightness: u8,
    pub color: String,
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            power: false,
            brightness: 100,
            color: "white".to_string(),
        }
    }
}

impl LampState {
    fn set_brightness(&mut self, name: &str, value: &str) -> Result<String, DeviceError> {
        let level = parse_number(value, Action::Brightness)?.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        self.brightness = level as u8;
        if level == 0 {
            self.power = false;
            return Ok(format!("🌙 {} dimmed to 0% (turned off)", name));
        }
        Ok(format!("💡 {} brightness set to {}%", name, level))
    }

    fn set_color(&mut self, name: &str, value: &str) -> Result<String, DeviceError> {
        let color = parse_choice(value, "color", VALID_COLORS)?;
        self.color = color.to_string();
        Ok(format!(
            "{} {} color changed to {}",
            color_emoji(color),
            name,
            color
        ))
    }
}

impl Appliance for LampState {
    fn capabilities(&self) -> &'static [Action] {
        &[Action::Brightness, Action::Color]
    }

    fn is_powered(&self) -> bool {
        self.power
    }

    fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    fn apply(&mut self, name: &str, action: Action, value: &str) -> Result<String, DeviceError> {
        match action {
            Action::Brightness => self.set_brightness(name, value),
            Action::Color => self.set_color(name, value),
            _ => Err(DeviceError::Unsupported {
                action,
                device_type: super::DeviceType::Lamp,
            }),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{}% brightness {} {} color",
            self.brightness,
            color_emoji(&self.color),
            self.color
        )
    }

    fn snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("brightness".to_string(), json!(self.brightness));
        map.insert("color".to_string(), json!(self.color));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_lamp() -> LampState {
        LampState {
            power: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_brightness_is_clamped() {
        let mut lamp = powered_lamp();
        let result = lamp.apply("Kitchen Lamp", Action::Brightness, "150").unwrap();
        assert_eq!(result, "💡 Kitchen Lamp brightness set to 100%");
        assert_eq!(lamp.brightness, 100);

        let result = lamp.apply("Kitchen Lamp", Action::Brightness, "-20").unwrap();
        assert_eq!(result, "🌙 Kitchen Lamp dimmed to 0% (turned off)");
        assert_eq!(lamp.brightness, 0);
        assert!(!lamp.power);
    }

    #[test]
    fn test_zero_brightness_powers_off() {
        let mut lamp = powered_lamp();
        lamp.apply("Kitchen Lamp", Action::Brightness, "0").unwrap();
        assert!(!lamp.is_powered());
    }

    #[test]
    fn test_color_is_validated_case_insensitively() {
        let mut lamp = powered_lamp();
        let result = lamp.apply("Kitchen Lamp", Action::Color, "  Blue ").unwrap();
        assert_eq!(result, "🔵 Kitchen Lamp color changed to blue");
        assert_eq!(lamp.color, "blue");

        let err = lamp.apply("Kitchen Lamp", Action::Color, "magenta").unwrap_err();
        assert_eq!(
            err.to_string(),
            "❌ Invalid color. Available: white, red, blue, green, yellow, purple, orange"
        );
        assert_eq!(lamp.color, "blue");
    }

    #[test]
    fn test_describe_powered_lamp() {
        let lamp = powered_lamp();
        assert_eq!(lamp.describe(), "100% brightness ⚪ white color");
    }
}
