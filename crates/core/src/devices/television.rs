use super::{Action, Appliance, DeviceError, DeviceType, parse_choice, parse_number};
use serde_json::{Map, Value, json};

pub const MIN_CHANNEL: i64 = 1;
pub const MAX_CHANNEL: i64 = 999;
pub const MIN_VOLUME: i64 = 0;
pub const MAX_VOLUME: i64 = 100;
pub const VALID_INPUTS: &[&str] = &[
    "hdmi1", "hdmi2", "hdmi3", "usb", "cable", "antenna", "netflix", "youtube",
];

fn input_emoji(input: &str) -> &'static str {
    match input {
        "hdmi1" | "hdmi2" | "hdmi3" | "usb" => "🔌",
        "cable" | "antenna" => "📡",
        "netflix" => "🎬",
        "youtube" => "📹",
        _ => "📺",
    }
}

fn volume_emoji(volume: i64) -> &'static str {
    match volume {
        0 => "🔇",
        1..=30 => "🔈",
        31..=70 => "🔉",
        _ => "🔊",
    }
}

/// A television with channel, volume and input source.
#[derive(Debug, Clone, PartialEq)]
pub struct TvState {
    pub power: bool,
    pub channel: i64,
    pub volume: i64,
    pub input: String,
}

impl Default for TvState {
    fn default() -> Self {
        Self {
            power: false,
            channel: 1,
            volume: 50,
            input: "hdmi1".to_string(),
        }
    }
}

impl Appliance for TvState {
    fn capabilities(&self) -> &'static [Action] {
        &[Action::Channel, Action::Volume, Action::Input]
    }

    fn is_powered(&self) -> bool {
        self.power
    }

    fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    fn apply(&mut self, name: &str, action: Action, value: &str) -> Result<String, DeviceError> {
        match action {
            Action::Channel => {
                self.channel = parse_number(value, action)?.clamp(MIN_CHANNEL, MAX_CHANNEL);
                Ok(format!("📺 {} channel changed to {}", name, self.channel))
            }
            Action::Volume => {
                self.volume = parse_number(value, action)?.clamp(MIN_VOLUME, MAX_VOLUME);
                Ok(format!(
                    "{} {} volume set to {}",
                    volume_emoji(self.volume),
                    name,
                    self.volume
                ))
            }
            Action::Input => {
                let input = parse_choice(value, "input", VALID_INPUTS)?;
                self.input = input.to_string();
                Ok(format!("{} {} input changed to {}", input_emoji(input), name, input))
            }
            _ => Err(DeviceError::Unsupported {
                action,
                device_type: DeviceType::Tv,
            }),
        }
    }

    fn describe(&self) -> String {
        format!(
            "Channel {} 📺, Volume {} {}, Input: {} {}",
            self.channel,
            self.volume,
            volume_emoji(self.volume),
            self.input,
            input_emoji(&self.input)
        )
    }

    fn snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("channel".to_string(), json!(self.channel));
        map.insert("volume".to_string(), json!(self.volume));
        map.insert("input".to_string(), json!(self.input));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_tv() -> TvState {
        TvState {
            power: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_channel_and_volume_are_clamped() {
        let mut tv = powered_tv();
        tv.apply("Living Room TV", Action::Channel, "1500").unwrap();
        assert_eq!(tv.channel, 999);
        tv.apply("Living Room TV", Action::Channel, "0").unwrap();
        assert_eq!(tv.channel, 1);

        let result = tv.apply("Living Room TV", Action::Volume, "120").unwrap();
        assert_eq!(result, "🔊 Living Room TV volume set to 100");
        let result = tv.apply("Living Room TV", Action::Volume, "-3").unwrap();
        assert_eq!(result, "🔇 Living Room TV volume set to 0");
    }

    #[test]
    fn test_input_selection() {
        let mut tv = powered_tv();
        assert_eq!(
            tv.apply("Living Room TV", Action::Input, "Netflix").unwrap(),
            "🎬 Living Room TV input changed to netflix"
        );
        assert!(tv.apply("Living Room TV", Action::Input, "vhs").is_err());
        assert_eq!(tv.input, "netflix");
    }

    #[test]
    fn test_describe() {
        let tv = powered_tv();
        assert_eq!(tv.describe(), "Channel 1 📺, Volume 50 🔉, Input: hdmi1 🔌");
    }
}
