//! Function Schema and Dispatch
//!
//! The closed set of functions advertised to the model, and the [`Toolbox`]
//! that executes them against the device registry and the informational
//! collaborators. Execution never fails: every problem becomes a `❌` string
//! that is handed back to the model or the user.

use crate::config::HomeConfig;
use crate::devices::{Action, DeviceRegistry};
use crate::llm_client::FunctionDefinition;
use crate::services::news::NEWS_CATEGORIES;
use crate::services::{NewsService, TimeService, WeatherService};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Fallback sentences when an optional collaborator is not configured.
pub const WEATHER_UNAVAILABLE: &str = "❌ Weather service not available";
pub const NEWS_UNAVAILABLE: &str = "❌ News service not available";

/// The five callable functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    ControlDevice,
    GetWeather,
    GetNews,
    GetTime,
    GetDeviceStatus,
}

impl FunctionName {
    pub const ALL: [FunctionName; 5] = [
        FunctionName::ControlDevice,
        FunctionName::GetWeather,
        FunctionName::GetNews,
        FunctionName::GetTime,
        FunctionName::GetDeviceStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::ControlDevice => "control_device",
            FunctionName::GetWeather => "get_weather",
            FunctionName::GetNews => "get_news",
            FunctionName::GetTime => "get_time",
            FunctionName::GetDeviceStatus => "get_device_status",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FunctionName::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| format!("❌ Unknown function: {}", s))
    }
}

/// Builds the schemas for all five functions. Location values are limited
/// to the configured locations.
pub fn function_definitions(config: &HomeConfig) -> Vec<FunctionDefinition> {
    let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
    vec![
        FunctionDefinition {
            name: FunctionName::ControlDevice.to_string(),
            description: "Control smart home devices".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "device_type": {
                        "type": "string",
                        "enum": ["lamp", "ac", "tv", "all_lamps", "all_devices"]
                    },
                    "location": {
                        "type": "string",
                        "enum": config.all_locations()
                    },
                    "action": {
                        "type": "string",
                        "enum": actions
                    },
                    "value": {"type": "string"}
                },
                "required": ["device_type", "action"]
            }),
        },
        FunctionDefinition {
            name: FunctionName::GetWeather.to_string(),
            description: "Get current weather information".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"city": {"type": "string"}}
            }),
        },
        FunctionDefinition {
            name: FunctionName::GetNews.to_string(),
            description: "Get latest news headlines".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "category": {"type": "string", "enum": NEWS_CATEGORIES}
                }
            }),
        },
        FunctionDefinition {
            name: FunctionName::GetTime.to_string(),
            description: "Get current date and time".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        },
        FunctionDefinition {
            name: FunctionName::GetDeviceStatus.to_string(),
            description: "Get device status".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"device": {"type": "string"}}
            }),
        },
    ]
}

/// Reads an optional string argument. Numbers and booleans are accepted and
/// stringified; `null` and empty strings count as absent.
fn string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_arg(args: &Map<String, Value>, key: &str) -> Result<String, String> {
    string_arg(args, key).ok_or_else(|| format!("❌ Missing required argument '{}'", key))
}

/// Everything a function may act on.
#[derive(Clone)]
pub struct Toolbox {
    pub devices: Arc<Mutex<DeviceRegistry>>,
    pub weather: Option<Arc<dyn WeatherService>>,
    pub news: Option<Arc<dyn NewsService>>,
    pub clock: Arc<dyn TimeService>,
    pub default_city: String,
    pub default_news_category: String,
}

impl Toolbox {
    /// Executes `name` with `args` and returns the result text.
    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> String {
        let function = match name.parse::<FunctionName>() {
            Ok(function) => function,
            Err(message) => {
                warn!(function = name, "Model requested an unknown function");
                return message;
            }
        };
        info!(%function, ?args, "Executing function");

        match function {
            FunctionName::ControlDevice => self.control_device(args).await,
            FunctionName::GetWeather => {
                let city = string_arg(args, "city").unwrap_or_else(|| self.default_city.clone());
                match &self.weather {
                    Some(weather) => weather.get_weather(&city).await,
                    None => WEATHER_UNAVAILABLE.to_string(),
                }
            }
            FunctionName::GetNews => {
                let category = string_arg(args, "category")
                    .unwrap_or_else(|| self.default_news_category.clone());
                match &self.news {
                    Some(news) => news.get_news(&category).await,
                    None => NEWS_UNAVAILABLE.to_string(),
                }
            }
            FunctionName::GetTime => self.clock.current_time(),
            FunctionName::GetDeviceStatus => {
                let device = string_arg(args, "device").unwrap_or_else(|| "all".to_string());
                self.devices.lock().await.status(&device)
            }
        }
    }

    async fn control_device(&self, args: &Map<String, Value>) -> String {
        let (device_type, action) = match (
            required_arg(args, "device_type"),
            required_arg(args, "action"),
        ) {
            (Ok(device_type), Ok(action)) => (device_type, action),
            (Err(message), _) | (_, Err(message)) => return message,
        };
        let location = string_arg(args, "location");
        let value = string_arg(args, "value");

        self.devices.lock().await.control(
            &device_type,
            &action,
            location.as_deref(),
            value.as_deref(),
        )
    }
}
