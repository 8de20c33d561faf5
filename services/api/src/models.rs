//! API Models
//!
//! Request and response bodies of the HTTP API. They mirror the core's
//! values so the wire format is owned here and documented with `utoipa`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smarthome_core::assistant::SystemStatus;
use smarthome_core::devices::DeviceSnapshot;
use smarthome_core::llm_client::Language;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug)]
pub struct HealthResponse {
    #[schema(example = "Smart Home Assistant API")]
    pub message: String,
    #[schema(example = "running")]
    pub status: String,
    pub assistant_ready: bool,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CommandRequest {
    #[schema(example = "Turn on the kitchen lamp")]
    pub command: String,
    /// Informational hint (`auto`, `english`, `persian`); the language is
    /// always detected from the command text.
    #[schema(example = "auto")]
    pub language: Option<String>,
    /// Conversation to continue; omitted means the shared default session.
    pub session_id: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CommandResponse {
    pub response: String,
    pub success: bool,
    #[schema(example = "english")]
    pub language_detected: Option<String>,
}

pub fn language_label(language: Language) -> &'static str {
    match language {
        Language::English => "english",
        Language::Persian => "persian",
    }
}

/// One device with the state fields of its kind.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct DeviceView {
    #[schema(example = "kitchen_lamp")]
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(rename = "type")]
    #[schema(example = "lamp")]
    pub device_type: String,
    pub power: bool,
    pub online: bool,
    #[schema(value_type = String, format = DateTime)]
    pub last_updated: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

fn int_field(state: &Map<String, Value>, key: &str) -> Option<i64> {
    state.get(key).and_then(Value::as_i64)
}

fn text_field(state: &Map<String, Value>, key: &str) -> Option<String> {
    state.get(key).and_then(Value::as_str).map(str::to_string)
}

impl From<DeviceSnapshot> for DeviceView {
    fn from(snapshot: DeviceSnapshot) -> Self {
        let state = &snapshot.state;
        Self {
            brightness: int_field(state, "brightness"),
            color: text_field(state, "color"),
            temperature: int_field(state, "temperature"),
            mode: text_field(state, "mode"),
            fan_speed: text_field(state, "fan_speed"),
            channel: int_field(state, "channel"),
            volume: int_field(state, "volume"),
            input: text_field(state, "input"),
            device_type: snapshot.device_type.as_str().to_string(),
            id: snapshot.id,
            name: snapshot.name,
            location: snapshot.location,
            power: snapshot.power,
            online: snapshot.online,
            last_updated: snapshot.last_updated,
        }
    }
}

/// All devices grouped by kind.
#[derive(Serialize, ToSchema, Debug, Default)]
pub struct DevicesResponse {
    pub lamps: Vec<DeviceView>,
    pub acs: Vec<DeviceView>,
    pub tvs: Vec<DeviceView>,
}

impl FromIterator<DeviceSnapshot> for DevicesResponse {
    fn from_iter<I: IntoIterator<Item = DeviceSnapshot>>(iter: I) -> Self {
        let mut grouped = DevicesResponse::default();
        for snapshot in iter {
            let view = DeviceView::from(snapshot);
            match view.device_type.as_str() {
                "lamp" => grouped.lamps.push(view),
                "ac" => grouped.acs.push(view),
                _ => grouped.tvs.push(view),
            }
        }
        grouped
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DeviceStatusResponse {
    pub device_id: String,
    #[schema(example = "📊 Kitchen Lamp (Kitchen): OFF 🔴")]
    pub status: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct DeviceCountsResponse {
    pub lamps: usize,
    pub acs: usize,
    pub tvs: usize,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ConfigurationResponse {
    pub default_city: String,
    pub model: String,
    pub memory_capacity: usize,
    pub log_level: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SystemStatusResponse {
    pub total_devices: usize,
    pub powered_on: usize,
    pub device_types: DeviceCountsResponse,
    /// Service name → `✅ Connected` / `❌ Not configured` / `✅ Available`.
    pub services: BTreeMap<String, String>,
    pub languages: Vec<String>,
    pub configuration: ConfigurationResponse,
}

impl SystemStatusResponse {
    pub fn new(status: SystemStatus, log_level: String) -> Self {
        let services = BTreeMap::from([
            ("llm".to_string(), status.services.llm),
            ("weather".to_string(), status.services.weather),
            ("news".to_string(), status.services.news),
            ("persian".to_string(), status.services.persian),
            ("time".to_string(), status.services.time),
        ]);
        Self {
            total_devices: status.total_devices,
            powered_on: status.powered_on,
            device_types: DeviceCountsResponse {
                lamps: status.device_types.lamps,
                acs: status.device_types.acs,
                tvs: status.device_types.tvs,
            },
            services,
            languages: status.languages,
            configuration: ConfigurationResponse {
                default_city: status.configuration.default_city,
                model: status.configuration.model,
                memory_capacity: status.configuration.memory_capacity,
                log_level,
            },
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ServiceTestResponse {
    /// Service name → `✅ Working` or the failure sentence.
    pub services: BTreeMap<String, String>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
