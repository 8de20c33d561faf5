//! Configuration
//!
//! `HomeConfig` is an explicit value handed to the device registry, the
//! interpreter and the assistant at construction time. `Config` is what the
//! binaries load from the environment at startup; it carries a `HomeConfig`
//! plus the credentials and process-level settings.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Settings for the upstream chat-completion provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    /// Model identifier sent with every request.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub api_base: String,
    /// Sampling temperature for the function-selection call.
    pub temperature: f32,
    /// Sampling temperature for the follow-up summary call.
    pub follow_up_temperature: f32,
    pub max_tokens: u32,
    pub follow_up_max_tokens: u32,
    pub translation_max_tokens: u32,
    /// Per-call budget; exceeding it surfaces as an ordinary error.
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            temperature: 0.1,
            follow_up_temperature: 0.3,
            max_tokens: 4000,
            follow_up_max_tokens: 2000,
            translation_max_tokens: 300,
            timeout_secs: 30,
        }
    }
}

/// Static description of the simulated home plus assistant tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeConfig {
    /// Locations that get a lamp.
    pub lamps: Vec<String>,
    /// Locations that get an air conditioner.
    pub acs: Vec<String>,
    /// Locations that get a television.
    pub tvs: Vec<String>,
    pub default_city: String,
    pub default_news_category: String,
    pub llm: LlmSettings,
    /// Maximum number of conversation turns retained per session.
    pub memory_capacity: usize,
    /// Number of most recent turns replayed to the model as context.
    pub context_turns: usize,
    /// Maximum number of conversation sessions kept at once; the least
    /// recently used one is dropped beyond this.
    pub max_sessions: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            lamps: vec![
                "Kitchen".to_string(),
                "Bathroom".to_string(),
                "Room 1".to_string(),
                "Room 2".to_string(),
            ],
            acs: vec!["Room 1".to_string(), "Kitchen".to_string()],
            tvs: vec!["Living Room".to_string()],
            default_city: "Tehran".to_string(),
            default_news_category: "technology".to_string(),
            llm: LlmSettings::default(),
            memory_capacity: 20,
            context_turns: 3,
            max_sessions: 100,
        }
    }
}

impl HomeConfig {
    /// Lower-cased union of every configured location, plus `all`, sorted
    /// so the generated function schema is stable between runs.
    pub fn all_locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self
            .lamps
            .iter()
            .chain(&self.acs)
            .chain(&self.tvs)
            .map(|loc| loc.to_lowercase())
            .chain(std::iter::once("all".to_string()))
            .collect();
        locations.sort();
        locations.dedup();
        locations
    }
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub groq_api_key: String,
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub log_level: Level,
    pub home: HomeConfig,
}

/// Reads an optional key, treating empty values and `.env.example`
/// placeholders (`your_..._here`) as unset.
fn api_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !(v.starts_with("your_") && v.ends_with("_here")))
}

/// Parses a comma-separated list of locations.
fn location_list(name: &str) -> Option<Vec<String>> {
    let raw = std::env::var(name).ok()?;
    let locations: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!locations.is_empty()).then_some(locations)
}

/// Reads a strictly positive integer, or `None` when the variable is unset.
fn positive_number(var: &str, unit: &str) -> Result<Option<u64>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("'{}' is not a positive number of {}", raw, unit),
        )),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let groq_api_key = api_key("GROQ_API_KEY").ok_or_else(|| {
            ConfigError::MissingVar(
                "GROQ_API_KEY (get a free key from https://console.groq.com)".to_string(),
            )
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let mut home = HomeConfig::default();
        if let Some(lamps) = location_list("SMART_HOME_LAMPS") {
            home.lamps = lamps;
        }
        if let Some(acs) = location_list("SMART_HOME_ACS") {
            home.acs = acs;
        }
        if let Some(tvs) = location_list("SMART_HOME_TVS") {
            home.tvs = tvs;
        }
        if let Ok(city) = std::env::var("DEFAULT_CITY") {
            home.default_city = city;
        }
        if let Ok(model) = std::env::var("CHAT_MODEL") {
            home.llm.model = model;
        }
        if let Ok(base) = std::env::var("LLM_BASE_URL") {
            home.llm.api_base = base;
        }
        if let Some(secs) = positive_number("LLM_TIMEOUT_SECS", "seconds")? {
            home.llm.timeout_secs = secs;
        }
        if let Some(sessions) = positive_number("MAX_SESSIONS", "sessions")? {
            home.max_sessions = sessions as usize;
        }

        Ok(Self {
            bind_address,
            groq_api_key,
            weather_api_key: api_key("WEATHER_API_KEY"),
            news_api_key: api_key("NEWS_API_KEY"),
            log_level,
            home,
        })
    }
}
