use super::{HTTP_TIMEOUT, describe_transport_error};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info};

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current-conditions lookup for a city.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Human-readable report, or a `❌` sentence on failure.
    async fn get_weather(&self, city: &str) -> String;
}

/// `WeatherService` backed by the OpenWeatherMap current-weather endpoint.
pub struct OpenWeatherMapService {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    id: u32,
    description: String,
}

impl OpenWeatherMapService {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        info!("Weather service initialized");
        Ok(Self {
            http,
            api_key: api_key.into(),
            api_url: OPENWEATHER_URL.to_string(),
        })
    }

    async fn fetch(&self, city: &str) -> Result<String, reqwest::Error> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let message = match response.status() {
            StatusCode::OK => {
                let body: serde_json::Value = response.json().await?;
                format_weather(&body, city)
            }
            StatusCode::UNAUTHORIZED => {
                "❌ Invalid weather API key. Please check your WEATHER_API_KEY".to_string()
            }
            StatusCode::NOT_FOUND => {
                format!("❌ City '{}' not found. Please check the spelling", city)
            }
            other => format!("❌ Weather service error (Code: {})", other.as_u16()),
        };
        Ok(message)
    }
}

#[async_trait]
impl WeatherService for OpenWeatherMapService {
    async fn get_weather(&self, city: &str) -> String {
        self.fetch(city).await.unwrap_or_else(|e| {
            error!(error = %e, "Weather API error");
            describe_transport_error("weather", &e)
        })
    }
}

fn weather_emoji(condition_id: u32) -> &'static str {
    match condition_id {
        0..=299 => "⛈️",
        300..=399 => "🌦️",
        400..=599 => "🌧️",
        600..=699 => "❄️",
        700..=799 => "🌫️",
        800 => "☀️",
        _ => "☁️",
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(super::capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders an OpenWeatherMap payload as a short multi-line report.
fn format_weather(body: &serde_json::Value, city: &str) -> String {
    let parsed: WeatherResponse = match serde_json::from_value(body.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "Error formatting weather data");
            return "❌ Error formatting weather data".to_string();
        }
    };
    let Some(condition) = parsed.weather.first() else {
        return "❌ Error formatting weather data".to_string();
    };

    format!(
        "{} Weather in {}:\n🌡️ Temperature: {:.1}°C (feels like {:.1}°C)\n🌤️ Conditions: {}\n💧 Humidity: {}%",
        weather_emoji(condition.id),
        city,
        parsed.main.temp,
        parsed.main.feels_like,
        title_case(&condition.description),
        parsed.main.humidity.round() as i64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_weather() {
        let body = json!({
            "main": {"temp": 25.34, "feels_like": 24.96, "humidity": 40},
            "weather": [{"id": 800, "description": "clear sky"}]
        });
        assert_eq!(
            format_weather(&body, "Tehran"),
            "☀️ Weather in Tehran:\n🌡️ Temperature: 25.3°C (feels like 25.0°C)\n🌤️ Conditions: Clear Sky\n💧 Humidity: 40%"
        );
    }

    #[test]
    fn test_format_weather_rejects_malformed_payload() {
        let body = json!({"main": {"temp": 20.0}});
        assert_eq!(format_weather(&body, "Tehran"), "❌ Error formatting weather data");
    }

    #[test]
    fn test_weather_emoji_ranges() {
        assert_eq!(weather_emoji(211), "⛈️");
        assert_eq!(weather_emoji(501), "🌧️");
        assert_eq!(weather_emoji(601), "❄️");
        assert_eq!(weather_emoji(804), "☁️");
    }
}
