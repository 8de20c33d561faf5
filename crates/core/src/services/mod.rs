//! Informational collaborators: weather, news and clock.
//!
//! Each one reports failures as `❌`-prefixed text rather than errors, so
//! the interpreter can hand whatever comes back straight to the model.

pub mod news;
pub mod time;
pub mod weather;

pub use news::{NewsApiService, NewsService};
pub use time::{LocalTimeService, TimeService};
pub use weather::{OpenWeatherMapService, WeatherService};

use std::time::Duration;

/// Budget for every informational HTTP request.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps a transport failure to the sentence shown to the user.
pub(crate) fn describe_transport_error(service: &str, err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("❌ {} request timed out. Please try again", capitalize(service))
    } else if err.is_connect() {
        format!(
            "❌ Cannot connect to {} service. Check your internet connection",
            service
        )
    } else {
        format!("❌ {} service error: {}", capitalize(service), err)
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("weather"), "Weather");
        assert_eq!(capitalize(""), "");
    }
}
