use chrono::{DateTime, Local, TimeZone, Timelike};
use std::fmt::Display;

/// Source of the current wall-clock time, pre-formatted for the user.
#[cfg_attr(test, mockall::automock)]
pub trait TimeService: Send + Sync {
    fn current_time(&self) -> String;
}

/// `TimeService` reading the host's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTimeService;

impl TimeService for LocalTimeService {
    fn current_time(&self) -> String {
        format_time(&Local::now())
    }
}

fn time_of_day_emoji(hour: u32) -> &'static str {
    match hour {
        6..=11 => "🌅",
        12..=16 => "☀️",
        17..=20 => "🌇",
        _ => "🌙",
    }
}

pub fn format_time<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "🕒 Current time: {} (UTC{}) {}",
        now.format("%A, %B %d, %Y at %I:%M %p"),
        now.format("%:z"),
        time_of_day_emoji(now.hour())
    )
}
