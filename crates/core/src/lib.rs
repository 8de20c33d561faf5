pub mod assistant;
pub mod config;
pub mod devices;
pub mod functions;
pub mod interpreter;
pub mod language;
pub mod llm_client;
pub mod localizer;
pub mod memory;
pub mod normalizer;
pub mod services;

pub use assistant::SmartHomeAssistant;
pub use config::{Config, ConfigError, HomeConfig, LlmSettings};
pub use llm_client::{LLMClient, Language, OpenAICompatibleClient};

/// Prefix of every user-facing error sentence produced by this crate.
///
/// Failures inside a command are reported as text starting with this marker
/// rather than as `Err` values, so consumers can display any reply verbatim
/// and still tell whether it succeeded.
pub const ERROR_MARKER: &str = "❌";

/// Whether `reply` is an error sentence.
pub fn is_error_reply(reply: &str) -> bool {
    reply.trim_start().starts_with(ERROR_MARKER)
}
