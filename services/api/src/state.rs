//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the assistant and
//! the loaded configuration for every handler.

use smarthome_core::{Config, SmartHomeAssistant};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<SmartHomeAssistant>,
    pub config: Arc<Config>,
}
