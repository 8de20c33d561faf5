//! Smart Home API Library Crate
//!
//! This library contains the HTTP surface of the smart home assistant: the
//! application state, API models, handlers, and routing. The `api` binary is
//! a thin wrapper around this library.

pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
