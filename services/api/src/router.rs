//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        CommandRequest, CommandResponse, ConfigurationResponse, DeviceCountsResponse,
        DeviceStatusResponse, DeviceView, DevicesResponse, ErrorResponse, HealthResponse,
        ServiceTestResponse, SystemStatusResponse, ToggleResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::process_command,
        handlers::list_devices,
        handlers::device_status,
        handlers::toggle_device,
        handlers::system_status,
        handlers::test_services,
    ),
    components(
        schemas(
            HealthResponse, CommandRequest, CommandResponse, DeviceView, DevicesResponse,
            DeviceStatusResponse, ToggleResponse, SystemStatusResponse, DeviceCountsResponse,
            ConfigurationResponse, ServiceTestResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Smart Home API", description = "Multilingual smart home control")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::health))
        .route("/api/command", post(handlers::process_command))
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/devices/{id}/status", get(handlers::device_status))
        .route("/api/devices/{id}/toggle", post(handlers::toggle_device))
        .route("/api/status", get(handlers::system_status))
        .route("/api/services/test", get(handlers::test_services))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
