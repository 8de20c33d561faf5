//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for command
//! processing and device control. It uses `utoipa` doc comments to generate
//! OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use smarthome_core::{is_error_reply, language, memory::DEFAULT_SESSION};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    models::{
        CommandRequest, CommandResponse, DeviceStatusResponse, DevicesResponse, ErrorResponse,
        HealthResponse, ServiceTestResponse, SystemStatusResponse, ToggleResponse,
        language_label,
    },
    state::AppState,
};

/// Errors a handler reports to the client.
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        warn!(%status, %message, "Request rejected");
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Health check.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Smart Home Assistant API".to_string(),
        status: "running".to_string(),
        assistant_ready: true,
    })
}

/// Process a natural-language command in English or Persian.
#[utoipa::path(
    post,
    path = "/api/command",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Command processed", body = CommandResponse),
        (status = 400, description = "Empty command", body = ErrorResponse)
    )
)]
pub async fn process_command(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    if payload.command.trim().is_empty() {
        return Err(ApiError::BadRequest("command must not be empty".to_string()));
    }

    let session = payload.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
    info!(
        command = %payload.command,
        session,
        language_hint = payload.language.as_deref().unwrap_or("auto"),
        "Processing command"
    );

    let response = state
        .assistant
        .process_command_in_session(session, &payload.command)
        .await;
    let detected = language::detect(&payload.command);

    Ok(Json(CommandResponse {
        success: !is_error_reply(&response),
        response,
        language_detected: Some(language_label(detected).to_string()),
    }))
}

/// Get all devices grouped by kind.
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "All devices", body = DevicesResponse)
    )
)]
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<DevicesResponse> {
    Json(state.assistant.all_devices().await.into_iter().collect())
}

/// Get the formatted status of one device.
#[utoipa::path(
    get,
    path = "/api/devices/{id}/status",
    responses(
        (status = 200, description = "Device status", body = DeviceStatusResponse),
        (status = 404, description = "Device not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Device identifier, e.g. kitchen_lamp")
    )
)]
pub async fn device_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceStatusResponse>, ApiError> {
    let status = state.assistant.device_status(&id).await;
    if is_error_reply(&status) {
        return Err(ApiError::NotFound(status));
    }
    Ok(Json(DeviceStatusResponse {
        device_id: id,
        status,
    }))
}

/// Toggle the power of one device.
#[utoipa::path(
    post,
    path = "/api/devices/{id}/toggle",
    responses(
        (status = 200, description = "Toggle outcome", body = ToggleResponse)
    ),
    params(
        ("id" = String, Path, description = "Device identifier, e.g. kitchen_lamp")
    )
)]
pub async fn toggle_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ToggleResponse> {
    let response = match state.assistant.toggle_device(&id).await {
        Ok(message) => {
            info!(device = %id, %message, "Toggled device");
            ToggleResponse {
                success: true,
                message,
            }
        }
        Err(e) => ToggleResponse {
            success: false,
            message: e.to_string(),
        },
    };
    Json(response)
}

/// Get the overall system status.
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "System status", body = SystemStatusResponse)
    )
)]
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatusResponse> {
    let status = state.assistant.system_status().await;
    Json(SystemStatusResponse::new(
        status,
        state.config.log_level.to_string(),
    ))
}

/// Exercise every collaborator and report the outcome per service.
#[utoipa::path(
    get,
    path = "/api/services/test",
    responses(
        (status = 200, description = "Service test results", body = ServiceTestResponse)
    )
)]
pub async fn test_services(State(state): State<Arc<AppState>>) -> Json<ServiceTestResponse> {
    Json(ServiceTestResponse {
        services: state.assistant.test_services().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use smarthome_core::llm_client::{ChatCompletion, ChatRequest, LLMClient, Language};
    use smarthome_core::services::LocalTimeService;
    use smarthome_core::{Config, HomeConfig, SmartHomeAssistant};
    use tracing::Level;

    /// Replies with fixed text and translates by tagging the target language.
    struct CannedClient;

    #[async_trait]
    impl LLMClient for CannedClient {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatCompletion> {
            Ok(ChatCompletion {
                content: Some("All set!".to_string()),
                function_call: None,
            })
        }

        async fn translate(&self, text: &str, target: Language) -> Result<String> {
            Ok(format!("[{}] {}", target.code(), text))
        }
    }

    fn app_state() -> Arc<AppState> {
        let home = HomeConfig::default();
        let assistant = SmartHomeAssistant::new(
            home.clone(),
            Arc::new(CannedClient),
            None,
            None,
            Arc::new(LocalTimeService),
        );
        let config = Config {
            bind_address: "127.0.0.1:8000".parse().unwrap(),
            groq_api_key: "gsk_test".to_string(),
            weather_api_key: None,
            news_api_key: None,
            log_level: Level::INFO,
            home,
        };
        Arc::new(AppState {
            assistant: Arc::new(assistant),
            config: Arc::new(config),
        })
    }

    #[tokio::test]
    async fn test_process_english_command() {
        let Json(response) = process_command(
            State(app_state()),
            Json(CommandRequest {
                command: "hello".to_string(),
                language: None,
                session_id: Some("web".to_string()),
            }),
        )
        .await
        .ok()
        .unwrap();

        assert_eq!(response.response, "All set!");
        assert!(response.success);
        assert_eq!(response.language_detected.as_deref(), Some("english"));
    }

    #[tokio::test]
    async fn test_process_persian_command() {
        let Json(response) = process_command(
            State(app_state()),
            Json(CommandRequest {
                command: "ساعت چنده".to_string(),
                language: Some("auto".to_string()),
                session_id: None,
            }),
        )
        .await
        .ok()
        .unwrap();

        assert_eq!(response.response, "[fa] All set!");
        assert_eq!(response.language_detected.as_deref(), Some("persian"));
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let result = process_command(
            State(app_state()),
            Json(CommandRequest {
                command: "  ".to_string(),
                language: None,
                session_id: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_toggle_and_status() {
        let state = app_state();

        let Json(toggled) = toggle_device(State(state.clone()), Path("kitchen_lamp".to_string())).await;
        assert!(toggled.success);
        assert_eq!(toggled.message, "✅ Kitchen Lamp turned on");

        let Json(status) = device_status(State(state.clone()), Path("kitchen_lamp".to_string()))
            .await
            .ok()
            .unwrap();
        assert!(status.status.contains("ON 🟢"));

        let Json(missing) = toggle_device(State(state.clone()), Path("garage".to_string())).await;
        assert!(!missing.success);
        assert_eq!(missing.message, "❌ Device 'garage' not found");

        let result = device_status(State(state), Path("garage".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_devices_and_system_status() {
        let state = app_state();

        let Json(devices) = list_devices(State(state.clone())).await;
        assert_eq!(devices.lamps.len(), 4);

        let Json(status) = system_status(State(state)).await;
        assert_eq!(status.total_devices, 7);
        assert_eq!(status.powered_on, 0);
        assert_eq!(status.services["weather"], "❌ Not configured");
        assert_eq!(status.configuration.log_level, "INFO");
    }
}
