use axum::{
    response::{IntoResponse, Response, Json},
    http::StatusCode,
};
use serde_json::json;
use crate::errors::{AppError, AutomationError};

// Converts AppError into a JSON error body with a matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Automation(err) => automation_status(err),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn automation_status(err: &AutomationError) -> StatusCode {
    match err {
        AutomationError::ImageNotFound(_) => StatusCode::NOT_FOUND,
        AutomationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
