use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Subscription inactive: {0}")]
    SubscriptionInactive(String),
    #[error("Platform quota exceeded ({current}/{limit})")]
    QuotaExceeded { current: i64, limit: i32 },
    #[error("No destination webhook configured for this account")]
    WebhookNotConfigured,
    #[error("Remote session service unavailable: {0}")]
    RemoteServiceUnavailable(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SubscriptionInactive(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::QuotaExceeded { current, limit } => (
                StatusCode::FORBIDDEN,
                format!("WhatsApp session limit reached ({}/{}). Remove a connection or ask an administrator to raise the limit.", current, limit),
            ),
            AppError::WebhookNotConfigured => (
                StatusCode::BAD_REQUEST,
                "No webhook URL configured. Set a destination webhook before connecting WhatsApp.".to_string(),
            ),
            AppError::RemoteServiceUnavailable(msg) => {
                error!("Remote session service failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "WhatsApp session service is unavailable. Please try again later.".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
