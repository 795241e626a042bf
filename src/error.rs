use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Builds an upstream error from a non-2xx status and the raw response body.
    pub fn upstream(status: u16, body: &str) -> Self {
        AppError::Upstream {
            status,
            message: describe_api_error(status, body),
        }
    }
}

/// Rejected extractors become 400s carrying axum's description of what
/// could not be parsed.
macro_rules! bad_request_from {
    ($($rejection:ty),+) => {
        $(impl From<$rejection> for AppError {
            fn from(rejection: $rejection) -> Self {
                AppError::BadRequest(rejection.body_text())
            }
        })+
    };
}

bad_request_from!(PathRejection, QueryRejection, JsonRejection, MultipartRejection);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream { status, message } => {
                let status = StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, message)
            }
            AppError::Transport(e) => {
                error!("backend transport error: {}", e);
                (StatusCode::BAD_GATEWAY, "Backend unreachable".to_string())
            }
            AppError::Decode(e) => {
                error!("backend decode error: {}", e);
                (StatusCode::BAD_GATEWAY, "Unexpected backend response".to_string())
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

/// Flattens a backend error body into the single line shown to the user.
///
/// `{"detail": ..}` and `{"error": ..}` win outright. Otherwise every
/// field-keyed entry is rendered as `key: msg1, msg2`, in the order the
/// server sent them, separated by a space.
pub fn describe_api_error(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(Value::Object(map)) = &parsed {
        for key in ["detail", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }

        if !map.is_empty() {
            return map
                .iter()
                .map(|(key, value)| format!("{}: {}", key, flatten_messages(value)))
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    if let Some(value @ Value::Array(items)) = &parsed {
        if !items.is_empty() {
            return flatten_messages(value);
        }
    }

    if status >= 500 {
        "Server error".to_string()
    } else if body.trim().is_empty() || parsed.is_some() {
        format!("Request failed (status {})", status)
    } else {
        format!("Request failed (status {}): {}", status, body.trim())
    }
}

fn flatten_messages(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_messages)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, flatten_messages(value)))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
