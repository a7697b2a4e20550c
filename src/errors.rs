use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use std::fmt;

/// Extra fields merged into the error envelope next to `success` and `error`.
pub type Diagnostics = Map<String, Value>;

/// Application-specific error types.
///
/// Every variant renders as `{ "success": false, "error": ..., ...diagnostics }`.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed input. No outbound call was made.
    Validation(String),
    /// HTTP method outside the handler's dispatch set.
    UnsupportedMethod(String),
    /// Request body over the configured size limit.
    PayloadTooLarge(String),
    /// The outbound call did not complete (connection error, timeout).
    Transport(String),
    /// The upstream body could not be decoded as JSON.
    Decode {
        status: StatusCode,
        message: String,
        diagnostics: Diagnostics,
    },
    /// The upstream answered with a failure status or a business refusal.
    UpstreamRejection {
        status: StatusCode,
        message: String,
        diagnostics: Diagnostics,
    },
    /// The upstream answered successfully but the expected payload is absent.
    IncompleteResult {
        status: StatusCode,
        message: String,
        diagnostics: Diagnostics,
    },
    /// Unexpected failure.
    Internal { message: String, details: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Decode { status, .. }
            | AppError::UpstreamRejection { status, .. }
            | AppError::IncompleteResult { status, .. } => *status,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::UnsupportedMethod(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Transport(msg) => msg,
            AppError::Decode { message, .. }
            | AppError::UpstreamRejection { message, .. }
            | AppError::IncompleteResult { message, .. }
            | AppError::Internal { message, .. } => message,
        }
    }

    /// Builds the JSON envelope returned to the caller.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(self.message().to_string()));

        match self {
            AppError::Decode { diagnostics, .. }
            | AppError::UpstreamRejection { diagnostics, .. }
            | AppError::IncompleteResult { diagnostics, .. } => {
                for (key, value) in diagnostics {
                    body.insert(key.clone(), value.clone());
                }
            }
            AppError::Internal { details, .. } => {
                body.insert("details".to_string(), Value::String(details.clone()));
            }
            _ => {}
        }

        Value::Object(body)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::UnsupportedMethod(msg) => write!(f, "Unsupported method: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Decode {
                status, message, ..
            } => write!(f, "Decode error ({}): {}", status, message),
            AppError::UpstreamRejection {
                status, message, ..
            } => write!(f, "Upstream rejection ({}): {}", status, message),
            AppError::IncompleteResult {
                status, message, ..
            } => write!(f, "Incomplete result ({}): {}", status, message),
            AppError::Internal { message, details } => {
                write!(f, "Internal error: {}: {}", message, details)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to its status code and JSON envelope, logging by severity.
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Validation(_)
            | AppError::UnsupportedMethod(_)
            | AppError::PayloadTooLarge(_) => {
                tracing::debug!("Rejected request: {}", self);
            }
            AppError::IncompleteResult { .. } | AppError::UpstreamRejection { .. } => {
                tracing::warn!("{}", self);
            }
            AppError::Transport(_) | AppError::Decode { .. } | AppError::Internal { .. } => {
                tracing::error!("{}", self);
            }
        }

        (status, Json(self.to_body())).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into a transport failure.
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(format!("Erro na requisição: {}", err))
    }
}

/// Maps an upstream status code onto ours, falling back to 502 for codes axum
/// cannot represent.
pub fn passthrough_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}
