use actix_web::{HttpResponse, http::StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

/// Domain error taxonomy. Every workflow failure is one of these;
/// storage faults are wrapped, never silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Leave dates overlap with existing leave request")]
    Overlap,

    #[error("Insufficient leave balance. Available: {available}, Required: {required}")]
    InsufficientBalance { available: Decimal, required: Decimal },

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    IllegalState(String),

    #[error("Year-end action already processed for year {0}")]
    AlreadyProcessed(i32),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl actix_web::ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidRequest(_) | LeaveError::InsufficientBalance { .. } => {
                StatusCode::BAD_REQUEST
            }
            LeaveError::Overlap
            | LeaveError::InvalidTransition(_)
            | LeaveError::IllegalState(_)
            | LeaveError::AlreadyProcessed(_) => StatusCode::CONFLICT,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let LeaveError::Storage(e) = self {
            tracing::error!(error = %e, "Storage failure");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
