use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::leave_application::{LeaveCategory, LeaveStatus};

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("You are not eligible for {0} leave. Contact SuperAdmin.")]
    NotEligible(LeaveCategory),

    #[error("No leave credit found for user {user_id} in {year}. Please contact admin.")]
    CreditMissing { user_id: u64, year: i32 },

    #[error("Leave credits for the year {0} have already been created")]
    AlreadyProvisioned(i32),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Leave application {id} already {status}")]
    InvalidTransition { id: u64, status: LeaveStatus },

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LeaveError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LeaveError::InvalidRequest(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LeaveError::InvalidRequest(_) => "invalid_request",
            LeaveError::NotEligible(_) => "not_eligible",
            LeaveError::CreditMissing { .. } => "credit_missing",
            LeaveError::AlreadyProvisioned(_) => "already_provisioned",
            LeaveError::NotFound(_) => "not_found",
            LeaveError::InvalidTransition { .. } => "invalid_transition",
            LeaveError::Forbidden(_) => "forbidden",
            LeaveError::Storage(_) => "storage_failure",
        }
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotEligible(_) | LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::CreditMissing { .. } | LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::AlreadyProvisioned(_) | LeaveError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}
