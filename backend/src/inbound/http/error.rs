//! HTTP adapter mapping for registration errors.
//!
//! Keeps the domain taxonomy HTTP-agnostic while giving every failure a
//! consistent JSON body: a machine-checkable `code`, a human-readable
//! `message`, and structured `details` where a kind carries data. Storage
//! fault text never reaches a client.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::domain::{DenialReason, RegistrationError};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, RegistrationError>;

/// Wire shape of every failure response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-checkable failure kind.
    #[schema(value_type = String)]
    pub code: &'static str,
    /// Human-readable reason.
    pub message: String,
    /// Structured payload for kinds that carry data.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

fn status_for(error: &RegistrationError) -> StatusCode {
    match error {
        RegistrationError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        RegistrationError::Unauthorized(DenialReason::Unauthenticated) => {
            StatusCode::UNAUTHORIZED
        }
        RegistrationError::Unauthorized(_) => StatusCode::FORBIDDEN,
        RegistrationError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistrationError::PartialFailure { .. }
        | RegistrationError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_for(error: &RegistrationError) -> ErrorBody {
    match error {
        RegistrationError::InvalidRequest { reason } => ErrorBody {
            code: "invalid_request",
            message: reason.clone(),
            details: None,
        },
        RegistrationError::Unauthorized(reason) => ErrorBody {
            code: "unauthorized",
            message: reason.to_string(),
            details: Some(json!({ "reason": reason })),
        },
        RegistrationError::NotFound { resource } => ErrorBody {
            code: "not_found",
            message: format!("{resource} not found"),
            details: None,
        },
        RegistrationError::PartialFailure { class_id, user_id } => ErrorBody {
            code: "partial_failure",
            message: format!(
                "class {class_id} was written but its reference on user {user_id} was not"
            ),
            details: Some(json!({ "classId": class_id, "userId": user_id })),
        },
        RegistrationError::Unexpected { message } => {
            error!(%message, "storage fault reached the HTTP boundary");
            ErrorBody {
                code: "unexpected",
                message: "the server experienced an issue, please try again later"
                    .to_owned(),
                details: None,
            }
        }
    }
}

impl ResponseError for RegistrationError {
    fn status_code(&self) -> StatusCode {
        status_for(self)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(body_for(self))
    }
}
