//! Failure taxonomy for registration operations.
//!
//! Transport agnostic; the HTTP adapter maps each kind to a status code and
//! a structured body. Kinds are typed so tests and callers branch on
//! variants, never on message strings.

use std::fmt;

use thiserror::Error;

use crate::domain::authorization::DenialReason;
use crate::domain::class::ClassId;
use crate::domain::user::UserId;

/// The document a failed lookup was after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Class(ClassId),
    User(UserId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(id) => write!(f, "class {id}"),
            Self::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Outcome classification for every registrar operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Caller-fixable input problem; nothing was written.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The authorization gate denied the operation; nothing was written.
    #[error("{0}")]
    Unauthorized(DenialReason),

    /// The target document is absent; nothing was written.
    #[error("{resource} not found")]
    NotFound { resource: Resource },

    /// The class write committed but the user back-reference did not. The
    /// named class is discoverable and the missing reference retryable.
    #[error("class {class_id} committed without a back-reference on user {user_id}")]
    PartialFailure { class_id: ClassId, user_id: UserId },

    /// Repository fault; no assumption about state.
    #[error("storage fault: {message}")]
    Unexpected { message: String },
}

impl RegistrationError {
    /// Convenience constructor for [`RegistrationError::InvalidRequest`].
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`RegistrationError::Unexpected`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Convenience constructor for a missing class.
    pub fn class_not_found(id: ClassId) -> Self {
        Self::NotFound {
            resource: Resource::Class(id),
        }
    }

    /// Convenience constructor for a missing user.
    pub fn user_not_found(id: UserId) -> Self {
        Self::NotFound {
            resource: Resource::User(id),
        }
    }
}
