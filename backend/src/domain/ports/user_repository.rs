//! Port for user document persistence.

use async_trait::async_trait;

use crate::domain::user::{User, UserId, Username};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Store connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// The call exceeded its deadline.
    #[error("user store call timed out: {message}")]
    Timeout { message: String },
    /// A unique attribute (the username) is already indexed.
    #[error("user store conflict: {message}")]
    Conflict { message: String },
}

impl UserRepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Single-document CRUD over user documents.
///
/// Adapters bound every call; a blown deadline surfaces as
/// [`UserRepositoryError::Timeout`], never as a hang.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by surrogate id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by its unique username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a new user document. Fails with
    /// [`UserRepositoryError::Conflict`] when the username is taken.
    async fn save(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Replace an existing user document. Returns false when no stored
    /// document matched the id.
    async fn update(&self, user: &User) -> Result<bool, UserRepositoryError>;
}
