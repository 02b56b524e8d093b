//! Port for class document persistence.

use async_trait::async_trait;

use crate::domain::class::{Class, ClassId};

/// Persistence errors raised by class repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassRepositoryError {
    /// Store connection could not be established.
    #[error("class store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("class store query failed: {message}")]
    Query { message: String },
    /// The call exceeded its deadline.
    #[error("class store call timed out: {message}")]
    Timeout { message: String },
}

impl ClassRepositoryError {
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
}

/// Single-document CRUD over class documents.
///
/// Adapters bound every call; a blown deadline surfaces as
/// [`ClassRepositoryError::Timeout`], never as a hang.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Fetch a class by id.
    async fn find_by_id(&self, id: &ClassId) -> Result<Option<Class>, ClassRepositoryError>;

    /// All classes whose open flag is set, from a single read. Order is
    /// unspecified but stable within one read.
    async fn find_all_open(&self) -> Result<Vec<Class>, ClassRepositoryError>;

    /// Insert a new class document.
    async fn save(&self, class: &Class) -> Result<(), ClassRepositoryError>;

    /// Replace an existing class document. Returns false when no stored
    /// document matched the id.
    async fn update(&self, class: &Class) -> Result<bool, ClassRepositoryError>;

    /// Remove a class document. Returns false when no stored document
    /// matched the id.
    async fn delete_by_id(&self, id: &ClassId) -> Result<bool, ClassRepositoryError>;
}
