//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on the domain ports and stay testable without real I/O.

use std::sync::Arc;

use crate::domain::ports::{ClassRepository, UserRepository};
use crate::domain::ClassRegistrationService;

/// Registration service specialised over dynamic port objects.
pub type DynClassRegistrationService =
    ClassRegistrationService<dyn ClassRepository, dyn UserRepository>;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Aggregate manager; the only writer of class/user cross-references.
    pub registration: DynClassRegistrationService,
    /// Direct user persistence for account registration and login.
    pub users: Arc<dyn UserRepository>,
}

impl HttpState {
    /// Assemble handler state from port implementations.
    pub fn new(classes: Arc<dyn ClassRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            registration: ClassRegistrationService::new(classes, Arc::clone(&users)),
            users,
        }
    }
}
