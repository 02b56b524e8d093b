//! Session principal plumbing for HTTP handlers.
//!
//! Wraps the Actix session so handlers deal in [`Principal`] values rather
//! than raw cookie reads. Issuance happens at login; every other handler
//! only ever reads.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Principal, RegistrationError};

pub(crate) const PRINCIPAL_KEY: &str = "principal";

/// Newtype wrapper exposing principal-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated principal in the session cookie.
    pub fn persist_principal(
        &self,
        principal: &Principal,
    ) -> Result<(), RegistrationError> {
        self.0.insert(PRINCIPAL_KEY, principal).map_err(|error| {
            RegistrationError::unexpected(format!("failed to persist session: {error}"))
        })
    }

    /// The caller's principal, when a readable session accompanies the
    /// request. An unreadable or tampered cookie reads as anonymous.
    pub fn principal(&self) -> Option<Principal> {
        match self.0.get::<Principal>(PRINCIPAL_KEY) {
            Ok(principal) => principal,
            Err(error) => {
                warn!(%error, "unreadable principal in session cookie");
                None
            }
        }
    }

    /// Drop the session entirely.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
