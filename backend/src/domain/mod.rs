//! Domain primitives, the authorization gate, and the registration service.
//!
//! Types here are transport agnostic. Inbound adapters translate them to
//! HTTP; outbound adapters persist them behind the ports in
//! [`ports`](crate::domain::ports).

pub mod auth;
pub mod authorization;
pub mod class;
pub mod error;
pub mod ports;
pub mod principal;
pub mod registration;
pub mod user;

pub use self::auth::{Credentials, CredentialsValidationError, PasswordDigest};
pub use self::authorization::{
    authorize, CallerProfile, ClassAction, Decision, DenialReason,
};
pub use self::class::{Class, ClassId, ClassSpec, ClassSpecValidationError};
pub use self::error::{RegistrationError, Resource};
pub use self::principal::Principal;
pub use self::registration::ClassRegistrationService;
pub use self::user::{Role, User, UserDraft, UserId, Username, UsernameValidationError};
