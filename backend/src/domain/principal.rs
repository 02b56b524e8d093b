//! Request-scoped identity attached by the session layer.

use serde::{Deserialize, Serialize};

use crate::domain::user::{Role, User, UserId, Username};

/// The authenticated caller as carried in the session cookie.
///
/// Holds identity facts only. Authorization never trusts the role recorded
/// here; the registration service re-reads the caller's stored account so
/// gate decisions see fresh role and ownership data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub username: Username,
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            username: user.username().clone(),
            role: user.role(),
        }
    }
}
