//! The authorization gate.
//!
//! A pure decision function consulted before every registrar operation.
//! Ownership ("the caller teaches or holds this class") is a membership test
//! on the caller's denormalized owned-class set, never a read of the class
//! itself, so the gate stays free of repository dependencies and its
//! correctness rides on the cross-reference invariant the registration
//! service protects.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::domain::class::ClassId;
use crate::domain::user::{Role, User, UserId};

/// Authorization inputs resolved from the caller's stored account.
#[derive(Debug, Clone)]
pub struct CallerProfile {
    pub id: UserId,
    pub role: Role,
    pub classes: BTreeSet<ClassId>,
}

impl From<&User> for CallerProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            role: user.role(),
            classes: user.classes().clone(),
        }
    }
}

/// Operation under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAction {
    /// Create a new class owned by the caller.
    Create,
    /// Replace the attributes of an existing class.
    Update { target: ClassId },
    /// Remove an existing class.
    Delete { target: ClassId },
    /// Enroll the caller in a class.
    Enroll { target: ClassId },
    /// Withdraw the caller from a class it holds.
    Withdraw { target: ClassId },
    /// Read the classes referenced by a user's account.
    ReadOwned { owner: UserId },
    /// Read the public open-classes listing.
    ListOpen,
    /// Drop a user's references to classes that no longer exist.
    PruneRefs { owner: UserId },
}

/// Why the gate denied an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No authenticated principal accompanied the request.
    Unauthenticated,
    /// The operation needs a teaching role.
    NotFaculty,
    /// The operation needs a student role.
    NotStudent,
    /// The caller neither owns the target nor holds an admin role.
    NotOwner,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotFaculty => write!(f, "a teaching role is required"),
            Self::NotStudent => write!(f, "a student role is required"),
            Self::NotOwner => {
                write!(f, "the caller does not own the target resource")
            }
        }
    }
}

/// Gate verdict. Denial is a normal typed outcome, not an error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

/// Evaluate `action` for `caller`.
///
/// # Examples
/// ```
/// use registrar_backend::domain::{authorize, ClassAction, Decision, DenialReason};
///
/// let decision = authorize(None, &ClassAction::Create);
/// assert_eq!(decision, Decision::Deny(DenialReason::Unauthenticated));
/// ```
pub fn authorize(caller: Option<&CallerProfile>, action: &ClassAction) -> Decision {
    let Some(caller) = caller else {
        return Decision::Deny(DenialReason::Unauthenticated);
    };

    match action {
        ClassAction::Create => require_teaching(caller.role),
        ClassAction::Update { target } | ClassAction::Delete { target } => {
            match require_teaching(caller.role) {
                Decision::Allow => owns_or_admin(caller, target),
                deny => deny,
            }
        }
        ClassAction::Enroll { .. } => require_student(caller.role),
        ClassAction::Withdraw { target } => match require_student(caller.role) {
            Decision::Allow if caller.classes.contains(target) => Decision::Allow,
            Decision::Allow => Decision::Deny(DenialReason::NotOwner),
            deny => deny,
        },
        ClassAction::ReadOwned { owner } => {
            if *owner == caller.id {
                Decision::Allow
            } else {
                Decision::Deny(DenialReason::NotOwner)
            }
        }
        ClassAction::ListOpen => Decision::Allow,
        ClassAction::PruneRefs { owner } => {
            if *owner == caller.id || caller.role.is_admin() {
                Decision::Allow
            } else {
                Decision::Deny(DenialReason::NotOwner)
            }
        }
    }
}

fn require_teaching(role: Role) -> Decision {
    if role.teaches() {
        Decision::Allow
    } else {
        Decision::Deny(DenialReason::NotFaculty)
    }
}

fn require_student(role: Role) -> Decision {
    if role.is_student() {
        Decision::Allow
    } else {
        Decision::Deny(DenialReason::NotStudent)
    }
}

fn owns_or_admin(caller: &CallerProfile, target: &ClassId) -> Decision {
    if caller.role.is_admin() || caller.classes.contains(target) {
        Decision::Allow
    } else {
        Decision::Deny(DenialReason::NotOwner)
    }
}
