//! User aggregate and its identity types.
//!
//! Identity is a surrogate UUID assigned once at construction. The username
//! is a separate unique attribute and may change; nothing else in the system
//! derives identity from it, so references to a user survive renames.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::auth::PasswordDigest;
use crate::domain::class::ClassId;

/// Immutable surrogate identifier for a user.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors returned by [`Username::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    Empty,
    TooLong { max: usize },
    InvalidCharacters,
}

impl fmt::Display for UsernameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "username must not be empty"),
            Self::TooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::InvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, underscores, or dashes",
            ),
        }
    }
}

impl std::error::Error for UsernameValidationError {}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

/// Unique, mutable login name.
///
/// ## Invariants
/// - Stored trimmed; never empty.
/// - ASCII letters, digits, `.`, `_`, `-` only, at most [`USERNAME_MAX`]
///   characters.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UsernameValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UsernameValidationError::TooLong { max: USERNAME_MAX });
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        if !trimmed.chars().all(allowed) {
            return Err(UsernameValidationError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The username as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Closed set of account roles.
///
/// Admins hold every faculty capability plus the administrative bypasses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    /// Whether this role may create and manage classes.
    pub fn teaches(self) -> bool {
        matches!(self, Self::Faculty | Self::Admin)
    }

    /// Whether this role may bypass ownership checks.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may enroll in classes.
    pub fn is_student(self) -> bool {
        matches!(self, Self::Student)
    }
}

/// Field bundle for constructing a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: Username,
    pub password: PasswordDigest,
    pub role: Role,
}

/// A registrar account.
///
/// ## Invariants
/// - `id` is assigned at construction and never changes, renames included.
/// - `classes` holds the classes this user teaches (faculty) or is enrolled
///   in (students) and is mutated only by the registration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    username: Username,
    password: PasswordDigest,
    role: Role,
    classes: BTreeSet<ClassId>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with a fresh surrogate id and no class refs.
    pub fn new(draft: UserDraft, created_at: DateTime<Utc>) -> Self {
        let UserDraft {
            first_name,
            last_name,
            email,
            username,
            password,
            role,
        } = draft;
        Self {
            id: UserId::random(),
            first_name,
            last_name,
            email,
            username,
            password,
            role,
            classes: BTreeSet::new(),
            created_at,
        }
    }

    /// Surrogate identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Current unique login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Stored password digest.
    pub fn password(&self) -> &PasswordDigest {
        &self.password
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The classes this user teaches or is enrolled in.
    pub fn classes(&self) -> &BTreeSet<ClassId> {
        &self.classes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Point the account at a new username. The surrogate id is untouched;
    /// uniqueness of the new name is the repository's concern.
    pub fn rename(&mut self, username: Username) {
        self.username = username;
    }

    /// Record a class reference. Returns false when already present.
    pub fn assign_class(&mut self, id: ClassId) -> bool {
        self.classes.insert(id)
    }

    /// Drop a class reference. Returns false when absent.
    pub fn retract_class(&mut self, id: &ClassId) -> bool {
        self.classes.remove(id)
    }

    /// Membership test on the owned-class set.
    pub fn holds_class(&self, id: &ClassId) -> bool {
        self.classes.contains(id)
    }
}
