//! Class aggregate and its creation/update payload.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Identifier for a class.
///
/// Assigned by the registration service before any cross-reference to the
/// class is written, never a constant placeholder.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClassId(Uuid);

impl ClassId {
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

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum allowed length for a class name.
pub const CLASS_NAME_MAX: usize = 128;

/// Validation errors returned by [`ClassSpec::validated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassSpecValidationError {
    EmptyName,
    NameTooLong { max: usize },
}

impl fmt::Display for ClassSpecValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "class name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "class name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ClassSpecValidationError {}

fn default_open() -> bool {
    true
}

/// Requested class attributes.
///
/// Membership never travels in this payload; the faculty and student sets of
/// an existing class are preserved across updates by construction. Unknown
/// fields in the wire form are ignored, so a payload that tries to smuggle
/// membership in simply loses it.
///
/// # Examples
/// ```
/// use registrar_backend::domain::ClassSpec;
///
/// let spec = ClassSpec {
///     name: "  CS101  ".to_owned(),
///     capacity: 30,
///     open: true,
/// };
/// assert_eq!(spec.validated().unwrap().name, "CS101");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpec {
    pub name: String,
    pub capacity: u32,
    #[serde(default = "default_open")]
    pub open: bool,
}

impl ClassSpec {
    /// Validate and normalise the payload; the name is stored trimmed.
    pub fn validated(self) -> Result<Self, ClassSpecValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClassSpecValidationError::EmptyName);
        }
        if name.chars().count() > CLASS_NAME_MAX {
            return Err(ClassSpecValidationError::NameTooLong {
                max: CLASS_NAME_MAX,
            });
        }
        Ok(Self {
            name: name.to_owned(),
            ..self
        })
    }
}

/// A course offering and its denormalized membership views.
///
/// ## Invariants
/// - Every id in `faculty` and `students` is mirrored by this class's id in
///   that user's owned-class set. The registration service is the only
///   writer of either side of the relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    id: ClassId,
    name: String,
    capacity: u32,
    open: bool,
    faculty: BTreeSet<UserId>,
    students: BTreeSet<UserId>,
    created_at: DateTime<Utc>,
}

impl Class {
    /// Create a class from a validated spec, seeded with its creating
    /// faculty member and an empty roster.
    pub fn create(
        id: ClassId,
        spec: ClassSpec,
        creator: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut faculty = BTreeSet::new();
        faculty.insert(creator);
        Self {
            id,
            name: spec.name,
            capacity: spec.capacity,
            open: spec.open,
            faculty,
            students: BTreeSet::new(),
            created_at,
        }
    }

    /// Apply a replacement spec, preserving membership and creation time.
    pub fn with_spec(mut self, spec: ClassSpec) -> Self {
        self.name = spec.name;
        self.capacity = spec.capacity;
        self.open = spec.open;
        self
    }

    pub fn id(&self) -> &ClassId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether the class accepts enrollment.
    pub fn open(&self) -> bool {
        self.open
    }

    /// Faculty members teaching this class.
    pub fn faculty(&self) -> &BTreeSet<UserId> {
        &self.faculty
    }

    /// Students enrolled in this class.
    pub fn students(&self) -> &BTreeSet<UserId> {
        &self.students
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the roster is at capacity.
    pub fn is_full(&self) -> bool {
        self.students.len() as u64 >= u64::from(self.capacity)
    }

    /// Roster membership test.
    pub fn has_student(&self, id: &UserId) -> bool {
        self.students.contains(id)
    }

    /// Add a student to the roster. Returns false when already present.
    pub fn enroll_student(&mut self, id: UserId) -> bool {
        self.students.insert(id)
    }

    /// Remove a student from the roster. Returns false when absent.
    pub fn withdraw_student(&mut self, id: &UserId) -> bool {
        self.students.remove(id)
    }
}
