//! Class registration service.
//!
//! The single owner of every multi-document mutation that touches a class's
//! membership or a user's owned-class set. The store offers no
//! multi-document transaction, so each two-document write commits the class
//! document first and the user back-reference second; a failed second write
//! surfaces as [`RegistrationError::PartialFailure`] naming the class, which
//! an operator can reconcile by retrying the reference write or deleting the
//! class. The reverse order would leave a reference to a class that does not
//! exist, which lookups then trip over unpredictably.
//!
//! No in-process lock spans the two writes; the window between them is
//! observable by concurrent readers and the service compensates through the
//! detectable partial-failure outcome instead of locking. Nothing here
//! retries; re-issuing a partially-applied mutation is the caller's call.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::authorization::{
    authorize, CallerProfile, ClassAction, Decision, DenialReason,
};
use crate::domain::class::{Class, ClassId, ClassSpec};
use crate::domain::error::RegistrationError;
use crate::domain::ports::{
    ClassRepository, ClassRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::principal::Principal;
use crate::domain::user::{User, UserId};

fn map_class_repo_error(error: ClassRepositoryError) -> RegistrationError {
    RegistrationError::unexpected(error.to_string())
}

fn map_user_repo_error(error: UserRepositoryError) -> RegistrationError {
    RegistrationError::unexpected(error.to_string())
}

fn gate(
    caller: Option<&CallerProfile>,
    action: &ClassAction,
) -> Result<(), RegistrationError> {
    match authorize(caller, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(RegistrationError::Unauthorized(reason)),
    }
}

/// Orchestrates class lifecycle and enrollment against the two stores.
pub struct ClassRegistrationService<C: ?Sized, U: ?Sized> {
    classes: Arc<C>,
    users: Arc<U>,
}

impl<C: ?Sized, U: ?Sized> Clone for ClassRegistrationService<C, U> {
    fn clone(&self) -> Self {
        Self {
            classes: Arc::clone(&self.classes),
            users: Arc::clone(&self.users),
        }
    }
}

impl<C, U> ClassRegistrationService<C, U>
where
    C: ClassRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    /// Create a new service over the class and user repositories.
    pub fn new(classes: Arc<C>, users: Arc<U>) -> Self {
        Self { classes, users }
    }

    /// Resolve the caller's stored account and run the gate.
    ///
    /// Role and ownership facts come from the fetched document, not from the
    /// session principal. A session naming a user that no longer exists is
    /// denied as unauthenticated rather than surfacing a lookup failure.
    async fn authorized_caller(
        &self,
        principal: Option<&Principal>,
        action: &ClassAction,
    ) -> Result<User, RegistrationError> {
        let caller = match principal {
            None => None,
            Some(principal) => {
                let found = self
                    .users
                    .find_by_id(&principal.id)
                    .await
                    .map_err(map_user_repo_error)?;
                if found.is_none() {
                    warn!(
                        user_id = %principal.id,
                        "session principal has no stored account"
                    );
                }
                found
            }
        };

        let profile = caller.as_ref().map(CallerProfile::from);
        gate(profile.as_ref(), action)?;

        caller.ok_or(RegistrationError::Unauthorized(
            DenialReason::Unauthenticated,
        ))
    }

    /// Persist the user side of a class relationship.
    ///
    /// A failure here leaves the already-committed class write in place and
    /// is reported as a partial failure naming both documents so an operator
    /// can reconcile.
    async fn commit_back_reference(
        &self,
        user: &User,
        class_id: &ClassId,
    ) -> Result<(), RegistrationError> {
        let outcome = self.users.update(user).await;
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    class_id = %class_id,
                    user_id = %user.id(),
                    "back-reference update matched no user document"
                );
                Err(RegistrationError::PartialFailure {
                    class_id: class_id.clone(),
                    user_id: user.id().clone(),
                })
            }
            Err(error) => {
                warn!(
                    class_id = %class_id,
                    user_id = %user.id(),
                    %error,
                    "back-reference update failed"
                );
                Err(RegistrationError::PartialFailure {
                    class_id: class_id.clone(),
                    user_id: user.id().clone(),
                })
            }
        }
    }

    /// Create a class owned by the calling faculty member.
    ///
    /// The class document is written before the creator's back-reference so
    /// that a fault between the two writes leaves a discoverable orphan
    /// instead of a dangling reference.
    pub async fn create_class(
        &self,
        principal: Option<&Principal>,
        spec: ClassSpec,
    ) -> Result<Class, RegistrationError> {
        let mut creator = self
            .authorized_caller(principal, &ClassAction::Create)
            .await?;
        let spec = spec
            .validated()
            .map_err(|err| RegistrationError::invalid_request(err.to_string()))?;

        let class = Class::create(
            ClassId::random(),
            spec,
            creator.id().clone(),
            Utc::now(),
        );
        self.classes
            .save(&class)
            .await
            .map_err(map_class_repo_error)?;

        creator.assign_class(class.id().clone());
        self.commit_back_reference(&creator, class.id()).await?;

        info!(class_id = %class.id(), faculty_id = %creator.id(), "class created");
        Ok(class)
    }

    /// Replace a class's attributes, leaving membership untouched.
    ///
    /// The stored faculty and student sets always win; the replacement
    /// payload cannot carry membership at all.
    pub async fn update_class(
        &self,
        principal: Option<&Principal>,
        id: &ClassId,
        spec: ClassSpec,
    ) -> Result<Class, RegistrationError> {
        self.authorized_caller(
            principal,
            &ClassAction::Update { target: id.clone() },
        )
        .await?;
        let spec = spec
            .validated()
            .map_err(|err| RegistrationError::invalid_request(err.to_string()))?;

        let existing = self
            .classes
            .find_by_id(id)
            .await
            .map_err(map_class_repo_error)?
            .ok_or_else(|| RegistrationError::class_not_found(id.clone()))?;

        let updated = existing.with_spec(spec);
        if self
            .classes
            .update(&updated)
            .await
            .map_err(map_class_repo_error)?
        {
            Ok(updated)
        } else {
            Err(RegistrationError::class_not_found(id.clone()))
        }
    }

    /// Remove a class document, returning its final state.
    ///
    /// Member users keep their references; [`Self::prune_class_refs`] clears
    /// them out of band.
    pub async fn delete_class(
        &self,
        principal: Option<&Principal>,
        id: &ClassId,
    ) -> Result<Class, RegistrationError> {
        self.authorized_caller(
            principal,
            &ClassAction::Delete { target: id.clone() },
        )
        .await?;

        let existing = self
            .classes
            .find_by_id(id)
            .await
            .map_err(map_class_repo_error)?
            .ok_or_else(|| RegistrationError::class_not_found(id.clone()))?;

        if self
            .classes
            .delete_by_id(id)
            .await
            .map_err(map_class_repo_error)?
        {
            info!(class_id = %id, "class deleted");
            Ok(existing)
        } else {
            Err(RegistrationError::class_not_found(id.clone()))
        }
    }

    /// Enroll the calling student, class document first.
    pub async fn enroll(
        &self,
        principal: Option<&Principal>,
        id: &ClassId,
    ) -> Result<Class, RegistrationError> {
        let mut student = self
            .authorized_caller(
                principal,
                &ClassAction::Enroll { target: id.clone() },
            )
            .await?;

        let mut class = self
            .classes
            .find_by_id(id)
            .await
            .map_err(map_class_repo_error)?
            .ok_or_else(|| RegistrationError::class_not_found(id.clone()))?;

        if !class.open() {
            return Err(RegistrationError::invalid_request(format!(
                "class {} is not open for enrollment",
                class.name()
            )));
        }
        if class.has_student(student.id()) {
            return Err(RegistrationError::invalid_request(format!(
                "already enrolled in class {}",
                class.name()
            )));
        }
        if class.is_full() {
            return Err(RegistrationError::invalid_request(format!(
                "class {} is at capacity",
                class.name()
            )));
        }

        class.enroll_student(student.id().clone());
        if !self
            .classes
            .update(&class)
            .await
            .map_err(map_class_repo_error)?
        {
            return Err(RegistrationError::class_not_found(id.clone()));
        }

        student.assign_class(class.id().clone());
        self.commit_back_reference(&student, class.id()).await?;

        info!(class_id = %id, student_id = %student.id(), "student enrolled");
        Ok(class)
    }

    /// Withdraw the calling student, class document first.
    pub async fn withdraw(
        &self,
        principal: Option<&Principal>,
        id: &ClassId,
    ) -> Result<Class, RegistrationError> {
        let mut student = self
            .authorized_caller(
                principal,
                &ClassAction::Withdraw { target: id.clone() },
            )
            .await?;

        let mut class = self
            .classes
            .find_by_id(id)
            .await
            .map_err(map_class_repo_error)?
            .ok_or_else(|| RegistrationError::class_not_found(id.clone()))?;

        if !class.withdraw_student(student.id()) {
            // The student held the reference but the roster disagreed; the
            // retraction below repairs the student side either way.
            warn!(
                class_id = %id,
                student_id = %student.id(),
                "withdrawal found no roster entry for a held reference"
            );
        }
        if !self
            .classes
            .update(&class)
            .await
            .map_err(map_class_repo_error)?
        {
            return Err(RegistrationError::class_not_found(id.clone()));
        }

        student.retract_class(class.id());
        self.commit_back_reference(&student, class.id()).await?;

        info!(class_id = %id, student_id = %student.id(), "student withdrew");
        Ok(class)
    }

    /// Resolve the classes referenced by the caller's own account.
    ///
    /// References that no longer resolve are skipped and logged; they stay
    /// on the account until pruned.
    pub async fn classes_for_user(
        &self,
        principal: Option<&Principal>,
        owner: &UserId,
    ) -> Result<Vec<Class>, RegistrationError> {
        let user = self
            .authorized_caller(
                principal,
                &ClassAction::ReadOwned {
                    owner: owner.clone(),
                },
            )
            .await?;

        let mut classes = Vec::with_capacity(user.classes().len());
        for id in user.classes() {
            match self
                .classes
                .find_by_id(id)
                .await
                .map_err(map_class_repo_error)?
            {
                Some(class) => classes.push(class),
                None => warn!(
                    class_id = %id,
                    user_id = %owner,
                    "owned-class set references a missing class"
                ),
            }
        }
        Ok(classes)
    }

    /// All classes currently open for enrollment.
    pub async fn open_classes(
        &self,
        principal: Option<&Principal>,
    ) -> Result<Vec<Class>, RegistrationError> {
        self.authorized_caller(principal, &ClassAction::ListOpen)
            .await?;
        self.classes
            .find_all_open()
            .await
            .map_err(map_class_repo_error)
    }

    /// Drop owned-class ids that no longer resolve to a class document.
    ///
    /// Companion to the non-cascading delete: reconciliation is an explicit
    /// maintenance act whose result is reported back to the caller.
    pub async fn prune_class_refs(
        &self,
        principal: Option<&Principal>,
        owner: &UserId,
    ) -> Result<Vec<ClassId>, RegistrationError> {
        self.authorized_caller(
            principal,
            &ClassAction::PruneRefs {
                owner: owner.clone(),
            },
        )
        .await?;

        let mut user = self
            .users
            .find_by_id(owner)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| RegistrationError::user_not_found(owner.clone()))?;

        let mut dangling = Vec::new();
        for id in user.classes().clone() {
            if self
                .classes
                .find_by_id(&id)
                .await
                .map_err(map_class_repo_error)?
                .is_none()
            {
                dangling.push(id);
            }
        }
        if dangling.is_empty() {
            return Ok(dangling);
        }

        for id in &dangling {
            user.retract_class(id);
        }
        match self.users.update(&user).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(RegistrationError::user_not_found(owner.clone()));
            }
            Err(error) => return Err(map_user_repo_error(error)),
        }

        info!(
            user_id = %owner,
            pruned = dangling.len(),
            "pruned dangling class references"
        );
        Ok(dangling)
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
