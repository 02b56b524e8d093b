//! Tests for the class registration service.

use std::sync::Arc;

use chrono::Utc;

use super::*;
use crate::domain::auth::PasswordDigest;
use crate::domain::ports::{MockClassRepository, MockUserRepository};
use crate::domain::user::{Role, UserDraft, Username};

type TestService = ClassRegistrationService<MockClassRepository, MockUserRepository>;

fn service(classes: MockClassRepository, users: MockUserRepository) -> TestService {
    ClassRegistrationService::new(Arc::new(classes), Arc::new(users))
}

fn user_with_role(username: &str, role: Role) -> User {
    User::new(
        UserDraft {
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            email: "grace@example.edu".to_owned(),
            username: Username::new(username).expect("valid username"),
            password: PasswordDigest::new("password"),
            role,
        },
        Utc::now(),
    )
}

fn sample_spec() -> ClassSpec {
    ClassSpec {
        name: "CS101".to_owned(),
        capacity: 30,
        open: true,
    }
}

fn class_taught_by(teacher: &UserId) -> Class {
    Class::create(
        ClassId::random(),
        sample_spec(),
        teacher.clone(),
        Utc::now(),
    )
}

/// Mock a single caller lookup resolving to `user`.
fn expect_caller(users: &mut MockUserRepository, user: &User) {
    let found = user.clone();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(found)));
}

#[tokio::test]
async fn create_class_seeds_creator_and_writes_back_reference() {
    let creator = user_with_role("grace", Role::Faculty);
    let creator_id = creator.id().clone();
    let principal = Principal::from(&creator);

    let mut classes = MockClassRepository::new();
    {
        let creator_id = creator_id.clone();
        classes
            .expect_save()
            .times(1)
            .withf(move |class| {
                class.faculty().contains(&creator_id) && class.students().is_empty()
            })
            .return_once(|_| Ok(()));
    }

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &creator);
    {
        let creator_id = creator_id.clone();
        users
            .expect_update()
            .times(1)
            .withf(move |user| user.id() == &creator_id && user.classes().len() == 1)
            .return_once(|_| Ok(true));
    }

    let created = service(classes, users)
        .create_class(Some(&principal), sample_spec())
        .await
        .expect("create succeeds");

    assert_eq!(created.name(), "CS101");
    assert!(created.faculty().contains(&creator_id));
    assert!(created.students().is_empty());
}

#[tokio::test]
async fn create_class_denies_students_without_touching_either_store() {
    let student = user_with_role("sam", Role::Student);
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    classes.expect_save().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);
    users.expect_update().times(0);

    let error = service(classes, users)
        .create_class(Some(&principal), sample_spec())
        .await
        .expect_err("students may not create classes");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::NotFaculty)
    );
}

#[tokio::test]
async fn create_class_without_a_principal_never_reads_the_store() {
    let mut classes = MockClassRepository::new();
    classes.expect_save().times(0);
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().times(0);

    let error = service(classes, users)
        .create_class(None, sample_spec())
        .await
        .expect_err("unauthenticated create must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::Unauthenticated)
    );
}

#[tokio::test]
async fn create_class_rejects_blank_names_before_any_write() {
    let creator = user_with_role("grace", Role::Faculty);
    let principal = Principal::from(&creator);

    let mut classes = MockClassRepository::new();
    classes.expect_save().times(0);
    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &creator);
    users.expect_update().times(0);

    let error = service(classes, users)
        .create_class(
            Some(&principal),
            ClassSpec {
                name: "   ".to_owned(),
                capacity: 30,
                open: true,
            },
        )
        .await
        .expect_err("blank name must fail");

    assert!(matches!(error, RegistrationError::InvalidRequest { .. }));
}

#[tokio::test]
async fn create_class_surfaces_a_partial_failure_when_the_back_reference_is_lost() {
    let creator = user_with_role("grace", Role::Faculty);
    let creator_id = creator.id().clone();
    let principal = Principal::from(&creator);

    let mut classes = MockClassRepository::new();
    classes.expect_save().times(1).return_once(|_| Ok(()));

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &creator);
    users
        .expect_update()
        .times(1)
        .return_once(|_| Err(UserRepositoryError::query("write concern lost")));

    let error = service(classes, users)
        .create_class(Some(&principal), sample_spec())
        .await
        .expect_err("second write failure must surface");

    match error {
        RegistrationError::PartialFailure { user_id, .. } => {
            assert_eq!(user_id, creator_id);
        }
        other => panic!("expected a partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn create_class_treats_a_vanished_creator_as_partial_failure() {
    // The unisolated window: the creator's document disappears between the
    // class write and the back-reference write.
    let creator = user_with_role("grace", Role::Faculty);
    let principal = Principal::from(&creator);

    let mut classes = MockClassRepository::new();
    classes.expect_save().times(1).return_once(|_| Ok(()));

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &creator);
    users.expect_update().times(1).return_once(|_| Ok(false));

    let error = service(classes, users)
        .create_class(Some(&principal), sample_spec())
        .await
        .expect_err("vanished creator must surface");

    assert!(matches!(error, RegistrationError::PartialFailure { .. }));
}

#[tokio::test]
async fn update_class_on_an_unknown_id_makes_no_write() {
    let admin = user_with_role("root", Role::Admin);
    let principal = Principal::from(&admin);
    let target = ClassId::random();

    let mut classes = MockClassRepository::new();
    classes
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));
    classes.expect_update().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &admin);

    let error = service(classes, users)
        .update_class(Some(&principal), &target, sample_spec())
        .await
        .expect_err("unknown id must fail");

    assert!(matches!(error, RegistrationError::NotFound { .. }));
}

#[tokio::test]
async fn update_class_preserves_membership() {
    let mut teacher = user_with_role("grace", Role::Faculty);
    let mut class = class_taught_by(teacher.id());
    teacher.assign_class(class.id().clone());
    let student = UserId::random();
    class.enroll_student(student.clone());
    let principal = Principal::from(&teacher);

    let mut classes = MockClassRepository::new();
    {
        let stored = class.clone();
        classes
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
    }
    {
        let teacher_id = teacher.id().clone();
        let student = student.clone();
        classes
            .expect_update()
            .times(1)
            .withf(move |updated| {
                updated.faculty().contains(&teacher_id)
                    && updated.has_student(&student)
            })
            .return_once(|_| Ok(true));
    }

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &teacher);

    let updated = service(classes, users)
        .update_class(
            Some(&principal),
            class.id(),
            ClassSpec {
                name: "CS102".to_owned(),
                capacity: 5,
                open: false,
            },
        )
        .await
        .expect("update succeeds");

    assert_eq!(updated.name(), "CS102");
    assert!(updated.faculty().contains(teacher.id()));
    assert!(updated.has_student(&student));
}

#[tokio::test]
async fn update_class_denies_faculty_who_do_not_teach_it() {
    let outsider = user_with_role("outsider", Role::Faculty);
    let principal = Principal::from(&outsider);
    let target = ClassId::random();

    let mut classes = MockClassRepository::new();
    classes.expect_find_by_id().times(0);
    classes.expect_update().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &outsider);

    let error = service(classes, users)
        .update_class(Some(&principal), &target, sample_spec())
        .await
        .expect_err("non-owner update must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::NotOwner)
    );
}

#[tokio::test]
async fn delete_class_denies_faculty_who_do_not_teach_it() {
    let outsider = user_with_role("outsider", Role::Faculty);
    let principal = Principal::from(&outsider);
    let target = ClassId::random();

    let mut classes = MockClassRepository::new();
    classes.expect_find_by_id().times(0);
    classes.expect_delete_by_id().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &outsider);

    let error = service(classes, users)
        .delete_class(Some(&principal), &target)
        .await
        .expect_err("non-owner delete must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::NotOwner)
    );
}

#[tokio::test]
async fn delete_class_returns_the_removed_document() {
    let mut teacher = user_with_role("grace", Role::Faculty);
    let class = class_taught_by(teacher.id());
    teacher.assign_class(class.id().clone());
    let principal = Principal::from(&teacher);

    let mut classes = MockClassRepository::new();
    {
        let stored = class.clone();
        classes
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
    }
    classes
        .expect_delete_by_id()
        .times(1)
        .return_once(|_| Ok(true));

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &teacher);

    let deleted = service(classes, users)
        .delete_class(Some(&principal), class.id())
        .await
        .expect("delete succeeds");

    assert_eq!(deleted.id(), class.id());
}

#[tokio::test]
async fn enroll_adds_the_student_to_both_sides() {
    let student = user_with_role("sam", Role::Student);
    let student_id = student.id().clone();
    let class = class_taught_by(&UserId::random());
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    {
        let stored = class.clone();
        classes
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
    }
    {
        let student_id = student_id.clone();
        classes
            .expect_update()
            .times(1)
            .withf(move |updated| updated.has_student(&student_id))
            .return_once(|_| Ok(true));
    }

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);
    {
        let class_id = class.id().clone();
        users
            .expect_update()
            .times(1)
            .withf(move |user| user.holds_class(&class_id))
            .return_once(|_| Ok(true));
    }

    let enrolled = service(classes, users)
        .enroll(Some(&principal), class.id())
        .await
        .expect("enrollment succeeds");

    assert!(enrolled.has_student(&student_id));
}

#[tokio::test]
async fn enroll_rejects_closed_and_full_classes() {
    for (open, capacity, reason) in [(false, 30, "closed"), (true, 0, "full")] {
        let student = user_with_role("sam", Role::Student);
        let principal = Principal::from(&student);
        let class = Class::create(
            ClassId::random(),
            ClassSpec {
                name: "CS101".to_owned(),
                capacity,
                open,
            },
            UserId::random(),
            Utc::now(),
        );

        let mut classes = MockClassRepository::new();
        let stored = class.clone();
        classes
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
        classes.expect_update().times(0);

        let mut users = MockUserRepository::new();
        expect_caller(&mut users, &student);
        users.expect_update().times(0);

        let error = service(classes, users)
            .enroll(Some(&principal), class.id())
            .await
            .expect_err(reason);

        assert!(matches!(error, RegistrationError::InvalidRequest { .. }));
    }
}

#[tokio::test]
async fn enroll_rejects_duplicate_enrollment() {
    let student = user_with_role("sam", Role::Student);
    let principal = Principal::from(&student);
    let mut class = class_taught_by(&UserId::random());
    class.enroll_student(student.id().clone());

    let mut classes = MockClassRepository::new();
    let stored = class.clone();
    classes
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    classes.expect_update().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);

    let error = service(classes, users)
        .enroll(Some(&principal), class.id())
        .await
        .expect_err("duplicate enrollment must fail");

    assert!(matches!(error, RegistrationError::InvalidRequest { .. }));
}

#[tokio::test]
async fn enroll_surfaces_a_partial_failure_naming_the_class() {
    let student = user_with_role("sam", Role::Student);
    let class = class_taught_by(&UserId::random());
    let class_id = class.id().clone();
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    let stored = class.clone();
    classes
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
    classes.expect_update().times(1).return_once(|_| Ok(true));

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);
    users.expect_update().times(1).return_once(|_| Ok(false));

    let error = service(classes, users)
        .enroll(Some(&principal), &class_id)
        .await
        .expect_err("lost back-reference must surface");

    match error {
        RegistrationError::PartialFailure {
            class_id: named, ..
        } => assert_eq!(named, class_id),
        other => panic!("expected a partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn withdraw_retracts_both_sides() {
    let mut student = user_with_role("sam", Role::Student);
    let mut class = class_taught_by(&UserId::random());
    class.enroll_student(student.id().clone());
    student.assign_class(class.id().clone());
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    {
        let stored = class.clone();
        classes
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
    }
    {
        let student_id = student.id().clone();
        classes
            .expect_update()
            .times(1)
            .withf(move |updated| !updated.has_student(&student_id))
            .return_once(|_| Ok(true));
    }

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);
    {
        let class_id = class.id().clone();
        users
            .expect_update()
            .times(1)
            .withf(move |user| !user.holds_class(&class_id))
            .return_once(|_| Ok(true));
    }

    let updated = service(classes, users)
        .withdraw(Some(&principal), class.id())
        .await
        .expect("withdrawal succeeds");

    assert!(!updated.has_student(student.id()));
}

#[tokio::test]
async fn withdraw_denies_students_without_the_reference() {
    let student = user_with_role("sam", Role::Student);
    let principal = Principal::from(&student);
    let target = ClassId::random();

    let mut classes = MockClassRepository::new();
    classes.expect_find_by_id().times(0);
    classes.expect_update().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);

    let error = service(classes, users)
        .withdraw(Some(&principal), &target)
        .await
        .expect_err("withdrawal without the reference must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::NotOwner)
    );
}

#[tokio::test]
async fn classes_for_user_skips_dangling_references() {
    let mut student = user_with_role("sam", Role::Student);
    let kept = class_taught_by(&UserId::random());
    let dangling = ClassId::random();
    student.assign_class(kept.id().clone());
    student.assign_class(dangling.clone());
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    {
        let kept = kept.clone();
        classes
            .expect_find_by_id()
            .times(2)
            .returning(move |id| {
                if id == kept.id() {
                    Ok(Some(kept.clone()))
                } else {
                    Ok(None)
                }
            });
    }

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);

    let resolved = service(classes, users)
        .classes_for_user(Some(&principal), student.id())
        .await
        .expect("owned read succeeds");

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.first().map(Class::id), Some(kept.id()));
}

#[tokio::test]
async fn classes_for_user_denies_reads_of_other_accounts() {
    let student = user_with_role("sam", Role::Student);
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    classes.expect_find_by_id().times(0);

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);

    let error = service(classes, users)
        .classes_for_user(Some(&principal), &UserId::random())
        .await
        .expect_err("foreign owned read must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::NotOwner)
    );
}

#[tokio::test]
async fn open_classes_requires_authentication() {
    let mut classes = MockClassRepository::new();
    classes.expect_find_all_open().times(0);
    let users = MockUserRepository::new();

    let error = service(classes, users)
        .open_classes(None)
        .await
        .expect_err("anonymous listing must fail");

    assert_eq!(
        error,
        RegistrationError::Unauthorized(DenialReason::Unauthenticated)
    );
}

#[tokio::test]
async fn open_classes_maps_a_store_timeout_to_unexpected() {
    let student = user_with_role("sam", Role::Student);
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    classes
        .expect_find_all_open()
        .times(1)
        .return_once(|| Err(ClassRepositoryError::timeout("deadline exceeded")));

    let mut users = MockUserRepository::new();
    expect_caller(&mut users, &student);

    let error = service(classes, users)
        .open_classes(Some(&principal))
        .await
        .expect_err("timeout must surface");

    assert!(matches!(error, RegistrationError::Unexpected { .. }));
}

#[tokio::test]
async fn prune_removes_exactly_the_dangling_references() {
    let mut student = user_with_role("sam", Role::Student);
    let kept = class_taught_by(&UserId::random());
    let dangling = ClassId::random();
    student.assign_class(kept.id().clone());
    student.assign_class(dangling.clone());
    let principal = Principal::from(&student);

    let mut classes = MockClassRepository::new();
    {
        let kept = kept.clone();
        classes
            .expect_find_by_id()
            .times(2)
            .returning(move |id| {
                if id == kept.id() {
                    Ok(Some(kept.clone()))
                } else {
                    Ok(None)
                }
            });
    }

    let mut users = MockUserRepository::new();
    {
        let stored = student.clone();
        users
            .expect_find_by_id()
            .times(2)
            .returning(move |_| Ok(Some(stored.clone())));
    }
    {
        let kept_id = kept.id().clone();
        users
            .expect_update()
            .times(1)
            .withf(move |user| {
                user.holds_class(&kept_id) && user.classes().len() == 1
            })
            .return_once(|_| Ok(true));
    }

    let pruned = service(classes, users)
        .prune_class_refs(Some(&principal), student.id())
        .await
        .expect("prune succeeds");

    assert_eq!(pruned, vec![dangling]);
}
