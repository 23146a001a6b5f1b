mod common;

use common::setup;
use pronet_core::CoreError;
use pronet_types::models::{NewProfile, ProfileField};

#[test]
fn test_register_and_get() {
    let env = setup();
    let profile = NewProfile {
        email: Some("alice@example.com".into()),
        name: Some("Alice".into()),
        date_of_birth: Some("1990-04-01".into()),
    };

    let user = env.users.register("alice", "testpass123", profile).unwrap();
    let fetched = env.users.get(user.id).unwrap();
    assert_eq!(fetched.username, "alice");
    assert_eq!(fetched.email.as_deref(), Some("alice@example.com"));
    assert_eq!(fetched.name.as_deref(), Some("Alice"));
}

#[test]
fn test_duplicate_username_rejected() {
    let env = setup();
    env.users
        .register("alice", "testpass123", NewProfile::default())
        .unwrap();

    let err = env
        .users
        .register("alice", "otherpass456", NewProfile::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::UsernameTaken));
}

#[test]
fn test_registration_input_validation() {
    let env = setup();

    assert!(matches!(
        env.users.register("al", "testpass123", NewProfile::default()).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
    assert!(matches!(
        env.users.register("alice", "short", NewProfile::default()).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn test_update_profile_fields() {
    let env = setup();
    let user = env
        .users
        .register("alice", "testpass123", NewProfile::default())
        .unwrap();

    env.users
        .update_profile(user.id, ProfileField::Email, Some("new@example.com"))
        .unwrap();
    env.users
        .update_profile(user.id, ProfileField::Name, Some("Alice B."))
        .unwrap();
    env.users
        .update_profile(user.id, ProfileField::DateOfBirth, None)
        .unwrap();

    let fetched = env.users.get(user.id).unwrap();
    assert_eq!(fetched.email.as_deref(), Some("new@example.com"));
    assert_eq!(fetched.name.as_deref(), Some("Alice B."));
    assert!(fetched.date_of_birth.is_none());
}

#[test]
fn test_change_password_requires_current() {
    let env = setup();
    let user = env
        .users
        .register("alice", "testpass123", NewProfile::default())
        .unwrap();

    let err = env
        .users
        .change_password(user.id, "wrongpass", "newpass456")
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidCredentials));

    env.users
        .change_password(user.id, "testpass123", "newpass456")
        .unwrap();

    env.users.verify_credentials("alice", "newpass456").unwrap();
    assert!(matches!(
        env.users.verify_credentials("alice", "testpass123").unwrap_err(),
        CoreError::InvalidCredentials
    ));
}

#[test]
fn test_verify_credentials_unknown_username() {
    let env = setup();
    let err = env.users.verify_credentials("ghost", "whatever1").unwrap_err();
    assert!(matches!(err, CoreError::InvalidCredentials));
}
