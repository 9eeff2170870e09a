//! Permission engine properties over the standard table.

use salon_core::rbac::{
    Action, Permission, PermissionEngine, PermissionTable, PolicyDecision, Resource, Role, RoleSet,
};
use std::sync::Arc;

fn roles(tags: &[Role]) -> RoleSet {
    tags.iter().copied().collect()
}

#[test]
fn test_empty_role_set_is_denied_everywhere() {
    let engine = PermissionEngine::standard();
    let nobody = RoleSet::empty();
    for resource in Resource::ALL {
        for action in Action::ALL {
            assert!(!engine.authorize(&nobody, resource, action), "{resource}:{action}");
        }
    }
}

#[test]
fn test_authorize_is_the_union_of_single_roles() {
    let engine = PermissionEngine::standard();
    let table = engine.table();

    for (a, b) in [
        (Role::Customer, Role::BusinessStaff),
        (Role::Customer, Role::BusinessOwner),
        (Role::BusinessStaff, Role::BusinessOwner),
    ] {
        let both = roles(&[a, b]);
        for resource in Resource::ALL {
            for action in Action::ALL {
                let expected = table.allows(a, resource, action) || table.allows(b, resource, action);
                assert_eq!(engine.authorize(&both, resource, action), expected);
            }
        }
    }
}

#[test]
fn test_appointment_grants_by_role() {
    let engine = PermissionEngine::standard();
    let cases = [
        (Role::Admin, Action::Delete, true),
        (Role::BusinessOwner, Action::Delete, true),
        (Role::Customer, Action::Create, true),
        (Role::Customer, Action::Update, true),
        (Role::Customer, Action::Delete, false),
        (Role::BusinessStaff, Action::View, false),
    ];
    for (role, action, expected) in cases {
        assert_eq!(
            engine.authorize(&roles(&[role]), Resource::Appointment, action),
            expected,
            "{role} appointment:{action}"
        );
    }
}

#[test]
fn test_check_names_the_granting_role() {
    let engine = PermissionEngine::standard();
    let decision = engine.check(
        &roles(&[Role::Customer, Role::BusinessOwner]),
        Resource::Appointment,
        Action::Delete,
    );
    assert_eq!(decision, PolicyDecision::Allow { role: Role::BusinessOwner });

    let denied = engine.check(&roles(&[Role::Customer]), Resource::AdminUser, Action::View);
    assert!(denied.is_denied());
}

#[test]
fn test_role_tags_from_identity() {
    let (set, unknown) = RoleSet::from_tags(["customer", " businessOwner ", "", "root"]);
    assert_eq!(set, roles(&[Role::Customer, Role::BusinessOwner]));
    assert_eq!(unknown, vec!["root".to_string()]);
}

#[test]
fn test_substitute_table() {
    let table = PermissionTable::builder()
        .grant(Role::BusinessStaff, Resource::Appointment, &[Action::View])
        .build();
    let engine = PermissionEngine::new(Arc::new(table));

    let staff = roles(&[Role::BusinessStaff]);
    assert!(engine.authorize(&staff, Resource::Appointment, Action::View));
    assert!(!engine.authorize(&staff, Resource::Appointment, Action::Update));
    assert!(!engine.authorize(&roles(&[Role::Admin]), Resource::Business, Action::View));
}

#[test]
fn test_enforce_reports_missing_permission() {
    let engine = PermissionEngine::standard();
    let err = engine
        .enforce(&roles(&[Role::Customer]), Resource::Appointment, Action::Delete)
        .unwrap_err();
    assert_eq!(err.http_status(), axum::http::StatusCode::FORBIDDEN);
    assert_eq!(
        err.user_message(),
        format!("missing permission {}", Permission::new(Resource::Appointment, Action::Delete))
    );
}
