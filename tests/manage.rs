//! Override manager tests
//!
//! Bulk updates, owner immutability, role-change cascades, and reset
//! semantics.

use permgate::{
    add_member, clear_all, get_member, has_permission, init, reset_to_default_permissions,
    role_template, sync_role_templates, test_lock, update_member_permissions,
    update_member_role, Actor, NoExternalRoles, PermError, PermissionKind, ProjectRole,
};
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();
static mut TEST_DIR: Option<TempDir> = None;

fn setup() {
    INIT.call_once(|| {
        let dir = TempDir::new().unwrap();
        init(dir.path().to_str().unwrap()).unwrap();
        unsafe { TEST_DIR = Some(dir); }
    });
}

fn setup_synced() -> std::sync::MutexGuard<'static, ()> {
    let lock = test_lock();
    setup();
    clear_all().unwrap();
    sync_role_templates(&NoExternalRoles).unwrap();
    lock
}

const PROJECT: u64 = 200;

#[test]
fn bulk_update_applies_each_submitted_kind() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 10, ProjectRole::MemberEditor).unwrap();
    let updated = update_member_permissions(
        m.id,
        &[
            (PermissionKind::ProjectDelete, true),
            (PermissionKind::TaskCreate, false),
        ],
    )
    .unwrap();

    assert!(updated.grants[&PermissionKind::ProjectDelete]);
    assert!(!updated.grants[&PermissionKind::TaskCreate]);
    // Untouched kinds keep their template values
    assert!(updated.grants[&PermissionKind::TaskView]);
    assert_eq!(updated.grants.len(), PermissionKind::ALL.len());
}

#[test]
fn bulk_update_seeds_uninitialized_member_first() {
    let _lock = setup_synced();

    // No permission lookup happened for this member yet
    let m = add_member(PROJECT, 11, ProjectRole::MemberEditor).unwrap();
    let updated =
        update_member_permissions(m.id, &[(PermissionKind::KanbanManageColumns, true)]).unwrap();

    // Full set present: seeded from the template, then the update applied
    assert_eq!(updated.grants.len(), PermissionKind::ALL.len());
    assert!(updated.grants[&PermissionKind::KanbanManageColumns]);
    assert!(updated.grants[&PermissionKind::ProjectView]);
}

#[test]
fn owner_grants_are_immutable() {
    let _lock = setup_synced();

    let owner = add_member(PROJECT, 1, ProjectRole::Owner).unwrap();

    for result in [
        update_member_permissions(owner.id, &[(PermissionKind::TaskView, false)]).err(),
        update_member_role(owner.id, ProjectRole::Admin).err(),
        reset_to_default_permissions(owner.id).err(),
    ] {
        match result {
            Some(PermError::Forbidden(_)) => {}
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    // Owner still holds everything
    let actor = Actor::person(1);
    assert!(has_permission(&actor, PROJECT, PermissionKind::ProjectDelete).unwrap());
}

#[test]
fn role_change_cascades_to_new_template() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 12, ProjectRole::MemberEditor).unwrap();
    // Materialize and customize the member-editor overrides first
    update_member_permissions(m.id, &[(PermissionKind::MeetingCreate, false)]).unwrap();

    let updated = update_member_role(m.id, ProjectRole::Admin).unwrap();

    // Exactly the admin template, no residual member-editor overrides
    assert_eq!(updated.grants, role_template(ProjectRole::Admin).unwrap());
    assert_eq!(updated.member.role, ProjectRole::Admin);
    assert_eq!(get_member(m.id).unwrap().unwrap().role, ProjectRole::Admin);
}

#[test]
fn assigning_owner_role_is_rejected() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 13, ProjectRole::Admin).unwrap();
    match update_member_role(m.id, ProjectRole::Owner) {
        Err(PermError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn reset_is_idempotent_and_matches_template() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 14, ProjectRole::Admin).unwrap();
    update_member_permissions(m.id, &[(PermissionKind::ProjectDelete, true)]).unwrap();

    let first = reset_to_default_permissions(m.id).unwrap();
    let second = reset_to_default_permissions(m.id).unwrap();

    assert_eq!(first.grants, second.grants);
    assert_eq!(first.grants, role_template(ProjectRole::Admin).unwrap());
}

#[test]
fn unknown_member_is_not_found() {
    let _lock = setup_synced();

    for result in [
        update_member_permissions(4040, &[(PermissionKind::TaskView, true)]).err(),
        update_member_role(4040, ProjectRole::Admin).err(),
        reset_to_default_permissions(4040).err(),
    ] {
        match result {
            Some(PermError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}

#[test]
fn duplicate_membership_is_invalid() {
    let _lock = setup_synced();

    add_member(PROJECT, 15, ProjectRole::Admin).unwrap();
    match add_member(PROJECT, 15, ProjectRole::MemberEditor) {
        Err(PermError::InvalidInput(_)) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

/// The end-to-end scenario: editor gains task_create by template, loses
/// project_delete through the admin fallback after a role change, and a
/// manual override of project_delete is undone by reset.
#[test]
fn editor_to_admin_scenario() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 16, ProjectRole::MemberEditor).unwrap();
    let actor = Actor::person(16);

    assert!(has_permission(&actor, PROJECT, PermissionKind::TaskCreate).unwrap());

    update_member_role(m.id, ProjectRole::Admin).unwrap();
    assert!(!has_permission(&actor, PROJECT, PermissionKind::ProjectDelete).unwrap());

    update_member_permissions(m.id, &[(PermissionKind::ProjectDelete, true)]).unwrap();
    assert!(has_permission(&actor, PROJECT, PermissionKind::ProjectDelete).unwrap());

    reset_to_default_permissions(m.id).unwrap();
    assert!(!has_permission(&actor, PROJECT, PermissionKind::ProjectDelete).unwrap());
}
