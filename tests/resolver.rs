//! Resolver tests
//!
//! Lazy initialization, denial semantics, the super-admin bypass, and the
//! enforcing check.

use permgate::{
    add_member, all_member_permissions, all_permission_kinds, check_permission, clear_all,
    has_permission, init, member_permissions, role_template, sync_role_templates, test_lock,
    Actor, NoExternalRoles, PermError, PermissionKind, ProjectRole,
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

fn setup_clean() -> std::sync::MutexGuard<'static, ()> {
    let lock = test_lock();
    setup();
    clear_all().unwrap();
    lock
}

const PROJECT: u64 = 100;

#[test]
fn first_check_initializes_and_matches_template() {
    let _lock = setup_synced();

    let m = add_member(PROJECT, 7, ProjectRole::MemberEditor).unwrap();
    let actor = Actor::person(7);

    assert!(has_permission(&actor, PROJECT, PermissionKind::TaskCreate).unwrap());
    assert!(!has_permission(&actor, PROJECT, PermissionKind::ProjectDelete).unwrap());

    // Exactly one override row per kind, values matching the template
    let perms = member_permissions(m.id).unwrap();
    assert_eq!(perms.grants.len(), PermissionKind::ALL.len());
    assert_eq!(perms.grants, role_template(ProjectRole::MemberEditor).unwrap());
}

#[test]
fn non_member_is_denied_not_errored() {
    let _lock = setup_synced();

    let actor = Actor::person(424242);
    assert!(!has_permission(&actor, PROJECT, PermissionKind::ProjectView).unwrap());
}

#[test]
fn owner_holds_every_permission() {
    let _lock = setup_synced();

    add_member(PROJECT, 1, ProjectRole::Owner).unwrap();
    let actor = Actor::person(1);
    for kind in PermissionKind::ALL {
        assert!(has_permission(&actor, PROJECT, kind).unwrap(), "kind {:?}", kind);
    }
}

#[test]
fn super_admin_bypasses_membership_entirely() {
    let _lock = setup_synced();

    // No member record for this person in any project
    let actor = Actor::super_admin(999);
    assert!(has_permission(&actor, PROJECT, PermissionKind::AdminSystemSettings).unwrap());
    assert!(has_permission(&actor, 31337, PermissionKind::ProjectDelete).unwrap());
}

#[test]
fn check_permission_carries_the_description() {
    let _lock = setup_synced();

    add_member(PROJECT, 7, ProjectRole::MemberEditor).unwrap();
    let actor = Actor::person(7);

    check_permission(&actor, PROJECT, PermissionKind::TaskView).unwrap();
    match check_permission(&actor, PROJECT, PermissionKind::ProjectDelete) {
        Err(PermError::Forbidden(msg)) => assert!(msg.contains("delete the project")),
        other => panic!("expected Forbidden, got {:?}", other),
    }
}

/// With templates never synchronized, seeding writes zero rows and the
/// requested kind has no override row even after initialization. The check
/// must read as a plain denial, not an error.
#[test]
fn missing_grant_row_after_init_is_denied_not_errored() {
    let _lock = setup_clean();

    add_member(PROJECT, 8, ProjectRole::MemberEditor).unwrap();
    let actor = Actor::person(8);

    assert!(!has_permission(&actor, PROJECT, PermissionKind::TaskView).unwrap());
    assert!(!has_permission(&actor, PROJECT, PermissionKind::ProjectView).unwrap());
}

#[test]
fn member_permissions_unknown_member_is_not_found() {
    let _lock = setup_synced();

    match member_permissions(99999) {
        Err(PermError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn project_fanout_covers_every_member() {
    let _lock = setup_synced();

    add_member(PROJECT, 1, ProjectRole::Owner).unwrap();
    add_member(PROJECT, 2, ProjectRole::Admin).unwrap();
    add_member(PROJECT, 3, ProjectRole::MemberEditor).unwrap();
    add_member(PROJECT + 1, 4, ProjectRole::Admin).unwrap();

    let all = all_member_permissions(PROJECT).unwrap();
    assert_eq!(all.len(), 3);
    for mp in &all {
        assert_eq!(mp.member.project_id, PROJECT);
        assert_eq!(mp.grants.len(), PermissionKind::ALL.len());
    }
}

#[test]
fn catalog_lists_every_kind_with_description() {
    let kinds = all_permission_kinds();
    assert_eq!(kinds.len(), PermissionKind::ALL.len());
    assert!(kinds.iter().all(|(_, d)| !d.is_empty()));
}
