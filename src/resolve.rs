//! Permission resolution and query surface

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::catalog::PermissionKind;
use crate::db::read;
use crate::error::{PermError, Result};
use crate::members::{self, Member};
use crate::overrides::{ensure_initialized, list_overrides, list_overrides_in};

/// The authenticated caller, as supplied by the surrounding application's
/// authentication layer. Trusted as given; nothing here re-derives it.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub person_id: u64,
    pub super_admin: bool,
}

impl Actor {
    pub fn person(person_id: u64) -> Actor {
        Actor { person_id, super_admin: false }
    }

    pub fn super_admin(person_id: u64) -> Actor {
        Actor { person_id, super_admin: true }
    }
}

/// A member's role plus their full per-kind grant map
#[derive(Debug, Clone, Serialize)]
pub struct MemberPermissions {
    pub member: Member,
    pub grants: BTreeMap<PermissionKind, bool>,
}

/// Does the actor hold `kind` within `project_id`?
///
/// A total function over valid storage: super-admins pass unconditionally,
/// non-members are denied (not an error), and a grant row missing after
/// initialization reads as denied. Backing-store failures propagate as
/// errors; they are never reported as a denial.
pub fn has_permission(actor: &Actor, project_id: u64, kind: PermissionKind) -> Result<bool> {
    if actor.super_admin {
        return Ok(true);
    }
    let member = match members::find_member(project_id, actor.person_id)? {
        Some(m) => m,
        None => return Ok(false),
    };
    ensure_initialized(&member)?;
    let grants = list_overrides(member.id)?;
    match grants.get(&kind) {
        Some(granted) => Ok(*granted),
        None => {
            warn!(
                member_id = member.id,
                kind = kind.name(),
                "no override row after initialization; template incomplete, treating as denied"
            );
            Ok(false)
        }
    }
}

/// Enforcing counterpart of [`has_permission`]: errors with the permission's
/// description when the actor lacks it
pub fn check_permission(actor: &Actor, project_id: u64, kind: PermissionKind) -> Result<()> {
    if has_permission(actor, project_id, kind)? {
        Ok(())
    } else {
        Err(PermError::Forbidden(format!(
            "missing permission to {}",
            kind.description()
        )))
    }
}

/// Full grant map for one member, initializing overrides on first access
pub fn member_permissions(member_id: u64) -> Result<MemberPermissions> {
    let member = members::get_member(member_id)?
        .ok_or_else(|| PermError::NotFound(format!("member {}", member_id)))?;
    ensure_initialized(&member)?;
    // Role and grants come from one read transaction: a concurrently
    // committing role change is either visible in both or in neither.
    read(|d, tx| {
        let member = members::get_member_in(d, tx, member_id)?
            .ok_or_else(|| PermError::NotFound(format!("member {}", member_id)))?;
        let grants = list_overrides_in(d, tx, member_id)?;
        Ok(MemberPermissions { member, grants })
    })
}

/// Grant maps for every member of a project. Read-consistent per member, not
/// globally atomic.
pub fn all_member_permissions(project_id: u64) -> Result<Vec<MemberPermissions>> {
    let mut out = Vec::new();
    for member in members::members_of_project(project_id)? {
        out.push(member_permissions(member.id)?);
    }
    Ok(out)
}

/// The full permission catalog with human-readable descriptions
pub fn all_permission_kinds() -> Vec<(PermissionKind, &'static str)> {
    PermissionKind::ALL
        .iter()
        .map(|k| (*k, k.description()))
        .collect()
}
