//! Override management: bulk updates, role changes, resets
//!
//! The owner role is immutable through this surface: any attempt to edit an
//! owner's grants or change an owner's role is rejected before a single
//! write happens.

use crate::catalog::{PermissionKind, ProjectRole};
use crate::error::{PermError, Result};
use crate::members::{self, Member};
use crate::resolve::{member_permissions, MemberPermissions};
use crate::tx::transact;

fn require_member(member_id: u64) -> Result<Member> {
    members::get_member(member_id)?
        .ok_or_else(|| PermError::NotFound(format!("member {}", member_id)))
}

fn reject_owner(member: &Member) -> Result<()> {
    if member.role == ProjectRole::Owner {
        Err(PermError::Forbidden(
            "the project owner's permissions cannot be modified".into(),
        ))
    } else {
        Ok(())
    }
}

/// Apply per-kind grant overrides to a member
///
/// Upserts each submitted (kind, granted) pair; kinds absent from the input
/// keep their current value. An uninitialized member is seeded from the role
/// template first, in the same transaction, so the override set stays
/// complete. Kinds outside the role's template defaults are accepted.
pub fn update_member_permissions(
    member_id: u64,
    updates: &[(PermissionKind, bool)],
) -> Result<MemberPermissions> {
    let member = require_member(member_id)?;
    reject_owner(&member)?;
    transact(|tx| {
        if tx.overrides_empty(member_id)? {
            tx.seed_overrides(member_id, member.role)?;
        }
        for (kind, granted) in updates {
            tx.put_override(member_id, *kind, *granted)?;
        }
        Ok(())
    })?;
    member_permissions(member_id)
}

/// Change a member's role and re-derive their grants from the new role's
/// template
///
/// The role write, the override wipe, and the reseed are one transaction:
/// no reader ever sees the old role with half-deleted overrides, and the
/// reseed reads the new role by construction.
pub fn update_member_role(member_id: u64, new_role: ProjectRole) -> Result<MemberPermissions> {
    let member = require_member(member_id)?;
    reject_owner(&member)?;
    if new_role == ProjectRole::Owner {
        return Err(PermError::InvalidInput(
            "cannot assign the owner role through permission management".into(),
        ));
    }
    transact(|tx| {
        tx.set_member_role(member_id, new_role)?;
        tx.delete_overrides(member_id)?;
        tx.seed_overrides(member_id, new_role)
    })?;
    member_permissions(member_id)
}

/// Discard a member's overrides and reseed from the current role template
pub fn reset_to_default_permissions(member_id: u64) -> Result<MemberPermissions> {
    let member = require_member(member_id)?;
    reject_owner(&member)?;
    transact(|tx| {
        tx.delete_overrides(member_id)?;
        tx.seed_overrides(member_id, member.role)
    })?;
    member_permissions(member_id)
}
