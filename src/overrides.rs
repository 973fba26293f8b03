//! Per-member permission overrides and lazy initialization
//!
//! A member's override set is either completely empty (never initialized) or
//! complete (one row per template entry for the member's role). Seeding
//! re-checks emptiness inside the write transaction: LMDB serializes
//! writers, so concurrent first-time lookups for the same member initialize
//! exactly once, and (member, kind) key uniqueness rules out duplicate rows.

use std::collections::BTreeMap;

use heed::RoTxn;

use crate::catalog::PermissionKind;
use crate::db::{list_pfx, read, Dbs};
use crate::error::Result;
use crate::members::Member;
use crate::tx::transact;

/// Read a member's override rows within an existing read transaction
pub(crate) fn list_overrides_in(
    d: &Dbs,
    tx: &RoTxn,
    member_id: u64,
) -> Result<BTreeMap<PermissionKind, bool>> {
    let rows = list_pfx(tx, &d.overrides, member_id)?;
    let mut map = BTreeMap::new();
    for (kind, granted) in rows {
        if let Some(kind) = PermissionKind::from_u8(kind as u8) {
            map.insert(kind, granted != 0);
        }
    }
    Ok(map)
}

/// Read a member's override rows: kind -> granted
pub(crate) fn list_overrides(member_id: u64) -> Result<BTreeMap<PermissionKind, bool>> {
    read(|d, tx| list_overrides_in(d, tx, member_id))
}

/// Populate the override store for a member from the role template, if and
/// only if the member has no override rows yet
pub(crate) fn ensure_initialized(member: &Member) -> Result<()> {
    if !list_overrides(member.id)?.is_empty() {
        return Ok(());
    }
    transact(|tx| {
        // Re-check under the write transaction; another writer may have
        // seeded between the read above and here.
        if tx.overrides_empty(member.id)? {
            tx.seed_overrides(member.id, member.role)?;
        }
        Ok(())
    })
}
