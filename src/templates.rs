//! Role permission templates and startup synchronization
//!
//! The template store holds the default grant for every (role, kind) pair.
//! It is written by `sync_role_templates` at startup (or an explicit re-sync)
//! and read everywhere else, so post-startup it behaves as immutable data.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use crate::catalog::{PermissionKind, ProjectRole};
use crate::db::{list_pfx, read};
use crate::error::{PermError, Result};
use crate::tx::transact;

/// A role definition from the external global role registry
#[derive(Debug, Clone, Default)]
pub struct RoleDefinition {
    /// Permission kind names granted by this definition
    pub granted: HashSet<String>,
}

/// The external global role definition registry, looked up by role name
/// during synchronization only
pub trait RoleDefinitionSource {
    fn find_by_name(&self, name: &str) -> Result<Option<RoleDefinition>>;
}

/// A source with no definitions; every role falls back to its hardcoded
/// defaults
pub struct NoExternalRoles;

impl RoleDefinitionSource for NoExternalRoles {
    fn find_by_name(&self, _name: &str) -> Result<Option<RoleDefinition>> {
        Ok(None)
    }
}

/// Hardcoded default grant for (role, kind), used when the external registry
/// has no definition for the role or cannot be reached
fn fallback_granted(role: ProjectRole, kind: PermissionKind) -> bool {
    match role {
        ProjectRole::Owner => true,
        ProjectRole::Admin => !matches!(
            kind,
            PermissionKind::ProjectDelete | PermissionKind::AdminSystemSettings
        ),
        ProjectRole::MemberEditor => matches!(
            kind,
            PermissionKind::ProjectView
                | PermissionKind::TaskView
                | PermissionKind::TaskCreate
                | PermissionKind::TaskEdit
                | PermissionKind::TaskComment
                | PermissionKind::KanbanView
                | PermissionKind::MeetingView
                | PermissionKind::MeetingCreate
        ),
    }
}

/// (Re)build the template store. Idempotent; safe to rerun.
///
/// Owner always gets every kind. Other roles mirror the external definition
/// matching their name when one exists; a missing definition or a failing
/// lookup falls back to the hardcoded defaults rather than aborting, since
/// the resolver depends on template completeness. All rows land in a single
/// transaction, so a partial template set is never observable.
pub fn sync_role_templates<S: RoleDefinitionSource>(source: &S) -> Result<()> {
    // Collaborator lookups happen before the write transaction opens.
    let mut external: Vec<(ProjectRole, Option<HashSet<String>>)> = Vec::new();
    for role in [ProjectRole::Admin, ProjectRole::MemberEditor] {
        let granted = match source.find_by_name(role.name()) {
            Ok(Some(def)) => Some(def.granted),
            Ok(None) => None,
            Err(e) => {
                warn!(role = role.name(), error = %e, "role definition lookup failed, using fallback defaults");
                None
            }
        };
        external.push((role, granted));
    }

    transact(|tx| {
        for kind in PermissionKind::ALL {
            tx.put_template(ProjectRole::Owner, kind, true)?;
        }
        for (role, granted) in &external {
            for kind in PermissionKind::ALL {
                let value = match granted {
                    Some(names) => names.contains(kind.name()),
                    None => fallback_granted(*role, kind),
                };
                tx.put_template(*role, kind, value)?;
            }
        }
        Ok(())
    })?;
    info!("role permission templates synchronized");
    Ok(())
}

/// Read the full template for a role: kind -> default granted
pub fn role_template(role: ProjectRole) -> Result<BTreeMap<PermissionKind, bool>> {
    let rows = read(|d, tx| list_pfx(tx, &d.templates, role as u64))?;
    if rows.is_empty() {
        return Err(PermError::NotFound(format!(
            "no permission template for role {}; templates not synchronized",
            role.name()
        )));
    }
    let mut map = BTreeMap::new();
    for (kind, granted) in rows {
        if let Some(kind) = PermissionKind::from_u8(kind as u8) {
            map.insert(kind, granted != 0);
        }
    }
    Ok(map)
}
