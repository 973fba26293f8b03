//! Permgate - project-scoped role-based access control
//!
//! Maintains default permission templates per project role, synchronized at
//! startup from an external role registry (with hardcoded fallbacks),
//! materializes per-member permission overrides lazily on first lookup, and
//! resolves effective access with a global super-admin bypass. Role changes
//! and resets cascade: overrides are wiped and re-derived from the role's
//! current template in one transaction.
//!
//! ```ignore
//! permgate::init("/var/lib/permgate")?;
//! permgate::sync_role_templates(&NoExternalRoles)?;
//!
//! let m = permgate::add_member(project, person, ProjectRole::MemberEditor)?;
//! let actor = Actor::person(person);
//! if permgate::has_permission(&actor, project, PermissionKind::TaskCreate)? {
//!     // ...
//! }
//! ```

mod catalog;
mod db;
mod error;
mod manage;
mod members;
mod overrides;
mod resolve;
mod templates;
mod tx;

pub use catalog::{PermissionKind, ProjectRole};
pub use db::{clear_all, init, test_lock};
pub use error::{PermError, Result};
pub use manage::{reset_to_default_permissions, update_member_permissions, update_member_role};
pub use members::{add_member, find_member, get_member, members_of_project, Member};
pub use resolve::{
    all_member_permissions, all_permission_kinds, check_permission, has_permission,
    member_permissions, Actor, MemberPermissions,
};
pub use templates::{
    role_template, sync_role_templates, NoExternalRoles, RoleDefinition, RoleDefinitionSource,
};
pub use tx::{transact, Tx};
