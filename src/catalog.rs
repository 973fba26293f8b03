//! Permission and role catalog
//!
//! Closed enumerations only. Every permission a project member can hold is a
//! `PermissionKind` variant, every position a member can occupy is a
//! `ProjectRole` variant. Template and override rows are keyed by the `u8`
//! discriminants, so the discriminants are part of the storage format and
//! must not be reordered.

use serde::{Deserialize, Serialize};

/// One atomic capability within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PermissionKind {
    ProjectView = 0,
    ProjectDelete = 1,
    ProjectManageMembers = 2,
    TaskCreate = 3,
    TaskView = 4,
    TaskEdit = 5,
    TaskMove = 6,
    TaskComment = 7,
    TaskAttach = 8,
    KanbanView = 9,
    KanbanManageColumns = 10,
    MeetingView = 11,
    MeetingCreate = 12,
    MeetingManageParticipants = 13,
    AdminSystemSettings = 14,
}

impl PermissionKind {
    /// Every permission kind, in discriminant order
    pub const ALL: [PermissionKind; 15] = [
        PermissionKind::ProjectView,
        PermissionKind::ProjectDelete,
        PermissionKind::ProjectManageMembers,
        PermissionKind::TaskCreate,
        PermissionKind::TaskView,
        PermissionKind::TaskEdit,
        PermissionKind::TaskMove,
        PermissionKind::TaskComment,
        PermissionKind::TaskAttach,
        PermissionKind::KanbanView,
        PermissionKind::KanbanManageColumns,
        PermissionKind::MeetingView,
        PermissionKind::MeetingCreate,
        PermissionKind::MeetingManageParticipants,
        PermissionKind::AdminSystemSettings,
    ];

    /// Stable machine name, also the name matched against external role
    /// definitions during template synchronization
    pub fn name(self) -> &'static str {
        match self {
            PermissionKind::ProjectView => "project_view",
            PermissionKind::ProjectDelete => "project_delete",
            PermissionKind::ProjectManageMembers => "project_manage_members",
            PermissionKind::TaskCreate => "task_create",
            PermissionKind::TaskView => "task_view",
            PermissionKind::TaskEdit => "task_edit",
            PermissionKind::TaskMove => "task_move",
            PermissionKind::TaskComment => "task_comment",
            PermissionKind::TaskAttach => "task_attach",
            PermissionKind::KanbanView => "kanban_view",
            PermissionKind::KanbanManageColumns => "kanban_manage_columns",
            PermissionKind::MeetingView => "meeting_view",
            PermissionKind::MeetingCreate => "meeting_create",
            PermissionKind::MeetingManageParticipants => "meeting_manage_participants",
            PermissionKind::AdminSystemSettings => "admin_system_settings",
        }
    }

    /// Human-readable description, carried into Forbidden errors
    pub fn description(self) -> &'static str {
        match self {
            PermissionKind::ProjectView => "view project details",
            PermissionKind::ProjectDelete => "delete the project",
            PermissionKind::ProjectManageMembers => "manage project members",
            PermissionKind::TaskCreate => "create tasks",
            PermissionKind::TaskView => "view tasks",
            PermissionKind::TaskEdit => "edit tasks",
            PermissionKind::TaskMove => "move tasks between columns",
            PermissionKind::TaskComment => "comment on tasks",
            PermissionKind::TaskAttach => "attach files to tasks",
            PermissionKind::KanbanView => "view the kanban board",
            PermissionKind::KanbanManageColumns => "manage kanban columns",
            PermissionKind::MeetingView => "view meetings",
            PermissionKind::MeetingCreate => "create meetings",
            PermissionKind::MeetingManageParticipants => "manage meeting participants",
            PermissionKind::AdminSystemSettings => "administer system settings",
        }
    }

    /// Parse a machine name back to a kind
    pub fn from_name(name: &str) -> Option<PermissionKind> {
        PermissionKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Decode a stored discriminant
    pub fn from_u8(v: u8) -> Option<PermissionKind> {
        PermissionKind::ALL.get(v as usize).copied()
    }
}

/// A member's coarse-grained position within one project
///
/// Owner is structurally privileged: always fully granted, never
/// individually editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProjectRole {
    Owner = 0,
    Admin = 1,
    MemberEditor = 2,
}

impl ProjectRole {
    /// Every role, in discriminant order
    pub const ALL: [ProjectRole; 3] = [
        ProjectRole::Owner,
        ProjectRole::Admin,
        ProjectRole::MemberEditor,
    ];

    /// Stable machine name, also the lookup key into the external global
    /// role definition registry
    pub fn name(self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Admin => "admin",
            ProjectRole::MemberEditor => "member_editor",
        }
    }

    /// Parse a machine name back to a role
    pub fn from_name(name: &str) -> Option<ProjectRole> {
        ProjectRole::ALL.iter().copied().find(|r| r.name() == name)
    }

    /// Decode a stored discriminant
    pub fn from_u8(v: u8) -> Option<ProjectRole> {
        ProjectRole::ALL.get(v as usize).copied()
    }
}
