//! Project member registry
//!
//! Membership CRUD proper lives with the surrounding application; this module
//! carries only the surface the permission engine consumes, plus
//! `add_member` so the engine has members to resolve against. Role changes go
//! through `manage::update_member_role`, never directly through here.

use byteorder::{BigEndian, ByteOrder};
use heed::RoTxn;
use serde::Serialize;

use crate::catalog::ProjectRole;
use crate::db::{key, list_pfx, read, Dbs};
use crate::error::{err, PermError, Result};
use crate::tx::transact;

/// One project membership: a person holding a role within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: u64,
    pub project_id: u64,
    pub person_id: u64,
    pub role: ProjectRole,
    /// Unix epoch milliseconds
    pub joined_at: u64,
}

// Record layout: project(8) person(8) role(1) joined_at(8)
const RECORD_LEN: usize = 25;

pub(crate) fn encode(m: &Member) -> [u8; RECORD_LEN] {
    let mut b = [0u8; RECORD_LEN];
    BigEndian::write_u64(&mut b[0..8], m.project_id);
    BigEndian::write_u64(&mut b[8..16], m.person_id);
    b[16] = m.role as u8;
    BigEndian::write_u64(&mut b[17..25], m.joined_at);
    b
}

pub(crate) fn decode(id: u64, raw: &[u8]) -> Result<Member> {
    if raw.len() != RECORD_LEN {
        return Err(PermError::Store(format!("corrupt member record {}", id)));
    }
    let role = ProjectRole::from_u8(raw[16])
        .ok_or_else(|| PermError::Store(format!("corrupt role byte for member {}", id)))?;
    Ok(Member {
        id,
        project_id: BigEndian::read_u64(&raw[0..8]),
        person_id: BigEndian::read_u64(&raw[8..16]),
        role,
        joined_at: BigEndian::read_u64(&raw[17..25]),
    })
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Register a new project member. Overrides stay uninitialized until the
/// first permission lookup.
pub fn add_member(project_id: u64, person_id: u64, role: ProjectRole) -> Result<Member> {
    transact(|tx| tx.add_member(project_id, person_id, role))
}

/// Fetch a member by id within an existing read transaction
pub(crate) fn get_member_in(d: &Dbs, tx: &RoTxn, member_id: u64) -> Result<Option<Member>> {
    match d.members.get(tx, &member_id.to_be_bytes()).map_err(err)? {
        Some(raw) => decode(member_id, raw).map(Some),
        None => Ok(None),
    }
}

/// Fetch a member by id
pub fn get_member(member_id: u64) -> Result<Option<Member>> {
    read(|d, tx| get_member_in(d, tx, member_id))
}

/// Find the membership of a person within a project, if any
pub fn find_member(project_id: u64, person_id: u64) -> Result<Option<Member>> {
    let id = read(|d, tx| d.member_idx.get(tx, &key(project_id, person_id)).map_err(err))?;
    match id {
        Some(id) => get_member(id),
        None => Ok(None),
    }
}

/// List every member of a project
pub fn members_of_project(project_id: u64) -> Result<Vec<Member>> {
    let ids: Vec<u64> = read(|d, tx| list_pfx(tx, &d.member_idx, project_id))?
        .into_iter()
        .map(|(_person, id)| id)
        .collect();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(m) = get_member(id)? {
            out.push(m);
        }
    }
    Ok(out)
}
