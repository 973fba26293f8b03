//! Transaction wrapper for multi-step writes
//!
//! Every cascading mutation (role change, reset, lazy seeding) runs through
//! one `Tx`, so readers observe the delete-old/write-new sequence atomically.
//! LMDB serializes write transactions, which also serializes concurrent
//! initializers for the same member.

use heed::RwTxn;

use crate::catalog::{PermissionKind, ProjectRole};
use crate::db::{dbs, env, key, list_pfx, Dbs};
use crate::error::{err, PermError, Result};
use crate::members::{self, Member};

/// Transaction wrapper for multi-step writes
pub struct Tx {
    txn: Option<RwTxn<'static>>,
    dbs: &'static Dbs,
}

impl Tx {
    #[inline]
    pub(crate) fn new() -> Result<Self> {
        Ok(Tx {
            txn: Some(env()?.write_txn().map_err(err)?),
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        self.txn.as_mut().unwrap()
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(mut self) -> Result<()> {
        self.txn.take().unwrap().commit().map_err(err)
    }

    /// Upsert one template entry: (role, kind) -> default granted
    #[inline]
    pub fn put_template(&mut self, role: ProjectRole, kind: PermissionKind, granted: bool) -> Result<()> {
        self.dbs
            .templates
            .put(self.tx(), &key(role as u64, kind as u64), &(granted as u64))
            .map_err(err)
    }

    /// Upsert one override entry: (member, kind) -> granted
    #[inline]
    pub fn put_override(&mut self, member_id: u64, kind: PermissionKind, granted: bool) -> Result<()> {
        self.dbs
            .overrides
            .put(self.tx(), &key(member_id, kind as u64), &(granted as u64))
            .map_err(err)
    }

    /// True if the member has no override rows yet
    pub fn overrides_empty(&mut self, member_id: u64) -> Result<bool> {
        let txn = self.txn.as_ref().unwrap();
        Ok(self
            .dbs
            .overrides
            .prefix_iter(txn, &member_id.to_be_bytes())
            .map_err(err)?
            .next()
            .is_none())
    }

    /// Copy every template row for `role` into the member's overrides
    pub fn seed_overrides(&mut self, member_id: u64, role: ProjectRole) -> Result<()> {
        let rows = {
            let txn = self.txn.as_ref().unwrap();
            list_pfx(txn, &self.dbs.templates, role as u64)?
        };
        for (kind, granted) in rows {
            self.dbs
                .overrides
                .put(self.tx(), &key(member_id, kind), &granted)
                .map_err(err)?;
        }
        Ok(())
    }

    /// Delete every override row for a member, returning the count removed
    pub fn delete_overrides(&mut self, member_id: u64) -> Result<usize> {
        let keys: Vec<[u8; 16]> = {
            let txn = self.txn.as_ref().unwrap();
            let mut v = Vec::new();
            for item in self
                .dbs
                .overrides
                .prefix_iter(txn, &member_id.to_be_bytes())
                .map_err(err)?
            {
                let (k, _) = item.map_err(err)?;
                if k.len() == 16 {
                    v.push(k.try_into().unwrap());
                }
            }
            v
        };
        for k in &keys {
            self.dbs.overrides.delete(self.tx(), k).map_err(err)?;
        }
        Ok(keys.len())
    }

    /// Register a project member; (project, person) must be unique
    pub fn add_member(&mut self, project_id: u64, person_id: u64, role: ProjectRole) -> Result<Member> {
        let idx_key = key(project_id, person_id);
        let existing = {
            let txn = self.txn.as_ref().unwrap();
            self.dbs.member_idx.get(txn, &idx_key).map_err(err)?
        };
        if existing.is_some() {
            return Err(PermError::InvalidInput(format!(
                "person {} is already a member of project {}",
                person_id, project_id
            )));
        }
        let id = self.next_id()?;
        let member = Member {
            id,
            project_id,
            person_id,
            role,
            joined_at: members::now_millis(),
        };
        self.dbs
            .members
            .put(self.tx(), &id.to_be_bytes(), &members::encode(&member))
            .map_err(err)?;
        self.dbs.member_idx.put(self.tx(), &idx_key, &id).map_err(err)?;
        self.set_next_id(id + 1)?;
        Ok(member)
    }

    /// Fetch a member record inside this transaction
    pub fn get_member(&mut self, member_id: u64) -> Result<Option<Member>> {
        let txn = self.txn.as_ref().unwrap();
        match self.dbs.members.get(txn, &member_id.to_be_bytes()).map_err(err)? {
            Some(raw) => members::decode(member_id, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Persist a member's new role
    pub fn set_member_role(&mut self, member_id: u64, role: ProjectRole) -> Result<()> {
        let mut member = self
            .get_member(member_id)?
            .ok_or_else(|| PermError::NotFound(format!("member {}", member_id)))?;
        member.role = role;
        self.dbs
            .members
            .put(self.tx(), &member_id.to_be_bytes(), &members::encode(&member))
            .map_err(err)
    }

    pub(crate) fn next_id(&mut self) -> Result<u64> {
        let txn = self.txn.as_ref().unwrap();
        Ok(self
            .dbs
            .meta
            .get(txn, "next_id")
            .map_err(err)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(1u64))
    }

    pub(crate) fn set_next_id(&mut self, id: u64) -> Result<()> {
        self.dbs.meta.put(self.tx(), "next_id", &id.to_string()).map_err(err)
    }
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::new()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
