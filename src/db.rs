//! Database types and global state

use std::path::Path;
use std::sync::{Mutex, OnceLock};
use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn};

use crate::error::{err, PermError, Result};

// Database type aliases
pub type Db = Database<Bytes, U64<byteorder::BigEndian>>;
pub type DbRec = Database<Bytes, Bytes>;

/// Create a 16-byte key from two u64 values
#[inline]
pub fn key(a: u64, b: u64) -> [u8; 16] {
    let a = a.to_be_bytes();
    let b = b.to_be_bytes();
    [a[0], a[1], a[2], a[3], a[4], a[5], a[6], a[7],
     b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// All database handles
///
/// `templates` and `overrides` map composite keys to 0/1 grant flags:
/// `key(role, kind)` and `key(member_id, kind)` respectively. Key
/// uniqueness in LMDB is what makes "exactly one row per (member, kind)"
/// a storage-level constraint instead of an application convention.
pub struct Dbs {
    /// key(role, kind) -> defaultGranted (0/1)
    pub templates: Db,
    /// key(member_id, kind) -> granted (0/1)
    pub overrides: Db,
    /// member_id (be8) -> fixed-width member record
    pub members: DbRec,
    /// key(project_id, person_id) -> member_id
    pub member_idx: Db,
    /// counters and markers
    pub meta: Database<Str, Str>,
}

// Global state
pub static ENV: OnceLock<Env> = OnceLock::new();
pub static DBS: OnceLock<Dbs> = OnceLock::new();
pub static TEST_LOCK: Mutex<()> = Mutex::new(());
pub static INIT_PATH: OnceLock<String> = OnceLock::new();

/// Get the database handles, or error if not initialized
#[inline]
pub fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or_else(|| PermError::Store("not initialized".into()))
}

/// Get the environment, or error if not initialized
#[inline]
pub fn env() -> Result<&'static Env> {
    ENV.get().ok_or_else(|| PermError::Store("not initialized".into()))
}

/// Execute a read-only operation
#[inline]
pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(dbs()?, &env()?.read_txn().map_err(err)?)
}

/// Initialize the database (idempotent for the same path)
pub fn init(path: &str) -> Result<()> {
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(PermError::Store(format!("already initialized at {}", p)))
        };
    }
    std::fs::create_dir_all(path).map_err(err)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(1 << 30)
            .max_dbs(5)
            .open(Path::new(path))
            .map_err(err)?
    };
    let mut tx = e.write_txn().map_err(err)?;
    let d = Dbs {
        templates: e.create_database(&mut tx, Some("templates")).map_err(err)?,
        overrides: e.create_database(&mut tx, Some("overrides")).map_err(err)?,
        members: e.create_database(&mut tx, Some("members")).map_err(err)?,
        member_idx: e.create_database(&mut tx, Some("member_idx")).map_err(err)?,
        meta: e.create_database(&mut tx, Some("meta")).map_err(err)?,
    };
    tx.commit().map_err(err)?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    Ok(())
}

/// Clear all databases (for testing)
pub fn clear_all() -> Result<()> {
    crate::tx::transact(|tx| {
        tx.dbs().templates.clear(tx.tx()).map_err(err)?;
        tx.dbs().overrides.clear(tx.tx()).map_err(err)?;
        tx.dbs().members.clear(tx.tx()).map_err(err)?;
        tx.dbs().member_idx.clear(tx.tx()).map_err(err)?;
        tx.dbs().meta.clear(tx.tx()).map_err(err)
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

/// List (b, value) pairs for every key with prefix `a`
pub(crate) fn list_pfx(tx: &RoTxn, db: &Db, a: u64) -> Result<Vec<(u64, u64)>> {
    let mut r = Vec::new();
    for item in db.prefix_iter(tx, &a.to_be_bytes()).map_err(err)? {
        let (k, v) = item.map_err(err)?;
        if k.len() == 16 {
            r.push((u64::from_be_bytes(k[8..16].try_into().unwrap()), v));
        }
    }
    Ok(r)
}
