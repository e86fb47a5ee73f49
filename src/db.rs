//! Schema, uniqueness and locking policy on top of [`RecordFile`].
//!
//! Each record moves through `NonExistent → Active{unlocked} ⇄
//! Active{locked} → Deleted`; only a locked record may be updated or
//! deleted. Records are assigned a composite key built from the two
//! identity fields, unique among all non-deleted records.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DbError, Result};
use crate::lock::RecordLock;
use crate::schema::{self, FieldDescriptor};
use crate::store::RecordFile;

/// A searchable, lockable record database over a single file.
///
/// All methods take `&self`; one coarse mutex serializes file access and
/// lock-table mutation across threads.
pub struct Database {
    state: Mutex<State>,
    /// Copy of the file's schema, readable without the state mutex.
    fields: Vec<FieldDescriptor>,
}

/// Everything guarded by the state mutex: the file handle and the
/// per-record lock table. Lock-table entries are created lazily on the
/// first lock attempt and removed only when the record is deleted; an
/// entry removed on plain unlock could race a thread that already fetched
/// the handle.
struct State {
    file: RecordFile,
    locks: HashMap<u32, Arc<RecordLock>>,
}

impl Database {
    /// Opens a record database over an existing file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::info!(path = %path.as_ref().display(), "opening database");

        let file = RecordFile::open(path)?;
        let fields = file.fields().to_vec();
        if fields.len() <= schema::KEY_ORDINALS.1 {
            return Err(DbError::CorruptHeader(
                "schema is missing the identity fields".into(),
            ));
        }

        Ok(Database {
            state: Mutex::new(State {
                file,
                locks: HashMap::new(),
            }),
            fields,
        })
    }

    /// The database's field definitions.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of active (non-deleted) records.
    pub fn size(&self) -> u32 {
        self.state.lock().file.active_count()
    }

    /// Creates a new record, reusing a deleted slot when one exists.
    /// Fails with [`DbError::DuplicateKey`] if an active record already
    /// carries the same composite key.
    pub fn create(&self, values: &[String]) -> Result<u32> {
        let mut state = self.state.lock();
        state.file.verify_field_shape(values)?;
        state.verify_unique_key(values, None)?;

        let slot = state.file.create()?;
        state.file.write(slot, values)?;
        Ok(slot)
    }

    /// Reads an active record's field values.
    pub fn read(&self, slot: u32) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        state.verify_active(slot)?;
        state.file.read(slot)
    }

    /// Replaces an active record's field values. The caller must hold the
    /// record's lock; a key collision at this point means some caller
    /// bypassed the lock-read-update cycle and is surfaced as
    /// [`DbError::Inconsistency`] rather than a plain duplicate-key error.
    pub fn update(&self, slot: u32, values: &[String]) -> Result<()> {
        let mut state = self.state.lock();
        state.verify_active(slot)?;
        state.file.verify_field_shape(values)?;

        debug_assert!(state.holds_lock(slot), "update requires the record lock");

        match state.verify_unique_key(values, Some(slot)) {
            Err(DbError::DuplicateKey { slot: other, key }) => {
                return Err(DbError::Inconsistency(format!(
                    "update of record #{slot} collides with key {key:?} of record #{other}"
                )));
            }
            result => result?,
        }

        state.file.write(slot, values)
    }

    /// Deletes an active record and retires its lock entry. The caller
    /// must hold the record's lock; deletion releases it.
    pub fn delete(&self, slot: u32) -> Result<()> {
        let mut state = self.state.lock();
        state.verify_active(slot)?;

        debug_assert!(state.holds_lock(slot), "delete requires the record lock");

        state.file.delete(slot)?;
        if let Some(lock) = state.locks.remove(&slot) {
            lock.unlock()?;
        }
        Ok(())
    }

    /// Searches all active records in ascending slot order. Criteria hold
    /// one entry per schema field; `None` matches anything, `Some(s)`
    /// matches values starting with `s`, case-insensitively. Zero matches
    /// fail with [`DbError::NotFound`].
    pub fn find(&self, criteria: &[Option<String>]) -> Result<Vec<u32>> {
        if criteria.len() != self.fields.len() {
            return Err(DbError::InvalidArgument(format!(
                "invalid number of criteria: {} (schema has {})",
                criteria.len(),
                self.fields.len()
            )));
        }

        let mut state = self.state.lock();
        let mut matches = Vec::new();
        for slot in 0..state.file.slot_count()? {
            if state.file.is_deleted(slot)? {
                continue;
            }
            if is_match(criteria, &state.file.read(slot)?) {
                matches.push(slot);
            }
        }

        if matches.is_empty() {
            Err(DbError::NotFound)
        } else {
            Ok(matches)
        }
    }

    /// Whether an active record is currently locked. A record without a
    /// lock-table entry has never been locked and reports unlocked.
    pub fn is_locked(&self, slot: u32) -> Result<bool> {
        let mut state = self.state.lock();
        state.verify_active(slot)?;
        Ok(state.holds_lock(slot))
    }

    /// Acquires an active record's lock, blocking while another caller
    /// holds it.
    pub fn lock(&self, slot: u32) -> Result<()> {
        let handle = {
            let mut state = self.state.lock();
            state.verify_active(slot)?;
            Arc::clone(
                state
                    .locks
                    .entry(slot)
                    .or_insert_with(|| Arc::new(RecordLock::new())),
            )
        };

        // The wait must happen outside the state mutex: unlock() needs
        // that mutex, so blocking here while holding it would deadlock
        // every releaser.
        handle.lock();
        Ok(())
    }

    /// Releases an active record's lock. Fails with [`DbError::NotLocked`]
    /// if the record isn't locked. The lock-table entry stays in place.
    pub fn unlock(&self, slot: u32) -> Result<()> {
        let mut state = self.state.lock();
        state.verify_active(slot)?;
        let lock = state.locks.get(&slot).ok_or(DbError::NotLocked)?;
        lock.unlock()
    }

    /// Flushes and closes the database file. Consuming `self` makes any
    /// further use a compile error; reopening requires a new
    /// [`Database::open`].
    pub fn close(self) -> Result<()> {
        tracing::info!("closing database");
        self.state.into_inner().file.close()
    }
}

impl State {
    /// A slot outside the file or flagged deleted doesn't name a record.
    fn verify_active(&mut self, slot: u32) -> Result<()> {
        match self.file.is_deleted(slot) {
            Ok(false) => Ok(()),
            Ok(true) | Err(DbError::OutOfBounds { .. }) => Err(DbError::NotFound),
            Err(e) => Err(e),
        }
    }

    fn holds_lock(&self, slot: u32) -> bool {
        self.locks.get(&slot).map_or(false, |lock| lock.is_locked())
    }

    /// Scans every non-deleted slot (except `except`, for updates) for a
    /// record with the same composite key.
    fn verify_unique_key(&mut self, values: &[String], except: Option<u32>) -> Result<()> {
        let key = schema::composite_key(values);

        for slot in 0..self.file.slot_count()? {
            if Some(slot) == except || self.file.is_deleted(slot)? {
                continue;
            }
            if key == schema::composite_key(&self.file.read(slot)?) {
                return Err(DbError::DuplicateKey { slot, key });
            }
        }
        Ok(())
    }
}

fn is_match(criteria: &[Option<String>], values: &[String]) -> bool {
    criteria
        .iter()
        .zip(values)
        .all(|(criterion, value)| match criterion {
            None => true,
            Some(prefix) => value.to_lowercase().starts_with(&prefix.to_lowercase()),
        })
}
