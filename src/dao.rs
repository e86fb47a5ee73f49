//! The location-transparent access facade.
//!
//! [`Dao`] is the one contract every caller programs against, whether the
//! implementation runs in-process ([`DirectDao`]) or forwards across a
//! network boundary. A transport adapter implements [`Dao`] by forwarding
//! each call verbatim and translating every transport-level failure to
//! [`DbError::Transport`], keeping it distinguishable from the domain
//! outcomes so callers can retry transport errors but never domain ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{DbError, Result};
use crate::schema::FieldDescriptor;

/// A self-contained record value: slot id plus one value per schema
/// field. Mutating a `Record` never touches stored state until it is
/// passed to [`Dao::update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: u32,
    fields: Vec<String>,
}

impl Record {
    pub fn new(id: u32, fields: Vec<String>) -> Self {
        Record { id, fields }
    }

    /// The record's slot index.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Value of the field at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn field(&self, index: usize) -> &str {
        &self.fields[index]
    }

    /// Replaces the field value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn set_field(&mut self, index: usize, value: impl Into<String>) {
        self.fields[index] = value.into();
    }

    /// All field values in schema order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// High-level record access, identical for local and remote callers.
pub trait Dao: Send + Sync {
    /// The database's field definitions.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Searches for records matching the criteria and returns each match
    /// with its current contents.
    fn find(&self, criteria: &[Option<String>]) -> Result<Vec<Record>>;

    /// Locks a record and returns its current contents. Fails with
    /// [`DbError::AlreadyLocked`] when the record is known to be locked
    /// instead of blocking.
    fn lock(&self, id: u32) -> Result<Record>;

    /// Unlocks a record.
    fn unlock(&self, id: u32) -> Result<()>;

    /// Writes a record's values back. Calling this without a prior
    /// successful [`Dao::lock`] yields undefined results.
    fn update(&self, record: &Record) -> Result<()>;
}

/// In-process binding of [`Dao`] to a [`Database`].
pub struct DirectDao {
    db: Arc<Database>,
}

impl DirectDao {
    pub fn new(db: Arc<Database>) -> Self {
        DirectDao { db }
    }
}

impl Dao for DirectDao {
    fn fields(&self) -> Vec<FieldDescriptor> {
        self.db.fields().to_vec()
    }

    fn find(&self, criteria: &[Option<String>]) -> Result<Vec<Record>> {
        let slots = self.db.find(criteria)?;

        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            records.push(Record::new(slot, self.db.read(slot)?));
        }
        Ok(records)
    }

    fn lock(&self, id: u32) -> Result<Record> {
        // Advisory check: a racing caller may still grab the lock between
        // this test and lock() below, in which case we block until it
        // releases. Real exclusivity comes from the record lock itself;
        // "already locked" reporting is best-effort.
        if self.db.is_locked(id)? {
            return Err(DbError::AlreadyLocked(id));
        }

        self.db.lock(id)?;
        Ok(Record::new(id, self.db.read(id)?))
    }

    fn unlock(&self, id: u32) -> Result<()> {
        self.db.unlock(id)
    }

    fn update(&self, record: &Record) -> Result<()> {
        self.db.update(record.id(), record.fields())
    }
}

/// Decorator that logs every facade call and its outcome; the explicit
/// stand-in for runtime-generated instrumentation proxies.
pub struct LoggedDao<D> {
    inner: D,
}

impl<D: Dao> LoggedDao<D> {
    pub fn new(inner: D) -> Self {
        LoggedDao { inner }
    }
}

impl<D: Dao> Dao for LoggedDao<D> {
    fn fields(&self) -> Vec<FieldDescriptor> {
        tracing::debug!("fields()");
        self.inner.fields()
    }

    fn find(&self, criteria: &[Option<String>]) -> Result<Vec<Record>> {
        let result = self.inner.find(criteria);
        match &result {
            Ok(records) => tracing::debug!(?criteria, matches = records.len(), "find"),
            Err(e) => tracing::debug!(?criteria, error = %e, "find failed"),
        }
        result
    }

    fn lock(&self, id: u32) -> Result<Record> {
        let result = self.inner.lock(id);
        match &result {
            Ok(_) => tracing::debug!(id, "lock"),
            Err(e) => tracing::debug!(id, error = %e, "lock failed"),
        }
        result
    }

    fn unlock(&self, id: u32) -> Result<()> {
        let result = self.inner.unlock(id);
        match &result {
            Ok(()) => tracing::debug!(id, "unlock"),
            Err(e) => tracing::debug!(id, error = %e, "unlock failed"),
        }
        result
    }

    fn update(&self, record: &Record) -> Result<()> {
        let result = self.inner.update(record);
        match &result {
            Ok(()) => tracing::debug!(id = record.id(), "update"),
            Err(e) => tracing::debug!(id = record.id(), error = %e, "update failed"),
        }
        result
    }
}
