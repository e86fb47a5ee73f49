//! Cardfile record store
//!
//! A single-file database for fixed-schema records: searchable by
//! case-insensitive prefix criteria and editable under per-record
//! exclusivity locking.
//!
//! ## Features
//!
//! - **Flat binary format** with a self-describing field schema in the
//!   header
//! - **Fixed-width slots** reused after deletion, addressed by index
//! - **Composite-key uniqueness** over the two identity fields
//! - **Prefix search** across all fields with per-field criteria
//! - **Ownerless record locks** so a lock may be released by any thread
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Dao (dao)                                   │
//! │  - one contract for local + remote callers  │
//! │  - Record values, AlreadyLocked narrowing   │
//! ├─────────────────────────────────────────────┤
//! │ Database (db)                               │
//! │  - schema validation, key uniqueness        │
//! │  - record lifecycle + lock table            │
//! ├─────────────────────────────────────────────┤
//! │ RecordLock (lock)   │ RecordFile (store)    │
//! │  - binary semaphore │  - header + slot I/O  │
//! ├─────────────────────┴───────────────────────┤
//! │ database file                               │
//! │  magic │ schema │ flag+record │ flag+record │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cardfile::{Dao, Database, DirectDao};
//!
//! # fn main() -> cardfile::Result<()> {
//! let db = Arc::new(Database::open("database.db")?);
//! let dao = DirectDao::new(db);
//!
//! // every field unconstrained except the location
//! let mut criteria: Vec<Option<String>> =
//!     dao.fields().iter().map(|_| None).collect();
//! criteria[1] = Some("Smallville".into());
//!
//! for record in dao.find(&criteria)? {
//!     let mut record = dao.lock(record.id())?;
//!     record.set_field(5, "90210");
//!     dao.update(&record)?;
//!     dao.unlock(record.id())?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dao;
pub mod db;
pub mod error;
pub mod lock;
pub mod schema;
pub mod store;

pub use config::{Config, Mode, Setting};
pub use dao::{Dao, DirectDao, LoggedDao, Record};
pub use db::Database;
pub use error::{DbError, Result};
pub use lock::RecordLock;
pub use schema::{FieldDescriptor, FieldType};
pub use store::{RecordFile, MAGIC};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
