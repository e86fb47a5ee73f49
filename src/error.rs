use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("unknown file-type (bad magic number)")]
    InvalidMagic,

    #[error("corrupt database header: {0}")]
    CorruptHeader(String),

    #[error("slot index out of bounds: {slot}, slot-count={count}")]
    OutOfBounds { slot: u32, count: u32 },

    #[error("record not found")]
    NotFound,

    #[error("record #{slot} already has key {key:?}")]
    DuplicateKey { slot: u32, key: String },

    #[error("record #{0} is already locked")]
    AlreadyLocked(u32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("attempting to unlock a lock that isn't held")]
    NotLocked,

    #[error("internal consistency violation: {0}")]
    Inconsistency(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote transport failure: {0}")]
    Transport(String),

    #[error("unable to save configuration: {0}")]
    ConfigSave(String),
}

impl DbError {
    /// Whether a caller can meaningfully recover by changing its input or
    /// re-querying. Transport and storage faults are terminal for the
    /// current session and must not be retried with the same state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DbError::NotFound | DbError::DuplicateKey { .. } | DbError::AlreadyLocked(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
