use rusqlite::ffi;
use thiserror::Error;

/// Typed failures surfaced to the API layer. Nothing here is transient;
/// no operation is retried internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint hit (duplicate username/email).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Input outside its allowed range (connection strength, self-loop).
    #[error("invalid value: {0}")]
    InvalidRange(String),

    /// The unordered pair already has an edge, in either orientation.
    #[error("connection between users {0} and {1} already exists")]
    DuplicateEdge(i64, i64),

    /// A referenced row does not exist.
    #[error("referenced {0} does not exist")]
    ForeignKeyViolation(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

/// Classify SQLite constraint failures into the typed taxonomy. The query
/// layer pre-checks the interesting cases to attach real ids and values;
/// this mapping is the race-safe backstop when a concurrent writer slips
/// between the pre-check and the insert.
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref e, ref msg) = err {
            let detail = || msg.clone().unwrap_or_else(|| "constraint failed".to_string());
            match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::ConstraintViolation(detail());
                }
                ffi::SQLITE_CONSTRAINT_CHECK => {
                    return StoreError::InvalidRange(detail());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::ForeignKeyViolation("row");
                }
                _ => {}
            }
        }
        StoreError::Sqlite(err)
    }
}
