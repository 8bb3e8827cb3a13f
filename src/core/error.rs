use thiserror::Error;

/// Faults surfaced by the storage collaborator.
///
/// Anything the store (or the translation into its scan requests) can fail
/// with lands here; the query layer wraps it in [`QueryError::Storage`]
/// without retrying.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Column count mismatch")]
    ColumnCountMismatch,
    #[error("Type mismatch")]
    TypeMismatch,
    #[error("Column '{0}' does not accept NULL")]
    NullConstraint(String),
    #[error("Identity column '{0}' is assigned by the store")]
    IdentityColumn(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Faults raised by the query layer.
///
/// Construction faults (`InvalidPredicate`, `InvalidGrouping`, `InvalidJoin`,
/// `InvalidQuery`) surface from predicate constructors or `build()`, before
/// any I/O. Execution faults (`TooManyResults`, `Storage`) surface only from
/// the `fetch_*` entry points.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Invalid grouping: {0}")]
    InvalidGrouping(String),
    #[error("Invalid join: {0}")]
    InvalidJoin(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Expected at most one result, {matched} rows matched")]
    TooManyResults { matched: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
