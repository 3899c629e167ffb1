// ⚠️ Error types - storage failures and invalid match requests
// "No match" is never an error: it is an absent field in MatchResult.

use thiserror::Error;

/// Failure of the storage read collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a match call
#[derive(Error, Debug)]
pub enum MatchError {
    /// Caller supplied neither `text` nor `entities`
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A catalog read failed; no partial result is produced
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
