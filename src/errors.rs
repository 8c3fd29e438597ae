//! Error taxonomy of the storage and versioning core
//!
//! Every failure surfaces as a distinct variant so callers can react to it
//! (the binary renders them, tests match on them). Nothing in the core aborts
//! the process or retries on its own.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not shaped like an object ID (or a usable prefix of one)
    #[error("invalid object id: {0:?}")]
    InvalidDigest(String),

    #[error("no object found for {0}")]
    NotFound(String),

    #[error("short object id {prefix} is ambiguous")]
    AmbiguousPrefix {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("not a gitlet repository: {0}")]
    RepositoryNotInitialized(PathBuf),

    #[error("a gitlet repository already exists in {0}")]
    AlreadyInitialized(PathBuf),

    #[error("file does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("no changes added to the commit")]
    NothingToCommit,

    #[error("no reason to remove the file: {0}")]
    NothingToRemove(PathBuf),

    #[error("branch {0} does not exist")]
    NoSuchBranch(String),

    #[error("branch {0} already exists")]
    BranchExists(String),

    #[error("invalid branch name: {0:?}")]
    InvalidBranchName(String),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    /// Persisted state failed to decode or verify
    #[error("corrupt record {what}: {reason}")]
    CorruptRecord { what: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn corrupt(what: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Error::CorruptRecord {
            what: what.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the on-disk state is damaged, as opposed to misuse
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptRecord { .. })
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Error::Io(error.into())
    }
}
