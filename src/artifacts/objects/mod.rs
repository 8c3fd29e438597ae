//! Gitlet object types and operations
//!
//! Gitlet stores its history as content-addressed objects identified by SHA-1
//! hashes. There are two kinds of records in the object database:
//!
//! - **Blob**: File content (raw bytes)
//! - **Commit**: Snapshot of tracked paths plus metadata (message, timestamps, parents)
//!
//! Each kind has its own explicit, versioned payload encoding. On disk every
//! record is framed as `<kind> <size>\0<payload>` and the object ID is the hash
//! of exactly that frame.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Shortest abbreviation accepted as a unique object reference
pub const MIN_PREFIX_LENGTH: usize = 7;

/// Length of the shard directory name under `objects/`
pub const SHARD_LENGTH: usize = 2;
