//! Gitlet staging area file format
//!
//! The staging area (index) records the changes pending for the next commit.
//! It is Repository-owned mutable state, persisted as one versioned binary
//! record outside the object database.
//!
//! ## File Format (Version 1)
//!
//! ```text
//! Header (36 bytes):
//!   - Signature: "GLIX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Staged entry count (4 bytes)
//!   - Staged removal count (4 bytes)
//!   - Base commit ID, all zeroes when unset (20 bytes)
//!
//! Staged entries (variable length):
//!   - Timestamps, size, blob ID, path length, path
//!
//! Staged removals (variable length):
//!   - Blob ID being removed, path length, path
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 36; // 4 marker, 4 version, 4 + 4 counts, 20 base commit

/// Magic signature identifying index files
pub const SIGNATURE: &str = "GLIX";

/// Index file format version
pub const VERSION: u32 = 1;
