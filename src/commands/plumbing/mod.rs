//! Plumbing operations (low-level record access)
//!
//! ## Commands
//!
//! - `cat-file`: Resolve an abbreviated ID and load the object
//! - `merge-base`: Ancestry checks and best common ancestors
//! - `verify`: Recompute a stored record's digest
//! - `write-commit`: Persist a commit and move HEAD to it

pub mod cat_file;
pub mod merge_base;
pub mod verify;
pub mod write_commit;
