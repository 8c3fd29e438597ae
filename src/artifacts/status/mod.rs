//! Working tree status inspection
//!
//! Compares the working directory against the staging area and the HEAD
//! commit.
//!
//! ## Components
//!
//! - `file_change`: Enum types for categorizing changes
//! - `inspector`: Per-file change detection with the stat fast path
//! - `status_info`: Status report aggregation and display

pub mod file_change;
pub mod inspector;
pub mod status_info;
