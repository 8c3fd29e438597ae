//! Gitlet: a small content-addressed version control core
//!
//! - `areas`: stateful on-disk areas (object database, staging area, refs,
//!   working directory) and the `Repository` aggregate that owns them
//! - `artifacts`: value types and algorithms (objects, index records, branch
//!   names, history traversal, status)
//! - `commands`: repository operations, one `impl Repository` block per file
//! - `errors`: the error taxonomy shared by everything above

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use areas::repository::Repository;
pub use errors::{Error, Result};
