//! Gitlet data structures and algorithms
//!
//! - `branch`: Branch name validation
//! - `index`: Staging area record formats
//! - `log`: History traversal and ancestry queries
//! - `objects`: Object types (blob, commit) and identifiers
//! - `status`: Working tree status inspection

pub mod branch;
pub mod index;
pub mod log;
pub mod objects;
pub mod status;
