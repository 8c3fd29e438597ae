//! Repository operations
//!
//! Each operation is an `impl Repository` block in its own file, organized
//! into two categories following Git's architecture:
//!
//! - `plumbing`: Low-level operations on records (commit writing, object lookup,
//!   integrity checks, ancestry queries)
//! - `porcelain`: User-facing operations (init, add, rm, commit, branch, log, status)
//!
//! Plumbing operations provide building blocks, while porcelain operations
//! compose them into version control workflows.

pub mod plumbing;
pub mod porcelain;
