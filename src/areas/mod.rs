//! Core repository components
//!
//! This module contains the stateful building blocks of a Gitlet repository:
//!
//! - `database`: Content-addressed object store for blobs and commits
//! - `index`: Staging area tracking pending changes
//! - `lock`: Repository-wide advisory lock
//! - `refs`: HEAD and branch references
//! - `repository`: Aggregate root coordinating the areas
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod lock;
pub mod refs;
pub mod repository;
pub mod workspace;
