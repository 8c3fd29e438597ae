//! Porcelain operations (user-facing workflows)
//!
//! ## Commands
//!
//! - `init`: Create the store, the root commit and the `main` branch
//! - `add`: Stage a file
//! - `rm`: Stage a removal
//! - `commit`: Record the staged changes
//! - `branch`: Create or list branches
//! - `log`: Show first-parent history
//! - `status`: Show staged, unstaged and untracked files

pub mod add;
pub mod branch;
pub mod commit;
pub mod init;
pub mod log;
pub mod rm;
pub mod status;
