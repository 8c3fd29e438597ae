//! Commit history traversal
//!
//! - `ancestry`: ancestor checks, partial-order comparison and merge bases
//! - `rev_list`: first-parent history walk used by `log`

pub mod ancestry;
pub mod rev_list;
