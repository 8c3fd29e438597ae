use crate::areas::workspace::Workspace;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::object::digest_of;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::status::file_change::IndexChange;
use crate::errors::Result;
use derive_new::new;
use std::path::Path;

#[derive(new)]
pub struct Inspector<'r> {
    workspace: &'r Workspace,
}

impl<'r> Inspector<'r> {
    fn is_content_changed(&self, path: &Path, expected: &ObjectId) -> Result<bool> {
        let data = self.workspace.read_file(path)?;
        let oid = digest_of(ObjectType::Blob, &data)?;

        Ok(&oid != expected)
    }

    /// Whether the working file at `path` differs from the blob `expected`
    ///
    /// When the file is staged with that very blob, matching stat metadata is
    /// taken as proof the content did not change and the file is not hashed.
    pub fn is_modified(
        &self,
        path: &Path,
        expected: &ObjectId,
        entry: Option<&IndexEntry>,
        stat: &EntryMetadata,
    ) -> Result<bool> {
        match entry {
            Some(entry) if &entry.oid == expected && entry.is_unchanged(stat) => Ok(false),
            Some(entry) if &entry.oid == expected && !entry.stat_match(stat) => Ok(true),
            Some(entry) if &entry.oid == expected => {
                tracing::debug!(path = %path.display(), "stale stat metadata, rehashing");
                self.is_content_changed(path, expected)
            }
            _ => self.is_content_changed(path, expected),
        }
    }

    pub fn check_index_against_head(
        &self,
        index_entry: Option<&IndexEntry>,
        head_oid: Option<&ObjectId>,
    ) -> Option<IndexChange> {
        match (index_entry, head_oid) {
            (Some(index_entry), Some(head_oid)) if &index_entry.oid != head_oid => {
                Some(IndexChange::Modified)
            }
            (Some(_), None) => Some(IndexChange::Added),
            (None, Some(_)) => Some(IndexChange::Deleted),
            _ => None,
        }
    }
}
