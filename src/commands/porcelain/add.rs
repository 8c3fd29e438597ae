use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::path::Path;

impl Repository {
    /// Stage the working copy of `path` and return its blob ID
    ///
    /// A file already staged with matching size and timestamps is not read
    /// again.
    pub fn add(&mut self, path: &Path) -> Result<ObjectId> {
        self.ensure_initialized()?;
        let path = self.workspace().normalize(path)?;

        let _lock = self.lock()?;
        self.load_index()?;
        let head_id = self.head_commit_id()?;

        let stat = self.workspace().stat_file(&path)?;
        let mut index = self.index();

        let staged = index
            .entry_by_path(&path)
            .filter(|entry| entry.is_unchanged(&stat))
            .map(|entry| entry.oid.clone());
        let blob_id = match staged {
            Some(blob_id) => {
                tracing::debug!(path = %path.display(), "unchanged since staged, skipping rehash");
                blob_id
            }
            None => {
                let data = self.workspace().read_file(&path)?;
                index.stage(self.database(), &path, data, stat)?
            }
        };

        index.set_base(head_id);
        index.write_updates()?;

        Ok(blob_id)
    }
}
