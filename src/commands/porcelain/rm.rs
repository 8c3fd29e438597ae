use crate::areas::index::Removal;
use crate::areas::repository::Repository;
use crate::errors::Result;
use std::path::Path;

impl Repository {
    /// Stage the removal of `path`
    ///
    /// A path tracked by the HEAD commit is also deleted from the working
    /// directory. A path that was only staged is unstaged and left on disk.
    pub fn rm(&mut self, path: &Path) -> Result<Removal> {
        self.ensure_initialized()?;
        let path = self.workspace().normalize(path)?;

        let _lock = self.lock()?;
        self.load_index()?;
        let (head_id, head_commit) = self.head_commit()?;

        let mut index = self.index();
        let removal = index.stage_removal(&path, head_commit.snapshot())?;
        if removal == Removal::Tracked {
            self.workspace().remove_file(&path)?;
        }

        index.set_base(head_id);
        index.write_updates()?;

        Ok(removal)
    }
}
