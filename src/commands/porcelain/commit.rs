use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

impl Repository {
    /// Record the staged changes on top of HEAD
    ///
    /// The commit record is persisted first, then the ref moves, then the
    /// staging area is cleared and rebased on the new commit. The whole
    /// sequence runs under the repository lock.
    pub fn commit(&mut self, message: &str) -> Result<ObjectId> {
        self.ensure_initialized()?;

        let _lock = self.lock()?;
        self.load_index()?;
        if self.index().is_empty() {
            return Err(Error::NothingToCommit);
        }

        let (parent_id, parent) = self.head_commit()?;
        let snapshot = self.index().build_snapshot(parent.snapshot());

        let (commit_id, commit) = self.write_commit(
            vec![parent_id],
            snapshot,
            message.trim().to_string(),
            Commit::timestamp_from_env(),
        )?;

        {
            let mut index = self.index();
            index.clear();
            index.set_base(commit_id.clone());
            index.write_updates()?;
        }

        tracing::info!(oid = %commit_id, files = commit.snapshot().len(), "committed");
        writeln!(
            self.writer(),
            "[{}] {}",
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(commit_id)
    }
}
