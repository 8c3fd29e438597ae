use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Commit, Snapshot};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use chrono::{DateTime, FixedOffset};

impl Repository {
    /// Persist a commit and move HEAD to it
    ///
    /// With a symbolic HEAD the branch advances; a detached HEAD is rewritten
    /// in place.
    pub fn write_commit(
        &self,
        parents: Vec<ObjectId>,
        snapshot: Snapshot,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(ObjectId, Commit)> {
        let commit = Commit::new(parents, snapshot, message, timestamp);
        let commit_id = self.database().store(&commit)?;

        match self.head()? {
            Head::Symbolic(branch) => self.refs().advance(&branch, &commit_id)?,
            Head::Direct(_) => self.refs().set_head(&Head::Direct(commit_id.clone()))?,
        }

        Ok((commit_id, commit))
    }
}
