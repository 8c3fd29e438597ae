use crate::areas::repository::Repository;
use crate::artifacts::log::ancestry::{Ancestry, AncestryFinder};
use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    fn ancestry_finder(&self) -> AncestryFinder<impl Fn(&ObjectId) -> Result<SlimCommit> + '_> {
        AncestryFinder::new(|commit_id: &ObjectId| {
            let commit = self.database().load_commit(commit_id)?;
            Ok(commit.slim(commit_id.clone()))
        })
    }

    /// Whether `ancestor` is reachable from `commit` (a commit is its own ancestor)
    pub fn is_ancestor(&self, ancestor: &ObjectId, commit: &ObjectId) -> Result<bool> {
        self.ensure_initialized()?;
        self.ancestry_finder().is_ancestor(ancestor, commit)
    }

    pub fn compare(&self, first: &ObjectId, second: &ObjectId) -> Result<Ancestry> {
        self.ensure_initialized()?;
        self.ancestry_finder().compare(first, second)
    }

    pub fn merge_base(&self, first: &ObjectId, second: &ObjectId) -> Result<Option<ObjectId>> {
        self.ensure_initialized()?;
        self.ancestry_finder().merge_base(first, second)
    }
}
