use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    /// Resolve an abbreviated ID and load whatever object it names
    pub fn find_object(&self, prefix: &str) -> Result<(ObjectId, ObjectBox)> {
        self.ensure_initialized()?;
        let object_id = self.database().resolve_prefix(prefix)?;
        let object = self.database().parse_object(&object_id)?;

        Ok((object_id, object))
    }

    /// Resolve an abbreviated ID that must name a commit
    pub fn find_commit(&self, prefix: &str) -> Result<(ObjectId, Commit)> {
        self.ensure_initialized()?;
        let object_id = self.database().resolve_prefix(prefix)?;
        let commit = self.database().load_commit(&object_id)?;

        Ok((object_id, commit))
    }
}
