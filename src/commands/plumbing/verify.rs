use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    /// Recompute the digest of a stored record
    ///
    /// A mismatch is reported as a corrupt record.
    pub fn verify_integrity(&self, object_id: &ObjectId) -> Result<()> {
        self.ensure_initialized()?;
        self.database().verify(object_id)
    }

    /// Verify every commit reachable from HEAD through first parents, and their blobs
    pub fn verify_history(&self) -> Result<usize> {
        let mut verified = 0;

        for entry in self.rev_list()? {
            let (commit_oid, commit) = entry?;
            self.database().verify(&commit_oid)?;
            for blob_oid in commit.snapshot().values() {
                self.database().verify(blob_oid)?;
            }
            verified += 1;
        }
        tracing::debug!(commits = verified, "history verified");

        Ok(verified)
    }
}
