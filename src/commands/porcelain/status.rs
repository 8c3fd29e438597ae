use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::{Status, StatusReport};
use crate::errors::Result;

impl Repository {
    /// Compare the working tree with the staging area and HEAD
    ///
    /// Refreshed stat metadata of staged entries is written back, so later
    /// scans can skip hashing files that did not change.
    pub fn status(&mut self) -> Result<StatusReport> {
        self.ensure_initialized()?;

        let _lock = self.lock()?;
        self.load_index()?;
        let head = self.head()?;
        let (_, head_commit) = self.head_commit()?;

        let report = {
            let mut index = self.index();
            let report = Status::new(self.workspace()).initialize(head, &head_commit, &mut index)?;
            index.write_updates()?;
            report
        };

        write!(self.writer(), "{report}")?;

        Ok(report)
    }
}
