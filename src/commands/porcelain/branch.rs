use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::Result;
use colored::Colorize;

impl Repository {
    /// Create a branch at the commit HEAD resolves to
    pub fn branch(&mut self, branch_name: &str) -> Result<BranchName> {
        self.ensure_initialized()?;
        let branch_name = BranchName::try_parse(branch_name)?;

        let _lock = self.lock()?;
        let source_oid = self.head_commit_id()?;
        self.refs().create_branch(&branch_name, &source_oid)?;

        Ok(branch_name)
    }

    /// List branches, marking the one HEAD follows
    pub fn branches(&self) -> Result<Vec<BranchName>> {
        let current = self.head()?;
        let branches = self.refs().list_branches()?;

        for branch in &branches {
            if current.branch() == Some(branch) {
                writeln!(self.writer(), "* {}", branch.to_string().green())?;
            } else {
                writeln!(self.writer(), "  {branch}")?;
            }
        }

        Ok(branches)
    }
}
