use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use colored::Colorize;

impl Repository {
    /// First-parent history from HEAD back to the root commit
    pub fn rev_list(&self) -> Result<RevList<'_>> {
        Ok(RevList::new(self.database(), self.head_commit_id()?))
    }

    /// Print first-parent history, newest first
    pub fn log(&self) -> Result<Vec<ObjectId>> {
        let mut shown = Vec::new();

        for entry in self.rev_list()? {
            let (commit_oid, commit) = entry?;
            self.show_commit(&commit_oid, &commit)?;
            shown.push(commit_oid);
        }

        Ok(shown)
    }

    fn show_commit(&self, commit_oid: &ObjectId, commit: &Commit) -> Result<()> {
        let mut writer = self.writer();

        writeln!(writer, "===")?;
        writeln!(writer, "{}", format!("commit {commit_oid}").yellow())?;
        if commit.parents().len() > 1 {
            let parents = commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "Merge: {parents}")?;
        }
        writeln!(writer, "Date:   {}", commit.readable_timestamp())?;
        writeln!(writer, "{}", commit.message())?;
        writeln!(writer)?;

        Ok(())
    }
}
