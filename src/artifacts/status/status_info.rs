use crate::areas::index::Index;
use crate::areas::refs::Head;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::status::inspector::Inspector;
use crate::errors::Result;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub use crate::artifacts::status::file_change::{IndexChange, WorkingChange};

pub type ChangeSet<T> = BTreeMap<PathBuf, T>;
pub type FileSet = BTreeSet<PathBuf>;

/// Where the working tree stands relative to HEAD and the staging area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub head: Head,
    /// Changes staged for the next commit, removals included
    pub staged: ChangeSet<IndexChange>,
    /// Differences between the working tree and what the next commit would record
    pub unstaged: ChangeSet<WorkingChange>,
    pub untracked: FileSet,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.head {
            Head::Symbolic(branch) => writeln!(f, "On branch {branch}")?,
            Head::Direct(_) => writeln!(f, "{}", self.head)?,
        }

        if self.is_clean() {
            return writeln!(f, "nothing to commit, working tree clean");
        }

        if !self.staged.is_empty() {
            writeln!(f, "\nChanges to be committed:")?;
            for (path, change) in &self.staged {
                writeln!(f, "{}{}", change, path.display())?;
            }
        }

        if !self.unstaged.is_empty() {
            writeln!(f, "\nChanges not staged for commit:")?;
            for (path, change) in &self.unstaged {
                writeln!(f, "{}{}", change, path.display())?;
            }
        }

        if !self.untracked.is_empty() {
            writeln!(f, "\nUntracked files:")?;
            for path in &self.untracked {
                writeln!(f, "        {}", path.display())?;
            }
        }

        Ok(())
    }
}

#[derive(new)]
pub struct Status<'r> {
    workspace: &'r Workspace,
}

impl<'r> Status<'r> {
    /// Build the report for `head_commit`, refreshing the index's working-change cache
    ///
    /// Staged entries whose content turns out unchanged get their stat
    /// metadata refreshed, so the next scan can skip hashing them.
    pub fn initialize(
        &self,
        head: Head,
        head_commit: &Commit,
        index: &mut Index,
    ) -> Result<StatusReport> {
        let inspector = Inspector::new(self.workspace);
        let head_snapshot = head_commit.snapshot();

        let mut staged = ChangeSet::<IndexChange>::new();
        for entry in index.entries() {
            if let Some(change) =
                inspector.check_index_against_head(Some(entry), head_snapshot.get(&entry.name))
            {
                staged.insert(entry.name.clone(), change);
            }
        }
        for removal in index.removals() {
            staged.insert(removal.name.clone(), IndexChange::Deleted);
        }

        let files = self
            .workspace
            .list_files()?
            .into_iter()
            .collect::<FileSet>();
        let expected = index.build_snapshot(head_snapshot);

        index.clear_working_changes();
        let mut unstaged = ChangeSet::<WorkingChange>::new();
        for (path, oid) in &expected {
            if !files.contains(path) {
                unstaged.insert(path.clone(), WorkingChange::Deleted);
                continue;
            }

            let stat = self.workspace.stat_file(path)?;
            if inspector.is_modified(path, oid, index.entry_by_path(path), &stat)? {
                unstaged.insert(path.clone(), WorkingChange::Modified);
            } else {
                index.update_entry_stat(path, stat);
            }
        }
        for (path, change) in &unstaged {
            index.record_working_change(path.clone(), *change);
        }

        let untracked = files
            .into_iter()
            .filter(|path| !expected.contains_key(path))
            .collect::<FileSet>();

        Ok(StatusReport {
            head,
            staged,
            unstaged,
            untracked,
        })
    }
}
