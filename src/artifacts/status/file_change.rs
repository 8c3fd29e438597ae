use colored::Colorize;

const LABEL_WIDTH: usize = 8;

/// Unstaged difference between the working tree and the next commit's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkingChange {
    Modified,
    Deleted,
}

impl std::fmt::Display for WorkingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorkingChange::Modified => "modified:   ".red(),
            WorkingChange::Deleted => "deleted:    ".red(),
        };
        write!(f, "{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}

/// Staged difference between the staging area and the HEAD commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexChange {
    Added,
    Modified,
    Deleted,
}

impl std::fmt::Display for IndexChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IndexChange::Added => "new file:   ".green(),
            IndexChange::Modified => "modified:   ".green(),
            IndexChange::Deleted => "deleted:    ".green(),
        };
        write!(f, "{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}
