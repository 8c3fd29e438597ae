//! Gitlet references (HEAD and branches)
//!
//! References are human-readable names pointing to commits:
//! - Direct: Containing a commit SHA-1 (a detached HEAD, or any branch)
//! - Symbolic: HEAD naming a branch (`ref: refs/heads/main`)
//!
//! Branch refs always hold a direct ID, so resolving HEAD follows at most one
//! level of indirection.
//!
//! ## File Format
//!
//! References are stored as text files containing either:
//! - A 40-character SHA-1 hash (direct reference)
//! - `ref: refs/heads/<name>` for a symbolic HEAD

use crate::areas::database::Database;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use derive_new::new;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

// leading dot keeps stray temp files out of the branch listing
const TEMP_REF_PREFIX: &str = ".tmp-ref-";

static SYMREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ref: (.+)$").expect("symref pattern is a valid regex"));

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD follows a branch
    Symbolic(BranchName),
    /// Detached HEAD
    Direct(ObjectId),
}

impl Head {
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            Head::Symbolic(branch) => Some(branch),
            Head::Direct(_) => None,
        }
    }

    fn to_raw(&self) -> String {
        match self {
            Head::Symbolic(branch) => format!("ref: {}\n", branch.ref_path()),
            Head::Direct(oid) => format!("{oid}\n"),
        }
    }

    fn parse(content: &str) -> Result<Self> {
        match SYMREF.captures(content) {
            Some(symref) => Ok(Head::Symbolic(BranchName::try_parse_ref_path(&symref[1])?)),
            None => Ok(Head::Direct(ObjectId::try_parse(content)?)),
        }
    }
}

impl std::fmt::Display for Head {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Head::Symbolic(branch) => write!(f, "{branch}"),
            Head::Direct(oid) => write!(f, "(HEAD detached at {})", oid.to_short_oid()),
        }
    }
}

/// Gitlet references manager
///
/// Reads and writes HEAD and branch refs, locking each file while it is written.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the store root (typically `.gitlet`)
    path: Box<Path>,
}

impl Refs {
    /// Read where HEAD points
    ///
    /// A missing or empty HEAD means the repository was never initialized.
    pub fn read_head(&self) -> Result<Head> {
        let head_path = self.head_path();

        match Self::read_ref_file(&head_path)? {
            Some(content) => Head::parse(&content).map_err(|err| match err {
                Error::InvalidDigest(_) | Error::InvalidBranchName(_) => {
                    Error::corrupt(HEAD_REF_NAME, err.to_string())
                }
                other => other,
            }),
            None => Err(Error::RepositoryNotInitialized(self.path.to_path_buf())),
        }
    }

    pub fn set_head(&self, head: &Head) -> Result<()> {
        self.update_ref_file(&self.head_path(), &head.to_raw())?;
        tracing::debug!(head = %head, "updated HEAD");

        Ok(())
    }

    /// Resolve HEAD to the commit it designates
    pub fn resolve_head(&self, database: &Database) -> Result<ObjectId> {
        self.resolve(&self.read_head()?, database)
    }

    /// Resolve a HEAD value to a commit ID
    ///
    /// A symbolic HEAD naming a missing branch is reported as an uninitialized
    /// repository. A direct ID must name a stored commit.
    pub fn resolve(&self, head: &Head, database: &Database) -> Result<ObjectId> {
        match head {
            Head::Symbolic(branch) => self
                .read_branch(branch)?
                .ok_or_else(|| Error::RepositoryNotInitialized(self.path.to_path_buf())),
            Head::Direct(oid) => {
                database.load_commit(oid)?;
                Ok(oid.clone())
            }
        }
    }

    /// Read the commit a branch points at, if the branch exists
    pub fn read_branch(&self, branch: &BranchName) -> Result<Option<ObjectId>> {
        match Self::read_ref_file(&self.branch_path(branch))? {
            Some(content) => {
                if SYMREF.is_match(&content) {
                    return Err(Error::corrupt(
                        branch.ref_path(),
                        "branch refs must hold a commit id",
                    ));
                }
                ObjectId::try_parse(content)
                    .map(Some)
                    .map_err(|err| Error::corrupt(branch.ref_path(), err.to_string()))
            }
            None => Ok(None),
        }
    }

    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.branch_path(branch).is_file()
    }

    /// Move an existing branch to a new commit
    pub fn advance(&self, branch: &BranchName, oid: &ObjectId) -> Result<()> {
        if !self.branch_exists(branch) {
            return Err(Error::NoSuchBranch(branch.to_string()));
        }

        self.update_ref_file(&self.branch_path(branch), &format!("{oid}\n"))?;
        tracing::debug!(%branch, %oid, "advanced branch");

        Ok(())
    }

    pub fn create_branch(&self, branch: &BranchName, oid: &ObjectId) -> Result<()> {
        if self.branch_exists(branch) {
            return Err(Error::BranchExists(branch.to_string()));
        }

        self.update_ref_file(&self.branch_path(branch), &format!("{oid}\n"))?;
        tracing::debug!(%branch, %oid, "created branch");

        Ok(())
    }

    pub fn list_branches(&self) -> Result<Vec<BranchName>> {
        let heads_path = self.heads_path();
        if !heads_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut branches = Vec::new();
        for entry in WalkDir::new(&heads_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = entry
                .path()
                .strip_prefix(&heads_path)
                .map_err(|_| Error::InvalidPath(entry.path().to_path_buf()))?;
            if let Some(name) = relative_path.to_str()
                && let Ok(branch) = BranchName::try_parse(name)
            {
                branches.push(branch);
            }
        }
        branches.sort();

        Ok(branches)
    }

    /// Replace a ref file with a write-then-rename, so readers never see it partially written
    fn update_ref_file(&self, path: &Path, raw_ref: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
        std::fs::create_dir_all(parent)?;

        let mut ref_file = tempfile::Builder::new()
            .prefix(TEMP_REF_PREFIX)
            .tempfile_in(parent)?;
        ref_file.write_all(raw_ref.as_bytes())?;
        ref_file.as_file().sync_all()?;
        ref_file.persist(path).map_err(|err| err.error)?;

        Ok(())
    }

    fn read_ref_file(path: &Path) -> Result<Option<String>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let content = content.trim();

        if content.is_empty() {
            Ok(None)
        } else {
            Ok(Some(content.to_string()))
        }
    }

    fn branch_path(&self, branch: &BranchName) -> Box<Path> {
        self.path.join(branch.ref_path()).into_boxed_path()
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Commit;
    use assert_fs::TempDir;
    use rstest::{fixture, rstest};

    struct Store {
        _dir: TempDir,
        refs: Refs,
        database: Database,
        root: ObjectId,
    }

    #[fixture]
    fn store() -> Store {
        let dir = TempDir::new().unwrap();
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let root = database.store(&Commit::root()).unwrap();

        Store {
            _dir: dir,
            refs,
            database,
            root,
        }
    }

    #[rstest]
    fn missing_head_means_uninitialized(store: Store) {
        assert!(matches!(
            store.refs.read_head(),
            Err(Error::RepositoryNotInitialized(_))
        ));
    }

    #[rstest]
    fn symbolic_head_resolves_through_branch(store: Store) {
        let main = BranchName::default_branch();
        store.refs.create_branch(&main, &store.root).unwrap();
        store.refs.set_head(&Head::Symbolic(main.clone())).unwrap();

        assert_eq!(store.refs.read_head().unwrap(), Head::Symbolic(main));
        assert_eq!(store.refs.resolve_head(&store.database).unwrap(), store.root);
        assert_eq!(
            std::fs::read_to_string(store.refs.head_path()).unwrap(),
            "ref: refs/heads/main\n"
        );
    }

    #[rstest]
    fn symbolic_head_to_missing_branch_means_uninitialized(store: Store) {
        let head = Head::Symbolic(BranchName::try_parse("ghost").unwrap());
        store.refs.set_head(&head).unwrap();

        assert!(matches!(
            store.refs.resolve_head(&store.database),
            Err(Error::RepositoryNotInitialized(_))
        ));
    }

    #[rstest]
    fn direct_head_must_name_a_commit(store: Store) {
        let blob = store
            .database
            .persist(crate::artifacts::objects::object_type::ObjectType::Blob, b"x")
            .unwrap();

        assert_eq!(
            store
                .refs
                .resolve(&Head::Direct(store.root.clone()), &store.database)
                .unwrap(),
            store.root
        );
        assert!(matches!(
            store.refs.resolve(&Head::Direct(blob), &store.database),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[rstest]
    fn advancing_missing_branch_fails(store: Store) {
        let branch = BranchName::try_parse("nope").unwrap();

        assert!(matches!(
            store.refs.advance(&branch, &store.root),
            Err(Error::NoSuchBranch(_))
        ));
        assert!(!store.refs.branch_exists(&branch));
    }

    #[rstest]
    fn creating_existing_branch_fails(store: Store) {
        let branch = BranchName::try_parse("topic").unwrap();
        store.refs.create_branch(&branch, &store.root).unwrap();

        assert!(matches!(
            store.refs.create_branch(&branch, &store.root),
            Err(Error::BranchExists(_))
        ));
    }

    #[rstest]
    fn lists_nested_branches_in_order(store: Store) {
        for name in ["main", "feature/b", "feature/a"] {
            let branch = BranchName::try_parse(name).unwrap();
            store.refs.create_branch(&branch, &store.root).unwrap();
        }

        let names = store
            .refs
            .list_branches()
            .unwrap()
            .into_iter()
            .map(|branch| branch.to_string())
            .collect::<Vec<_>>();

        pretty_assertions::assert_eq!(names, vec!["feature/a", "feature/b", "main"]);
    }

    #[rstest]
    fn symbolic_branch_ref_is_corrupt(store: Store) {
        let branch = BranchName::try_parse("odd").unwrap();
        std::fs::create_dir_all(store.refs.heads_path()).unwrap();
        std::fs::write(
            store.refs.heads_path().join("odd"),
            "ref: refs/heads/main\n",
        )
        .unwrap();

        assert!(matches!(
            store.refs.read_branch(&branch),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[rstest]
    fn readers_never_see_a_partially_written_branch(store: Store) {
        let branch = BranchName::try_parse("main").unwrap();
        let other = store
            .database
            .store(&Commit::new(
                vec![store.root.clone()],
                Default::default(),
                "other".into(),
                Commit::root().timestamp(),
            ))
            .unwrap();
        store.refs.create_branch(&branch, &store.root).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..200 {
                    let target = if round % 2 == 0 { &other } else { &store.root };
                    store.refs.advance(&branch, target).unwrap();
                }
            });

            for _ in 0..200 {
                let current = store.refs.read_branch(&branch).unwrap();
                assert!(current == Some(store.root.clone()) || current == Some(other.clone()));
            }
        });
    }

    #[rstest]
    fn updates_leave_only_the_ref_behind(store: Store) {
        let branch = BranchName::try_parse("main").unwrap();
        store.refs.create_branch(&branch, &store.root).unwrap();
        store.refs.advance(&branch, &store.root).unwrap();

        let files = std::fs::read_dir(store.refs.heads_path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        pretty_assertions::assert_eq!(files, vec!["main"]);

        // a temp file left by a crashed writer is not a branch
        std::fs::write(store.refs.heads_path().join(".tmp-ref-stray"), "junk").unwrap();
        pretty_assertions::assert_eq!(store.refs.list_branches().unwrap(), vec![branch]);
    }
}
