use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::lock::{LOCK_FILE_NAME, RepositoryLock};
use crate::areas::refs::{Head, Refs};
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::cell::{RefCell, RefMut};
use std::path::Path;

/// Name of the store root under the working directory
pub const REPOSITORY_DIR: &str = ".gitlet";

pub const DESCRIPTION_FILE: &str = "description";

pub const DEFAULT_DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

pub struct Repository {
    path: Box<Path>,
    git_path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Open the working directory at `path`
    ///
    /// Nothing is read or created yet; a missing directory is only created by
    /// `init`. Use [`Repository::ensure_initialized`] before other operations.
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> Result<Self> {
        let path = if path.exists() {
            path.canonicalize()?
        } else {
            std::path::absolute(path)?
        };
        let git_path = path.join(REPOSITORY_DIR);

        let index = Index::new(git_path.join("index").into_boxed_path());
        let database = Database::new(git_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(git_path.clone().into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            git_path: git_path.into_boxed_path(),
            writer: RefCell::new(writer),
            index: RefCell::new(index),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> &Path {
        &self.git_path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&'_ self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn is_initialized(&self) -> bool {
        self.git_path.is_dir()
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::RepositoryNotInitialized(self.path.to_path_buf()))
        }
    }

    /// Where HEAD currently points, as persisted
    pub fn head(&self) -> Result<Head> {
        self.ensure_initialized()?;
        self.refs.read_head()
    }

    pub fn head_commit_id(&self) -> Result<ObjectId> {
        self.ensure_initialized()?;
        self.refs.resolve_head(&self.database)
    }

    pub fn head_commit(&self) -> Result<(ObjectId, Commit)> {
        let oid = self.head_commit_id()?;
        let commit = self.database.load_commit(&oid)?;

        Ok((oid, commit))
    }

    pub fn description(&self) -> Result<String> {
        self.ensure_initialized()?;
        Ok(std::fs::read_to_string(self.git_path.join(DESCRIPTION_FILE))?)
    }

    pub(crate) fn lock(&self) -> Result<RepositoryLock> {
        RepositoryLock::acquire(&self.git_path.join(LOCK_FILE_NAME))
    }

    /// Load the staging area from disk and settle an interrupted commit
    ///
    /// A commit persists the commit record and moves the ref before it clears
    /// the staging area. When the process dies in between, HEAD has moved one
    /// commit past the recorded base and already contains exactly the staged
    /// changes, so those changes are dropped here.
    pub fn load_index(&self) -> Result<()> {
        self.ensure_initialized()?;
        let mut index = self.index();
        index.rehydrate()?;

        let Some(base) = index.base().cloned() else {
            return Ok(());
        };
        if index.is_empty() {
            return Ok(());
        }

        let (head_oid, head_commit) = self.head_commit()?;
        if head_oid == base || head_commit.parent() != Some(&base) {
            return Ok(());
        }

        let base_commit = self.database.load_commit(&base)?;
        if index.build_snapshot(base_commit.snapshot()) == *head_commit.snapshot() {
            tracing::warn!(
                base = %base,
                head = %head_oid,
                "staged changes were already committed, clearing the staging area"
            );
            index.clear();
            index.set_base(head_oid);
            index.write_updates()?;
        }

        Ok(())
    }
}
