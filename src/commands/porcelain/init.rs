use crate::areas::refs::Head;
use crate::areas::repository::{DEFAULT_DESCRIPTION, DESCRIPTION_FILE, Repository};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::fs;

impl Repository {
    /// Create the store, write the root commit and point `main` at it
    ///
    /// The root commit is the same value everywhere, so every repository
    /// starts from the same commit ID.
    pub fn init(&mut self) -> Result<ObjectId> {
        if self.git_path().exists() {
            return Err(Error::AlreadyInitialized(self.path().to_path_buf()));
        }

        fs::create_dir_all(self.database().objects_path())?;
        fs::create_dir_all(self.refs().heads_path())?;
        fs::write(self.git_path().join(DESCRIPTION_FILE), DEFAULT_DESCRIPTION)?;

        let root_id = self.database().store(&Commit::root())?;

        let main = BranchName::default_branch();
        self.refs().create_branch(&main, &root_id)?;
        self.refs().set_head(&Head::Symbolic(main))?;

        {
            // an empty staging area recorded against the root commit
            let mut index = self.index();
            index.rehydrate()?;
            index.set_base(root_id.clone());
            index.write_updates()?;
        }

        tracing::info!(path = %self.path().display(), root = %root_id, "initialized repository");
        writeln!(
            self.writer(),
            "Initialized empty Gitlet repository in {}",
            self.git_path().display()
        )?;

        Ok(root_id)
    }
}
