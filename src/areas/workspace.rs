use crate::areas::repository::REPOSITORY_DIR;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a user-supplied path into one relative to the working directory
    ///
    /// Absolute paths must point inside the working directory. `..`, the store
    /// root itself, and names a commit record cannot carry are rejected.
    pub fn normalize(&self, file_path: &Path) -> Result<PathBuf> {
        let relative = if file_path.is_absolute() {
            file_path
                .strip_prefix(self.path.as_ref())
                .map_err(|_| Error::InvalidPath(file_path.to_path_buf()))?
        } else {
            file_path
        };

        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::CurDir => continue,
                Component::Normal(name) => {
                    let name_str = name
                        .to_str()
                        .ok_or_else(|| Error::InvalidPath(file_path.to_path_buf()))?;
                    if name_str.contains(['\n', '\r', '\0']) {
                        return Err(Error::InvalidPath(file_path.to_path_buf()));
                    }
                    normalized.push(name);
                }
                _ => return Err(Error::InvalidPath(file_path.to_path_buf())),
            }
        }

        if normalized.as_os_str().is_empty() || Self::is_ignored(&normalized) {
            return Err(Error::InvalidPath(file_path.to_path_buf()));
        }

        Ok(normalized)
    }

    /// All regular files under the working directory, relative and sorted
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != REPOSITORY_DIR);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(self.path.as_ref()) {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_ignored(path: &Path) -> bool {
        matches!(
            path.components().next(),
            Some(Component::Normal(name)) if name == REPOSITORY_DIR
        )
    }

    pub fn read_file(&self, file_path: &Path) -> Result<Bytes> {
        let full_path = self.path.join(file_path);
        if !full_path.is_file() {
            return Err(Error::FileNotFound(file_path.to_path_buf()));
        }

        Ok(Bytes::from(std::fs::read(full_path)?))
    }

    pub fn stat_file(&self, file_path: &Path) -> Result<EntryMetadata> {
        let metadata = std::fs::metadata(self.path.join(file_path)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(file_path.to_path_buf())
            } else {
                Error::Io(err)
            }
        })?;

        Ok(EntryMetadata::from(&metadata))
    }

    /// Delete a working file, pruning directories it leaves empty
    pub fn remove_file(&self, file_path: &Path) -> Result<()> {
        let full_path = self.path.join(file_path);
        if full_path.is_file() {
            std::fs::remove_file(&full_path)?;
        }

        let mut parent = file_path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            // stop at the first directory that still has content
            if std::fs::remove_dir(self.path.join(dir)).is_err() {
                break;
            }
            parent = dir.parent();
        }

        Ok(())
    }
}
