#![allow(dead_code)]

pub mod command;
pub mod file;

use assert_fs::TempDir;
use gitlet::Repository;
use gitlet::artifacts::objects::object::digest_of;
use gitlet::artifacts::objects::object_id::ObjectId;
use gitlet::artifacts::objects::object_type::ObjectType;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    open_repository(repository_dir.path())
        .init()
        .expect("Failed to initialize repository");

    repository_dir
}

/// Open a repository whose command output is discarded
pub fn open_repository(path: &Path) -> Repository {
    Repository::new(path, Box::new(std::io::sink())).expect("Failed to open repository")
}

pub fn blob_id(content: &str) -> ObjectId {
    digest_of(ObjectType::Blob, content.as_bytes()).expect("Failed to hash content")
}

/// Number of records in the object store
pub fn object_count(repository_path: &Path) -> usize {
    walkdir::WalkDir::new(repository_path.join(".gitlet").join("objects"))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}
