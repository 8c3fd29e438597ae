//! Gitlet index (staging area)
//!
//! The index tracks the changes pending between the last commit and the next:
//! files staged for addition or modification, and tracked files staged for
//! removal. It also remembers which commit those changes were staged against.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: Signature, version, entry and removal counts, base commit
//! - Entries: Staged files with their blob ID and stat metadata, sorted by path
//! - Removals: Paths staged for removal, sorted
//! - Checksum: SHA-1 hash of the entire index for integrity verification
//!
//! ## Data Structures
//!
//! - `added`: staged additions and modifications, keyed by path
//! - `removed`: staged removals, keyed by path
//! - `working_changes`: unstaged modifications found by the last status scan;
//!   derived state that is never written to disk

use crate::areas::database::Database;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_FIXED_SIZE, EntryMetadata, IndexEntry, REMOVAL_FIXED_SIZE, RemovalEntry, path_length,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Snapshot;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::status_info::WorkingChange;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

const TEMP_INDEX_PREFIX: &str = "index.tmp-";

/// Outcome of staging a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The path is tracked by the base commit and will be dropped from the next one
    Tracked,
    /// The path was only staged, so it was simply unstaged
    Unstaged,
}

/// Gitlet index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.gitlet/index`)
    path: Box<Path>,
    added: BTreeMap<PathBuf, IndexEntry>,
    removed: BTreeMap<PathBuf, RemovalEntry>,
    working_changes: BTreeMap<PathBuf, WorkingChange>,
    /// Commit the staged changes were recorded against
    base: Option<ObjectId>,
    /// Flag indicating if the index has been modified since loading
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            working_changes: BTreeMap::new(),
            base: None,
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.added.get(path)
    }

    pub fn is_staged_for_removal(&self, path: &Path) -> bool {
        self.removed.contains_key(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.added.values()
    }

    pub fn removals(&self) -> impl Iterator<Item = &RemovalEntry> {
        self.removed.values()
    }

    /// Whether nothing is staged, neither additions nor removals
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn base(&self) -> Option<&ObjectId> {
        self.base.as_ref()
    }

    pub fn set_base(&mut self, base: ObjectId) {
        if self.base.as_ref() != Some(&base) {
            self.base = Some(base);
            self.changed = true;
        }
    }

    /// Stage the content of a file
    ///
    /// The blob is persisted right away (deduplicated by the database) and the
    /// entry for `path` is replaced. Any pending removal of `path` is dropped.
    pub fn stage(
        &mut self,
        database: &Database,
        path: &Path,
        data: Bytes,
        metadata: EntryMetadata,
    ) -> Result<ObjectId> {
        let oid = database.store(&Blob::new(data))?;

        self.removed.remove(path);
        self.working_changes.remove(path);
        self.added.insert(
            path.to_path_buf(),
            IndexEntry::new(path.to_path_buf(), oid.clone(), metadata),
        );
        self.changed = true;

        tracing::debug!(path = %path.display(), %oid, "staged file");

        Ok(oid)
    }

    /// Stage the removal of `path`
    ///
    /// Paths tracked in `parent` are marked for removal. Paths that are only
    /// staged are unstaged. Anything else has nothing to remove.
    pub fn stage_removal(&mut self, path: &Path, parent: &Snapshot) -> Result<Removal> {
        let was_staged = self.added.remove(path).is_some();
        self.working_changes.remove(path);

        let removal = match parent.get(path) {
            Some(oid) => {
                self.removed.insert(
                    path.to_path_buf(),
                    RemovalEntry::new(path.to_path_buf(), oid.clone()),
                );
                Removal::Tracked
            }
            None if was_staged => Removal::Unstaged,
            None => return Err(Error::NothingToRemove(path.to_path_buf())),
        };
        self.changed = true;

        tracing::debug!(path = %path.display(), ?removal, "staged removal");

        Ok(removal)
    }

    /// The snapshot of the next commit: `parent` with staged changes applied
    pub fn build_snapshot(&self, parent: &Snapshot) -> Snapshot {
        let mut snapshot = parent.clone();

        for entry in self.added.values() {
            snapshot.insert(entry.name.clone(), entry.oid.clone());
        }
        for removal in self.removed.keys() {
            snapshot.remove(removal);
        }

        snapshot
    }

    /// Drop every staged change
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.working_changes.clear();
        self.changed = true;
    }

    /// Refresh the stat metadata of a staged entry after its content was confirmed
    pub fn update_entry_stat(&mut self, path: &Path, stat: EntryMetadata) {
        if let Some(existing_entry) = self.added.get_mut(path)
            && existing_entry.metadata != stat
        {
            existing_entry.metadata = stat;
            self.changed = true;
        }
    }

    pub fn record_working_change(&mut self, path: PathBuf, change: WorkingChange) {
        self.working_changes.insert(path, change);
    }

    pub fn clear_working_changes(&mut self) {
        self.working_changes.clear();
    }

    pub fn working_changes(&self) -> &BTreeMap<PathBuf, WorkingChange> {
        &self.working_changes
    }

    fn reset(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.working_changes.clear();
        self.base = None;
        self.changed = false;
    }

    /// Load the index from disk
    ///
    /// A missing or empty file is an empty index. A wrong signature, an
    /// unsupported version, or a checksum mismatch is a corrupt record.
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the index file during reading.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.reset();

        if !self.path().exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(self.path())?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        // if the index file is empty, return early
        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let header = Self::parse_header(&mut reader)?;
        self.parse_entries(header.entries_count, &mut reader)?;
        self.parse_removals(header.removals_count, &mut reader)?;
        reader.verify()?;

        self.base = header.base;
        tracing::debug!(
            staged = self.added.len(),
            removed = self.removed.len(),
            "loaded index"
        );

        Ok(())
    }

    fn parse_header(reader: &mut Checksum) -> Result<IndexHeader> {
        let header = IndexHeader::deserialize(reader.read(HEADER_SIZE)?)?;

        if header.marker != SIGNATURE {
            return Err(Error::corrupt("index", "invalid index file signature"));
        }

        if header.version != VERSION {
            return Err(Error::corrupt(
                "index",
                format!("unsupported index file version: {}", header.version),
            ));
        }

        Ok(header)
    }

    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> Result<()> {
        for _ in 0..entries_count {
            let entry_bytes = Self::read_variable(reader, ENTRY_FIXED_SIZE)?;
            let entry = IndexEntry::deserialize(entry_bytes)?;

            self.added.insert(entry.name.clone(), entry);
        }

        Ok(())
    }

    fn parse_removals(&mut self, removals_count: u32, reader: &mut Checksum) -> Result<()> {
        for _ in 0..removals_count {
            let entry_bytes = Self::read_variable(reader, REMOVAL_FIXED_SIZE)?;
            let removal = RemovalEntry::deserialize(entry_bytes)?;

            self.removed.insert(removal.name.clone(), removal);
        }

        Ok(())
    }

    /// Read a fixed-size prefix followed by the path it announces
    fn read_variable(reader: &mut Checksum, fixed_size: usize) -> Result<Bytes> {
        let fixed = reader.read(fixed_size)?;
        let name = reader.read(path_length(&fixed))?;

        Ok(Bytes::from([fixed.as_ref(), name.as_ref()].concat()))
    }

    /// Write the index to disk when it changed since it was loaded
    ///
    /// The new index goes to a temp file next to the old one and is renamed
    /// over it, so readers always find one complete version.
    pub fn write_updates(&mut self) -> Result<()> {
        if !self.changed {
            return Ok(());
        }

        let index_dir = self
            .path()
            .parent()
            .ok_or_else(|| Error::InvalidPath(self.path().to_path_buf()))?;
        let mut temp_index = tempfile::Builder::new()
            .prefix(TEMP_INDEX_PREFIX)
            .tempfile_in(index_dir)?;

        {
            let lock =
                file_guard::lock(temp_index.as_file_mut(), file_guard::Lock::Exclusive, 0, 1)?;
            self.write_records(Checksum::new(lock))?;
        }
        temp_index.as_file().sync_all()?;
        temp_index.persist(self.path()).map_err(|err| err.error)?;
        self.changed = false;

        tracing::debug!(
            staged = self.added.len(),
            removed = self.removed.len(),
            "wrote index"
        );

        Ok(())
    }

    fn write_records(&self, mut writer: Checksum) -> Result<()> {
        let header = IndexHeader::new(
            String::from(SIGNATURE),
            VERSION,
            self.added.len() as u32,
            self.removed.len() as u32,
            self.base.clone(),
        );
        writer.write(&header.serialize()?)?;

        for entry in self.added.values() {
            writer.write(&entry.serialize()?)?;
        }
        for removal in self.removed.values() {
            writer.write(&removal.serialize()?)?;
        }

        writer.write_checksum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::digest_of;
    use crate::artifacts::objects::object_type::ObjectType;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Staging {
        dir: TempDir,
        database: Database,
        index: Index,
    }

    #[fixture]
    fn staging() -> Staging {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let index = Index::new(dir.path().join("index").into_boxed_path());

        Staging {
            dir,
            database,
            index,
        }
    }

    fn blob_id(content: &str) -> ObjectId {
        digest_of(ObjectType::Blob, content.as_bytes()).unwrap()
    }

    fn stage(staging: &mut Staging, path: &str, content: &'static str) -> ObjectId {
        staging
            .index
            .stage(
                &staging.database,
                Path::new(path),
                Bytes::from_static(content.as_bytes()),
                EntryMetadata::default(),
            )
            .unwrap()
    }

    #[rstest]
    fn staging_persists_the_blob(mut staging: Staging) {
        let oid = stage(&mut staging, "f.txt", "hi");

        assert_eq!(oid, blob_id("hi"));
        assert!(staging.database.contains(&oid));
        assert_eq!(staging.index.entry_by_path(Path::new("f.txt")).unwrap().oid, oid);
    }

    #[rstest]
    fn staging_again_overwrites_the_entry(mut staging: Staging) {
        stage(&mut staging, "f.txt", "one");
        let second = stage(&mut staging, "f.txt", "two");

        assert_eq!(staging.index.entries().count(), 1);
        assert_eq!(staging.index.entry_by_path(Path::new("f.txt")).unwrap().oid, second);
    }

    #[rstest]
    fn staging_cancels_a_pending_removal(mut staging: Staging) {
        let parent = Snapshot::from([(PathBuf::from("f.txt"), blob_id("old"))]);
        staging
            .index
            .stage_removal(Path::new("f.txt"), &parent)
            .unwrap();

        stage(&mut staging, "f.txt", "new");

        assert!(!staging.index.is_staged_for_removal(Path::new("f.txt")));
    }

    #[rstest]
    fn removing_a_tracked_path_marks_it(mut staging: Staging) {
        let parent = Snapshot::from([(PathBuf::from("f.txt"), blob_id("old"))]);
        stage(&mut staging, "f.txt", "new");

        let removal = staging
            .index
            .stage_removal(Path::new("f.txt"), &parent)
            .unwrap();

        assert_eq!(removal, Removal::Tracked);
        assert!(staging.index.entry_by_path(Path::new("f.txt")).is_none());
        assert!(staging.index.is_staged_for_removal(Path::new("f.txt")));
    }

    #[rstest]
    fn removing_an_only_staged_path_unstages_it(mut staging: Staging) {
        stage(&mut staging, "new.txt", "x");

        let removal = staging
            .index
            .stage_removal(Path::new("new.txt"), &Snapshot::new())
            .unwrap();

        assert_eq!(removal, Removal::Unstaged);
        assert!(staging.index.is_empty());
    }

    #[rstest]
    fn removing_an_unknown_path_fails(mut staging: Staging) {
        let result = staging
            .index
            .stage_removal(Path::new("ghost.txt"), &Snapshot::new());

        assert!(matches!(result, Err(Error::NothingToRemove(_))));
    }

    #[rstest]
    fn snapshot_applies_additions_and_removals(mut staging: Staging) {
        let parent = Snapshot::from([
            (PathBuf::from("keep.txt"), blob_id("keep")),
            (PathBuf::from("edit.txt"), blob_id("before")),
            (PathBuf::from("drop.txt"), blob_id("drop")),
        ]);
        stage(&mut staging, "edit.txt", "after");
        stage(&mut staging, "add.txt", "added");
        staging
            .index
            .stage_removal(Path::new("drop.txt"), &parent)
            .unwrap();

        let snapshot = staging.index.build_snapshot(&parent);

        assert_eq!(
            snapshot,
            Snapshot::from([
                (PathBuf::from("add.txt"), blob_id("added")),
                (PathBuf::from("edit.txt"), blob_id("after")),
                (PathBuf::from("keep.txt"), blob_id("keep")),
            ])
        );
    }

    #[rstest]
    fn survives_a_write_and_reload(mut staging: Staging) {
        let parent = Snapshot::from([(PathBuf::from("old/gone.txt"), blob_id("gone"))]);
        stage(&mut staging, "a/b.txt", "b");
        stage(&mut staging, "c.txt", "c");
        staging
            .index
            .stage_removal(Path::new("old/gone.txt"), &parent)
            .unwrap();
        staging.index.set_base(blob_id("pretend-commit"));
        staging.index.write_updates().unwrap();

        let mut reloaded = Index::new(staging.dir.path().join("index").into_boxed_path());
        reloaded.rehydrate().unwrap();

        assert_eq!(
            reloaded.entries().cloned().collect::<Vec<_>>(),
            staging.index.entries().cloned().collect::<Vec<_>>()
        );
        assert!(reloaded.is_staged_for_removal(Path::new("old/gone.txt")));
        assert_eq!(reloaded.base(), Some(&blob_id("pretend-commit")));
        assert!(!reloaded.is_changed());
    }

    #[rstest]
    fn missing_file_is_an_empty_index(mut staging: Staging) {
        staging.index.rehydrate().unwrap();

        assert!(staging.index.is_empty());
        assert_eq!(staging.index.base(), None);
    }

    #[rstest]
    fn flipped_byte_fails_the_checksum(mut staging: Staging) {
        stage(&mut staging, "f.txt", "hi");
        staging.index.write_updates().unwrap();

        let index_path = staging.dir.path().join("index");
        let mut bytes = std::fs::read(&index_path).unwrap();
        bytes[HEADER_SIZE] ^= 0xff;
        std::fs::write(&index_path, bytes).unwrap();

        let result = staging.index.rehydrate();
        assert!(matches!(result, Err(Error::CorruptRecord { .. })));
    }

    #[rstest]
    #[case(b"XXXX".as_slice(), 1)]
    #[case(SIGNATURE.as_bytes(), 2)]
    fn foreign_headers_are_corrupt(
        mut staging: Staging,
        #[case] marker: &[u8],
        #[case] version: u32,
    ) {
        let mut bytes = marker.to_vec();
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(&[0u8; HEADER_SIZE - 8]);
        std::fs::write(staging.dir.path().join("index"), bytes).unwrap();

        let result = staging.index.rehydrate();
        assert!(matches!(result, Err(Error::CorruptRecord { .. })));
    }

    #[rstest]
    fn clearing_empties_both_tables(mut staging: Staging) {
        let parent = Snapshot::from([(PathBuf::from("t.txt"), blob_id("t"))]);
        stage(&mut staging, "f.txt", "hi");
        staging.index.stage_removal(Path::new("t.txt"), &parent).unwrap();

        staging.index.clear();

        assert!(staging.index.is_empty());
        assert_eq!(staging.index.removals().count(), 0);
    }

    #[rstest]
    fn writing_leaves_no_temp_files(mut staging: Staging) {
        stage(&mut staging, "f.txt", "hi");
        staging.index.write_updates().unwrap();

        let leftovers = std::fs::read_dir(staging.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(TEMP_INDEX_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[rstest]
    fn readers_always_load_a_complete_index(mut staging: Staging) {
        stage(&mut staging, "f.txt", "start");
        staging.index.write_updates().unwrap();
        let Staging {
            dir,
            database,
            index: mut writer,
        } = staging;

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..100 {
                    let content = if round % 2 == 0 { "even" } else { "odd" };
                    writer
                        .stage(
                            &database,
                            Path::new("f.txt"),
                            Bytes::from_static(content.as_bytes()),
                            EntryMetadata::default(),
                        )
                        .unwrap();
                    writer.write_updates().unwrap();
                }
            });

            let mut reader = Index::new(dir.path().join("index").into_boxed_path());
            for _ in 0..100 {
                reader.rehydrate().unwrap();
                assert_eq!(reader.entries().count(), 1);
            }
        });
    }
}
