//! Content-addressed object database
//!
//! Records are framed as `<kind> <size>\0<payload>`, compressed with zlib and
//! stored at `objects/<first-2-hex>/<remaining-38-hex>`. The two-character
//! shard bounds directory fan-out without any secondary index. Identical
//! content always maps to the same path, so storing it twice is a no-op.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable, digest_of, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::{MIN_PREFIX_LENGTH, OBJECT_ID_LENGTH, SHARD_LENGTH};
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const TEMP_OBJECT_PREFIX: &str = "tmp-obj-";

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Where the record for `object_id` lives (whether or not it exists yet)
    pub fn locate(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.locate(object_id).is_file()
    }

    /// Persist a typed record and return its ID
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        let payload = object.serialize()?;
        self.persist(object.object_type(), &payload)
    }

    /// Persist an encoded payload under its digest
    ///
    /// The record is only written when nothing exists at the derived path yet;
    /// otherwise this is a no-op. The ID is returned either way.
    pub fn persist(&self, kind: ObjectType, payload: &[u8]) -> Result<ObjectId> {
        let object_id = digest_of(kind, payload)?;
        let object_path = self.locate(&object_id);

        if object_path.exists() {
            tracing::debug!(oid = %object_id, %kind, "object already stored");
            return Ok(object_id);
        }

        // shard directories are created lazily
        if let Some(shard) = object_path.parent() {
            std::fs::create_dir_all(shard)?;
        }
        self.write_object(&object_path, frame(kind, payload))?;
        tracing::debug!(oid = %object_id, %kind, size = payload.len(), "stored object");

        Ok(object_id)
    }

    /// Load a record, checking that it has the expected kind
    pub fn load(&self, object_id: &ObjectId, expected: ObjectType) -> Result<ObjectBox> {
        let payload = self.load_payload(object_id, expected)?;

        match expected {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(payload)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(payload)?))),
        }
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> Result<Blob> {
        Blob::deserialize(self.load_payload(object_id, ObjectType::Blob)?)
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        Commit::deserialize(self.load_payload(object_id, ObjectType::Commit)?)
    }

    /// Load a record whatever its kind
    pub fn parse_object(&self, object_id: &ObjectId) -> Result<ObjectBox> {
        let object_type = self.get_object_type(object_id)?;
        self.load(object_id, object_type)
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> Result<ObjectType> {
        let (object_type, _) = self.read_record(object_id)?;
        Ok(object_type)
    }

    /// Recompute the digest of a stored record and compare it with its ID
    ///
    /// Meant for corruption detection; routine loads skip it.
    pub fn verify(&self, object_id: &ObjectId) -> Result<()> {
        let (object_type, payload) = self.read_record(object_id)?;

        let actual = digest_of(object_type, &payload)?;
        if &actual != object_id {
            return Err(Error::corrupt(
                object_id,
                format!("content hashes to {actual}"),
            ));
        }

        // commits must also survive a decode/encode cycle unchanged
        if object_type == ObjectType::Commit {
            let commit = Commit::deserialize(payload)?;
            if !commit.verify_integrity(object_id)? {
                return Err(Error::corrupt(
                    object_id,
                    "logical fields do not reproduce the commit id",
                ));
            }
        }

        Ok(())
    }

    /// Resolve an abbreviated object ID to the single stored object it names
    ///
    /// The prefix shape is validated before touching the file system. Only the
    /// shard named by the first two characters is scanned. A prefix matching
    /// several objects is ambiguous whatever its length; a unique match needs
    /// at least `MIN_PREFIX_LENGTH` characters.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId> {
        if !ObjectId::is_valid_prefix(prefix) {
            return Err(Error::InvalidDigest(prefix.to_string()));
        }
        let prefix = prefix.to_ascii_lowercase();

        if prefix.len() == OBJECT_ID_LENGTH {
            return ObjectId::try_parse(prefix);
        }

        let mut matches = self.find_objects_by_prefix(&prefix)?;
        match matches.len() {
            0 => Err(Error::NotFound(prefix)),
            1 if prefix.len() < MIN_PREFIX_LENGTH => Err(Error::InvalidDigest(prefix)),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                Err(Error::AmbiguousPrefix {
                    prefix,
                    candidates: matches,
                })
            }
        }
    }

    /// Find all objects whose ID starts with the given prefix
    ///
    /// # Arguments
    ///
    /// * `prefix` - A hexadecimal string of at least two characters
    ///
    /// # Returns
    ///
    /// All matching ObjectIds, possibly none.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let (dir_name, file_prefix) = prefix.split_at(SHARD_LENGTH.min(prefix.len()));
        let dir_path = self.path.join(dir_name);

        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix) {
                // temp files and strays are not objects
                if let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}")) {
                    matches.push(oid);
                }
            }
        }

        Ok(matches)
    }

    fn load_payload(&self, object_id: &ObjectId, expected: ObjectType) -> Result<Bytes> {
        let (actual, payload) = self.read_record(object_id)?;

        if actual != expected {
            return Err(Error::TypeMismatch {
                oid: object_id.clone(),
                expected,
                actual,
            });
        }

        Ok(payload)
    }

    fn read_record(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let object_path = self.locate(object_id);
        if !object_path.is_file() {
            return Err(Error::NotFound(object_id.to_string()));
        }

        let object_content = Self::decompress(&std::fs::read(&object_path)?)
            .map_err(|_| Error::corrupt(object_id, "unable to decompress object content"))?;
        let (object_type, payload) = ObjectType::parse_frame(&object_content)
            .map_err(|err| Error::corrupt(object_id, err.to_string()))?;

        Ok((object_type, object_content.slice_ref(payload)))
    }

    fn write_object(&self, object_path: &Path, object_content: Bytes) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(object_path.to_path_buf()))?;

        let object_content = Self::compress(&object_content)?;

        // the temp file is removed on drop unless it was persisted
        let mut temp_object = tempfile::Builder::new()
            .prefix(TEMP_OBJECT_PREFIX)
            .tempfile_in(object_dir)?;
        temp_object.write_all(&object_content)?;
        temp_object.as_file().sync_all()?;

        temp_object.persist(object_path).map_err(|err| err.error)?;

        Ok(())
    }

    fn compress(data: &[u8]) -> Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;

        Ok(encoder.finish()?.into())
    }

    fn decompress(data: &[u8]) -> Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Snapshot;
    use assert_fs::TempDir;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn objects_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("objects").into_boxed_path())
    }

    fn object_files(dir: &TempDir) -> usize {
        walkdir::WalkDir::new(dir.path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count()
    }

    /// Plant an empty file so prefix scans can see a chosen ID
    fn plant(dir: &TempDir, id: &str) -> ObjectId {
        let oid = ObjectId::try_parse(id).unwrap();
        let path = dir.path().join("objects").join(oid.to_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
        oid
    }

    #[rstest]
    fn identical_payloads_share_one_record(objects_dir: TempDir) {
        let database = database(&objects_dir);

        let first = database.persist(ObjectType::Blob, b"same").unwrap();
        let second = database.persist(ObjectType::Blob, b"same").unwrap();

        assert_eq!(first, second);
        assert_eq!(object_files(&objects_dir), 1);
    }

    #[rstest]
    fn record_is_placed_in_its_shard(objects_dir: TempDir) {
        let database = database(&objects_dir);

        let oid = database.persist(ObjectType::Blob, b"hi").unwrap();
        let path = database.locate(&oid);

        assert!(path.is_file());
        assert_eq!(
            path.parent().unwrap().file_name().unwrap().to_string_lossy(),
            &oid.as_ref()[..2]
        );
        assert_eq!(path.file_name().unwrap().to_string_lossy(), &oid.as_ref()[2..]);
    }

    #[rstest]
    fn loading_missing_record_is_not_found(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = ObjectId::try_parse("1".repeat(40)).unwrap();

        assert!(matches!(
            database.load(&oid, ObjectType::Blob),
            Err(Error::NotFound(_))
        ));
    }

    #[rstest]
    fn loading_with_wrong_kind_is_a_type_mismatch(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = database.store(&Commit::root()).unwrap();

        let result = database.load(&oid, ObjectType::Blob);

        assert!(matches!(
            result,
            Err(Error::TypeMismatch {
                expected: ObjectType::Blob,
                actual: ObjectType::Commit,
                ..
            })
        ));
    }

    #[rstest]
    fn commit_survives_storage(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let blob_id = database.persist(ObjectType::Blob, b"hi").unwrap();
        let commit = Commit::new(
            vec![database.store(&Commit::root()).unwrap()],
            Snapshot::from([(PathBuf::from("f.txt"), blob_id)]),
            "first".to_string(),
            chrono::Local::now().fixed_offset(),
        );

        let oid = database.store(&commit).unwrap();

        assert_eq!(database.load_commit(&oid).unwrap(), commit);
        assert!(database.verify(&oid).is_ok());
    }

    #[rstest]
    fn ambiguous_prefix_is_reported(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let first = plant(&objects_dir, &format!("abc1234{}", "0".repeat(33)));
        plant(&objects_dir, &format!("abc1235{}", "0".repeat(33)));

        assert!(matches!(
            database.resolve_prefix("abc123"),
            Err(Error::AmbiguousPrefix { candidates, .. }) if candidates.len() == 2
        ));
        assert_eq!(database.resolve_prefix("abc1234").unwrap(), first);
        assert_eq!(database.resolve_prefix("ABC1234").unwrap(), first);
    }

    #[rstest]
    fn unique_prefix_shorter_than_minimum_is_rejected(objects_dir: TempDir) {
        let database = database(&objects_dir);
        plant(&objects_dir, &format!("abc1234{}", "0".repeat(33)));

        assert!(matches!(
            database.resolve_prefix("abc12"),
            Err(Error::InvalidDigest(_))
        ));
    }

    #[rstest]
    fn unknown_prefix_is_not_found(objects_dir: TempDir) {
        let database = database(&objects_dir);

        assert!(matches!(
            database.resolve_prefix("deadbeef"),
            Err(Error::NotFound(_))
        ));
    }

    #[rstest]
    fn malformed_prefix_is_rejected_before_scanning(objects_dir: TempDir) {
        let database = database(&objects_dir);

        assert!(matches!(
            database.resolve_prefix("not-hex!"),
            Err(Error::InvalidDigest(_))
        ));
        assert!(!objects_dir.path().join("objects").exists());
    }

    #[rstest]
    fn full_length_id_is_returned_unchanged(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let id = "f".repeat(40);

        assert_eq!(database.resolve_prefix(&id).unwrap().as_ref(), id);
    }

    #[rstest]
    fn tampered_record_fails_verification(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = database.persist(ObjectType::Blob, b"original").unwrap();
        let tampered = Database::compress(&frame(ObjectType::Blob, b"tampered")).unwrap();
        std::fs::write(database.locate(&oid), tampered).unwrap();

        let result = database.verify(&oid);

        assert!(matches!(&result, Err(err) if err.is_corruption()));
    }

    #[rstest]
    fn garbage_record_is_corrupt(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = database.persist(ObjectType::Blob, b"original").unwrap();
        std::fs::write(database.locate(&oid), b"not zlib at all").unwrap();

        assert!(matches!(
            database.load_blob(&oid),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[rstest]
    fn failed_write_leaves_no_temp_file(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = digest_of(ObjectType::Blob, b"blocked").unwrap();
        let object_path = database.locate(&oid);
        // a non-empty directory where the record should go makes the rename fail
        std::fs::create_dir_all(object_path.join("occupied")).unwrap();

        let result = database.write_object(&object_path, frame(ObjectType::Blob, b"blocked"));

        assert!(result.is_err());
        let shard_entries = std::fs::read_dir(object_path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect::<Vec<_>>();
        assert_eq!(shard_entries, vec![object_path.file_name().unwrap().to_owned()]);
    }

    #[rstest]
    fn corrupt_parent_id_fails_verification_as_corruption(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = database
            .persist(
                ObjectType::Commit,
                b"version 1\nparent not-a-digest\ncommitted 0 +0000\nauthored 0 +0000\n\nmsg",
            )
            .unwrap();

        assert!(matches!(database.load_commit(&oid), Err(err) if err.is_corruption()));
        assert!(matches!(database.verify(&oid), Err(err) if err.is_corruption()));
    }

    proptest! {
        #[test]
        fn any_payload_loads_back_unchanged(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let dir = TempDir::new().unwrap();
            let database = database(&dir);

            let oid = database.persist(ObjectType::Blob, &payload).unwrap();
            let blob = database.load_blob(&oid).unwrap();

            prop_assert_eq!(blob.content().as_ref(), payload.as_slice());
        }
    }
}
