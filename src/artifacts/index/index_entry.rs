//! Staging area entry representation
//!
//! Each staged entry records a file path, the blob holding the staged content,
//! and file metadata (size, timestamps). The metadata is only a hint: when it
//! matches the working file, the file does not need to be hashed again. It is
//! never used to decide what gets committed.
//!
//! ## Entry Format
//!
//! ```text
//! ctime (i64) ctime_nsec (u32) mtime (i64) mtime_nsec (u32) size (u64)
//! blob id (20 bytes) path length (u16) path (UTF-8)
//! ```
//!
//! Removal entries only carry the blob ID being removed and the path.

use crate::artifacts::objects::commit::encode_path;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::PathBuf;

/// Size of the fixed part of a staged entry, path length included
pub const ENTRY_FIXED_SIZE: usize = 54;

/// Size of the fixed part of a removal entry, path length included
pub const REMOVAL_FIXED_SIZE: usize = 22;

/// Staged addition or modification of one file
#[derive(Debug, Clone, Default, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: PathBuf,
    /// Blob holding the staged content
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.size == other.size
    }

    pub fn times_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.ctime == other.ctime
            && self.metadata.ctime_nsec == other.ctime_nsec
            && self.metadata.mtime == other.mtime
            && self.metadata.mtime_nsec == other.mtime_nsec
    }

    /// Whether the working file can be assumed unchanged without hashing it
    pub fn is_unchanged(&self, other: &EntryMetadata) -> bool {
        self.stat_match(other) && self.times_match(other)
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.oid == other.oid
    }
}

impl Eq for IndexEntry {}

/// File metadata stored in staged entries
///
/// - `ctime`: File status change time (inode modification)
/// - `mtime`: File content modification time
///
/// Both include nanosecond precision for accurate change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    /// File size in bytes
    pub size: u64,
}

impl From<&Metadata> for EntryMetadata {
    fn from(metadata: &Metadata) -> Self {
        Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            size: metadata.size(),
        }
    }
}

/// Staged removal of a tracked file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RemovalEntry {
    pub name: PathBuf,
    /// Blob tracked at `name` in the base commit
    pub oid: ObjectId,
}

fn write_path(bytes: &mut Vec<u8>, name: &std::path::Path) -> Result<()> {
    let name = encode_path(name)?;
    let length = u16::try_from(name.len()).map_err(|_| Error::InvalidPath(name.into()))?;

    bytes.write_u16::<byteorder::NetworkEndian>(length)?;
    bytes.write_all(name.as_bytes())?;

    Ok(())
}

fn read_path(bytes: &[u8], length_offset: usize) -> Result<PathBuf> {
    let length = byteorder::NetworkEndian::read_u16(&bytes[length_offset..length_offset + 2]);
    let name = bytes
        .get(length_offset + 2..length_offset + 2 + length as usize)
        .ok_or_else(|| Error::corrupt("index", "truncated entry path"))?;
    let name = std::str::from_utf8(name)
        .map_err(|_| Error::corrupt("index", "entry path is not valid UTF-8"))?;

    Ok(PathBuf::from(name))
}

/// Length of the variable path part that follows a fixed entry prefix
pub fn path_length(fixed: &[u8]) -> usize {
    byteorder::NetworkEndian::read_u16(&fixed[fixed.len() - 2..]) as usize
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let mut entry_bytes = Vec::with_capacity(ENTRY_FIXED_SIZE);
        entry_bytes.write_i64::<byteorder::NetworkEndian>(self.metadata.ctime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_i64::<byteorder::NetworkEndian>(self.metadata.mtime)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u64::<byteorder::NetworkEndian>(self.metadata.size)?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        write_path(&mut entry_bytes, &self.name)?;

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(bytes: Bytes) -> Result<Self> {
        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(Error::corrupt("index", "invalid entry size"));
        }

        let ctime = byteorder::NetworkEndian::read_i64(&bytes[0..8]);
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&bytes[8..12]) as i64;
        let mtime = byteorder::NetworkEndian::read_i64(&bytes[12..20]);
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&bytes[20..24]) as i64;
        let size = byteorder::NetworkEndian::read_u64(&bytes[24..32]);
        let oid = ObjectId::from_hash(&bytes[32..52])?;
        let name = read_path(&bytes, 52)?;

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                size,
            },
        })
    }
}

impl Packable for RemovalEntry {
    fn serialize(&self) -> Result<Bytes> {
        let mut entry_bytes = Vec::with_capacity(REMOVAL_FIXED_SIZE);
        self.oid.write_h40_to(&mut entry_bytes)?;
        write_path(&mut entry_bytes, &self.name)?;

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for RemovalEntry {
    fn deserialize(bytes: Bytes) -> Result<Self> {
        if bytes.len() < REMOVAL_FIXED_SIZE {
            return Err(Error::corrupt("index", "invalid removal entry size"));
        }

        let oid = ObjectId::from_hash(&bytes[0..20])?;
        let name = read_path(&bytes, 20)?;

        Ok(RemovalEntry { name, oid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use sha1::Digest;

    #[fixture]
    fn oid() -> ObjectId {
        let mut hasher = sha1::Sha1::new();
        hasher.update("test data");
        ObjectId::from_hash(&hasher.finalize()).unwrap()
    }

    #[fixture]
    fn entry_metadata() -> EntryMetadata {
        EntryMetadata {
            ctime: 1_700_000_000,
            ctime_nsec: 42,
            mtime: 1_700_000_001,
            mtime_nsec: 7,
            size: 11,
        }
    }

    #[rstest]
    fn test_entry_layout(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a/b.txt"), oid, entry_metadata);

        let bytes = entry.serialize().unwrap();

        pretty_assertions::assert_eq!(bytes.len(), ENTRY_FIXED_SIZE + "a/b.txt".len());
        pretty_assertions::assert_eq!(path_length(&bytes[..ENTRY_FIXED_SIZE]), 7);
    }

    #[rstest]
    fn test_entry_decodes_metadata(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a/b.txt"), oid, entry_metadata.clone());

        let decoded = IndexEntry::deserialize(entry.serialize().unwrap()).unwrap();

        pretty_assertions::assert_eq!(decoded.name, PathBuf::from("a/b.txt"));
        pretty_assertions::assert_eq!(decoded.metadata, entry_metadata);
    }

    #[rstest]
    fn test_removal_entry_layout(oid: ObjectId) {
        let entry = RemovalEntry::new(PathBuf::from("gone.txt"), oid);

        let bytes = entry.serialize().unwrap();

        pretty_assertions::assert_eq!(bytes.len(), REMOVAL_FIXED_SIZE + "gone.txt".len());
        pretty_assertions::assert_eq!(RemovalEntry::deserialize(bytes).unwrap(), entry);
    }

    #[rstest]
    fn test_unchanged_requires_size_and_times(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("f"), oid, entry_metadata.clone());

        assert!(entry.is_unchanged(&entry_metadata));
        assert!(!entry.is_unchanged(&EntryMetadata {
            mtime_nsec: 8,
            ..entry_metadata.clone()
        }));
        assert!(!entry.is_unchanged(&EntryMetadata {
            size: 12,
            ..entry_metadata
        }));
    }

    #[test]
    fn test_truncated_entry_is_corrupt() {
        let result = IndexEntry::deserialize(Bytes::from_static(&[0u8; 10]));

        assert!(matches!(result, Err(Error::CorruptRecord { .. })));
    }
}
