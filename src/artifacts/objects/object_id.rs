//! Gitlet object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings representing SHA-1
//! hashes. They uniquely identify every record in the object database.
//!
//! ## Format
//!
//! - Full: 40 hex characters (e.g., "abc123...def")
//! - Short: First 7 characters (e.g., "abc1234")
//!
//! ## Storage
//!
//! Objects are stored in `.gitlet/objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, SHARD_LENGTH};
use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;

/// Gitlet object identifier (SHA-1 hash)
///
/// Always holds a validated, lowercase, 40-character hexadecimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// # Arguments
    ///
    /// * `id` - 40-character hexadecimal string (either case)
    ///
    /// # Returns
    ///
    /// Validated ObjectId or `InvalidDigest` if the length or alphabet is wrong
    pub fn try_parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != OBJECT_ID_LENGTH || !is_hex(&id) {
            return Err(Error::InvalidDigest(id));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from raw hash output
    pub fn from_hash(hash: &[u8]) -> Result<Self> {
        let hex = hash.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
        Self::try_parse(hex)
    }

    /// Check whether a string is usable as an abbreviated object ID
    ///
    /// A prefix must be long enough to name a shard directory, no longer than a
    /// full ID, and made of hex digits only.
    pub fn is_valid_prefix(prefix: &str) -> bool {
        (SHARD_LENGTH..=OBJECT_ID_LENGTH).contains(&prefix.len()) && is_hex(prefix)
    }

    /// Write the object ID in binary format (20 bytes)
    ///
    /// Used when serializing staging area entries.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let hex40 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16)
                .map_err(|_| Error::InvalidDigest(self.0.clone()))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut raw)?;

        Self::from_hash(&raw)
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the shard directory.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(SHARD_LENGTH);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

fn is_hex(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit())
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
