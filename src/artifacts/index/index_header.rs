use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;

const UNSET_BASE: [u8; 20] = [0; 20];

#[derive(Debug, Clone, new)]
pub struct IndexHeader {
    pub(crate) marker: String,
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
    pub(crate) removals_count: u32,
    /// Commit the staged changes were recorded against
    pub(crate) base: Option<ObjectId>,
}

impl Packable for IndexHeader {
    fn serialize(&self) -> Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(self.marker.as_bytes())?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entries_count)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.removals_count)?;
        match &self.base {
            Some(base) => base.write_h40_to(&mut bytes)?,
            None => bytes.write_all(&UNSET_BASE)?,
        }

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexHeader {
    fn deserialize(bytes: Bytes) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::corrupt("index", "truncated header"));
        }

        let marker = String::from_utf8(bytes[0..4].to_vec())
            .map_err(|_| Error::corrupt("index", "invalid marker in header"))?;
        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        let entries_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);
        let removals_count = byteorder::NetworkEndian::read_u32(&bytes[12..16]);
        let base = match &bytes[16..36] {
            raw if raw == UNSET_BASE => None,
            raw => Some(ObjectId::from_hash(raw)?),
        };

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
            removals_count,
            base,
        })
    }
}
