use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};

/// Encode a record into its versioned payload (without the object frame)
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decode a record from its payload
pub trait Unpackable {
    fn deserialize(payload: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable + Unpackable {
    /// Kind tag written in front of the payload
    const KIND: ObjectType;

    fn object_type(&self) -> ObjectType {
        Self::KIND
    }

    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        let payload = self.serialize()?;
        digest_of(Self::KIND, &payload)
    }
}

/// Frame a payload as `<kind> <size>\0<payload>`
pub fn frame(kind: ObjectType, payload: &[u8]) -> Bytes {
    let header = format!("{} {}\0", kind.as_str(), payload.len());

    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(payload);

    Bytes::from(framed)
}

/// Digest of the tuple (kind tag, payload length, payload bytes)
///
/// The kind tag and explicit length keep records of different kinds from
/// colliding even when their payloads happen to be identical.
pub fn digest_of(kind: ObjectType, payload: &[u8]) -> Result<ObjectId> {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {}\0", kind.as_str(), payload.len()).as_bytes());
    hasher.update(payload);

    ObjectId::from_hash(&hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}
