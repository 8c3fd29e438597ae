use crate::errors::{Error, Result};

/// Kind tag of a record stored in the object database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Commit => "commit",
        }
    }

    /// Split a framed record into its kind tag and payload
    ///
    /// The frame is `<kind> <size>\0<payload>`; a size that disagrees with the
    /// actual payload length is reported as corruption.
    pub fn parse_frame(data: &[u8]) -> Result<(ObjectType, &[u8])> {
        let space = data
            .iter()
            .position(|&byte| byte == b' ')
            .ok_or_else(|| Error::corrupt("object header", "missing kind separator"))?;
        let nul = data
            .iter()
            .position(|&byte| byte == b'\0')
            .filter(|&nul| nul > space)
            .ok_or_else(|| Error::corrupt("object header", "missing size terminator"))?;

        let kind = std::str::from_utf8(&data[..space])
            .map_err(|_| Error::corrupt("object header", "kind is not valid UTF-8"))?;
        let object_type = ObjectType::try_from(kind)?;

        let size = std::str::from_utf8(&data[space + 1..nul])
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .ok_or_else(|| Error::corrupt("object header", "size is not a number"))?;

        let payload = &data[nul + 1..];
        if payload.len() != size {
            return Err(Error::corrupt(
                "object header",
                format!("declared size {size}, found {} bytes", payload.len()),
            ));
        }

        Ok((object_type, payload))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "commit" => Ok(ObjectType::Commit),
            other => Err(Error::corrupt(
                "object header",
                format!("unknown object kind {other:?}"),
            )),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
