//! Gitlet commit object
//!
//! Commits are immutable snapshots of the tracked files at one point in history.
//! They contain:
//! - Parent commit ID(s) (none for the root commit, two or more for merges)
//! - Commit and author timestamps
//! - The snapshot: every tracked path mapped to its blob ID
//! - Commit message
//!
//! ## Format (version 1)
//!
//! On disk:
//! ```text
//! commit <size>\0
//! version 1
//! parent <parent-sha>
//! committed <unix-seconds> <timezone>
//! authored <unix-seconds> <timezone>
//! file <blob-sha> <path>
//!
//! <commit message>
//! ```
//!
//! The payload carries the logical fields and nothing else, so the commit ID
//! is derived from its content alone.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Encoding version written in the first line of every commit payload
pub const COMMIT_FORMAT_VERSION: u32 = 1;

/// Message of the root commit shared by every repository
pub const ROOT_COMMIT_MESSAGE: &str = "initial commit";

/// Environment variable overriding the timestamp of new commits
pub const COMMIT_DATE_ENV: &str = "GITLET_COMMIT_DATE";

/// Tracked paths mapped to the blob holding their content
pub type Snapshot = BTreeMap<PathBuf, ObjectId>;

/// Slim representation of a commit
///
/// Contains only what history traversal needs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    pub oid: ObjectId,
    pub parents: Vec<ObjectId>,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for the root commit, multiple for merge commits)
    parents: Vec<ObjectId>,
    committed_at: DateTime<FixedOffset>,
    authored_at: DateTime<FixedOffset>,
    snapshot: Snapshot,
    message: String,
}

impl Commit {
    /// Create a new commit
    ///
    /// Author and commit timestamps are both taken from `timestamp`, truncated
    /// to whole seconds (the precision the encoding keeps).
    pub fn new(
        parents: Vec<ObjectId>,
        snapshot: Snapshot,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);

        Commit {
            parents,
            committed_at: timestamp,
            authored_at: timestamp,
            snapshot,
            message,
        }
    }

    /// The root commit: no parents, empty snapshot, epoch timestamp
    ///
    /// This is a plain value, so every repository computes the same ID for it.
    pub fn root() -> Self {
        Commit::new(
            Vec::new(),
            Snapshot::new(),
            ROOT_COMMIT_MESSAGE.to_string(),
            DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
        )
    }

    /// Timestamp for a new commit: `GITLET_COMMIT_DATE` when set and parsable, now otherwise
    ///
    /// The variable accepts RFC 2822 or `%Y-%m-%d %H:%M:%S %z`.
    pub fn timestamp_from_env() -> DateTime<FixedOffset> {
        std::env::var(COMMIT_DATE_ENV)
            .ok()
            .and_then(|date_str| {
                DateTime::parse_from_rfc2822(&date_str)
                    .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                    .ok()
            })
            .unwrap_or_else(|| chrono::Local::now().fixed_offset())
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Blob tracked at `path` in this commit
    pub fn tracked(&self, path: &Path) -> Option<&ObjectId> {
        self.snapshot.get(path)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.committed_at
    }

    pub fn authored_at(&self) -> DateTime<FixedOffset> {
        self.authored_at
    }

    /// Format timestamp in human-readable form
    ///
    /// String like "Thu Jan 1 00:00:00 1970 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.committed_at
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn slim(&self, oid: ObjectId) -> SlimCommit {
        SlimCommit {
            oid,
            parents: self.parents.clone(),
            timestamp: self.committed_at,
        }
    }

    /// Recompute the ID from the logical fields and compare it with `expected`
    pub fn verify_integrity(&self, expected: &ObjectId) -> Result<bool> {
        Ok(&self.object_id()? == expected)
    }

    fn header_lines(&self) -> Result<Vec<String>> {
        let mut lines = vec![format!("version {COMMIT_FORMAT_VERSION}")];

        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("committed {}", format_timestamp(&self.committed_at)));
        lines.push(format!("authored {}", format_timestamp(&self.authored_at)));

        for (path, oid) in &self.snapshot {
            lines.push(format!("file {oid} {}", encode_path(path)?));
        }

        Ok(lines)
    }
}

/// Render a path for the commit payload
///
/// Paths must be relative, valid UTF-8, and free of line breaks and NUL bytes.
pub fn encode_path(path: &Path) -> Result<&str> {
    path.to_str()
        .filter(|path| !path.is_empty() && !path.contains(['\n', '\r', '\0']))
        .filter(|_| path.is_relative())
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
}

fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    format!("{} {}", timestamp.timestamp(), timestamp.format("%z"))
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let invalid = || Error::corrupt("commit", format!("invalid timestamp {value:?}"));

    let (seconds, zone) = value.split_once(' ').ok_or_else(invalid)?;
    let seconds = seconds.parse::<i64>().map_err(|_| invalid())?;

    let (sign, digits) = match zone.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => return Err(invalid()),
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours = digits[..2].parse::<i32>().map_err(|_| invalid())?;
    let minutes = digits[2..].parse::<i32>().map_err(|_| invalid())?;
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)?;

    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(invalid)
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let content = format!("{}\n\n{}", self.header_lines()?.join("\n"), self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(payload: Bytes) -> Result<Self> {
        let content = std::str::from_utf8(&payload)
            .map_err(|_| Error::corrupt("commit", "payload is not valid UTF-8"))?;
        let (header, message) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::corrupt("commit", "missing message separator"))?;

        let mut lines = header.lines();
        match lines.next() {
            Some(line) if line == format!("version {COMMIT_FORMAT_VERSION}") => {}
            other => {
                return Err(Error::corrupt(
                    "commit",
                    format!("unsupported encoding version line {other:?}"),
                ));
            }
        }

        let mut parents = Vec::new();
        let mut committed_at = None;
        let mut authored_at = None;
        let mut snapshot = Snapshot::new();

        for line in lines {
            let (field, value) = line
                .split_once(' ')
                .ok_or_else(|| Error::corrupt("commit", format!("malformed line {line:?}")))?;

            match field {
                "parent" => parents.push(
                    ObjectId::try_parse(value)
                        .map_err(|err| Error::corrupt("commit", err.to_string()))?,
                ),
                "committed" => committed_at = Some(parse_timestamp(value)?),
                "authored" => authored_at = Some(parse_timestamp(value)?),
                "file" => {
                    let (oid, path) = value.split_once(' ').ok_or_else(|| {
                        Error::corrupt("commit", format!("malformed file line {line:?}"))
                    })?;
                    let oid = ObjectId::try_parse(oid)
                        .map_err(|err| Error::corrupt("commit", err.to_string()))?;
                    snapshot.insert(PathBuf::from(path), oid);
                }
                other => {
                    return Err(Error::corrupt(
                        "commit",
                        format!("unknown field {other:?}"),
                    ));
                }
            }
        }

        Ok(Commit {
            parents,
            committed_at: committed_at
                .ok_or_else(|| Error::corrupt("commit", "missing commit timestamp"))?,
            authored_at: authored_at
                .ok_or_else(|| Error::corrupt("commit", "missing author timestamp"))?,
            snapshot,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    const KIND: ObjectType = ObjectType::Commit;

    fn display(&self) -> String {
        let mut lines = Vec::new();

        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("date   {}", self.readable_timestamp()));
        for (path, oid) in &self.snapshot {
            lines.push(format!("file   {oid} {}", path.display()));
        }
        lines.push(String::new());
        lines.push(self.message.clone());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn oid(fill: char) -> ObjectId {
        ObjectId::try_parse(fill.to_string().repeat(40)).unwrap()
    }

    fn sample_commit() -> Commit {
        let timestamp = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
            .unwrap();
        let snapshot = Snapshot::from([
            (PathBuf::from("a/b.txt"), oid('a')),
            (PathBuf::from("f.txt"), oid('b')),
        ]);

        Commit::new(vec![oid('c')], snapshot, "first\n\nbody".to_string(), timestamp)
    }

    #[test]
    fn root_commit_is_the_same_value_every_time() {
        let first = Commit::root();
        let second = Commit::root();

        assert_eq!(first, second);
        assert_eq!(first.object_id().unwrap(), second.object_id().unwrap());
        assert!(first.is_root());
        assert_eq!(first.message(), ROOT_COMMIT_MESSAGE);
        assert_eq!(first.timestamp().timestamp(), 0);
    }

    #[test]
    fn decoding_restores_every_logical_field() {
        let commit = sample_commit();
        let decoded = Commit::deserialize(commit.serialize().unwrap()).unwrap();

        assert_eq!(decoded, commit);
        assert_eq!(decoded.timestamp().offset().local_minus_utc(), 7200);
        assert_eq!(decoded.authored_at(), decoded.timestamp());
    }

    #[test]
    fn payload_lists_fields_in_canonical_order() {
        let payload = sample_commit().serialize().unwrap();
        let text = std::str::from_utf8(&payload).unwrap();

        let expected = format!(
            "version 1\nparent {}\ncommitted 1709289000 +0200\nauthored 1709289000 +0200\nfile {} a/b.txt\nfile {} f.txt\n\nfirst\n\nbody",
            oid('c'),
            oid('a'),
            oid('b')
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn sub_second_precision_does_not_change_identity() {
        let timestamp = DateTime::from_timestamp(1_700_000_000, 123_456_789)
            .unwrap()
            .fixed_offset();
        let precise = Commit::new(vec![], Snapshot::new(), "m".into(), timestamp);
        let truncated = Commit::new(
            vec![],
            Snapshot::new(),
            "m".into(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap().fixed_offset(),
        );

        assert_eq!(precise.object_id().unwrap(), truncated.object_id().unwrap());
    }

    #[test]
    fn verify_integrity_detects_foreign_id() {
        let commit = sample_commit();
        let id = commit.object_id().unwrap();

        assert!(commit.verify_integrity(&id).unwrap());
        assert!(!Commit::root().verify_integrity(&id).unwrap());
    }

    #[test]
    fn rejects_unknown_encoding_version() {
        let payload = Bytes::from("version 2\ncommitted 0 +0000\nauthored 0 +0000\n\nmsg");

        assert!(matches!(
            Commit::deserialize(payload),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[rstest]
    #[case("version 1\nparent not-a-digest\ncommitted 0 +0000\nauthored 0 +0000\n\nmsg")]
    #[case("version 1\ncommitted 0 +0000\nauthored 0 +0000\nfile xyz f.txt\n\nmsg")]
    fn malformed_ids_in_a_stored_commit_are_corruption(#[case] payload: &'static str) {
        assert!(matches!(
            Commit::deserialize(Bytes::from(payload)),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn rejects_paths_with_line_breaks() {
        let snapshot = Snapshot::from([(PathBuf::from("bad\nname"), oid('a'))]);
        let commit = Commit::new(vec![], snapshot, "m".into(), Commit::root().timestamp());

        assert!(matches!(commit.serialize(), Err(Error::InvalidPath(_))));
    }
}
