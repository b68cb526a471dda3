//! Mapping of WebHDFS JSON bodies onto typed entities
//!
//! Several responses wrap their payload in a named envelope
//! (`{"FileStatus": {...}}`, `{"ContentSummary": {...}}`). Each entity names its
//! own envelope key; when the key is absent the object is decoded directly.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ErrorKind, ProtocolError};
use crate::types::{
    BooleanResult, ContentSummary, DirectoryListing, FileChecksum, FileStatus, HomeDirectory,
};

/// A typed result decoded from one JSON response
pub trait Entity: Sized {
    /// Top-level key the server may wrap this entity in
    const ENVELOPE: Option<&'static str>;

    fn decode(value: Value) -> serde_json::Result<Self>;
}

fn unwrap_envelope(mut value: Value, key: Option<&str>) -> Value {
    if let (Some(key), Value::Object(map)) = (key, &mut value) {
        if let Some(inner) = map.remove(key) {
            return inner;
        }
    }
    value
}

fn decode_enveloped<T: DeserializeOwned>(value: Value, key: Option<&str>) -> serde_json::Result<T> {
    serde_json::from_value(unwrap_envelope(value, key))
}

impl Entity for FileStatus {
    const ENVELOPE: Option<&'static str> = Some("FileStatus");

    fn decode(value: Value) -> serde_json::Result<Self> {
        decode_enveloped(value, Self::ENVELOPE)
    }
}

#[derive(Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<FileStatus>,
}

impl Entity for DirectoryListing {
    const ENVELOPE: Option<&'static str> = Some("FileStatuses");

    fn decode(value: Value) -> serde_json::Result<Self> {
        let statuses: FileStatuses = decode_enveloped(value, Self::ENVELOPE)?;
        Ok(DirectoryListing::new(statuses.file_status))
    }
}

impl Entity for ContentSummary {
    const ENVELOPE: Option<&'static str> = Some("ContentSummary");

    fn decode(value: Value) -> serde_json::Result<Self> {
        decode_enveloped(value, Self::ENVELOPE)
    }
}

impl Entity for FileChecksum {
    const ENVELOPE: Option<&'static str> = Some("FileChecksum");

    fn decode(value: Value) -> serde_json::Result<Self> {
        decode_enveloped(value, Self::ENVELOPE)
    }
}

impl Entity for BooleanResult {
    const ENVELOPE: Option<&'static str> = None;

    fn decode(value: Value) -> serde_json::Result<Self> {
        decode_enveloped(value, Self::ENVELOPE)
    }
}

impl Entity for HomeDirectory {
    const ENVELOPE: Option<&'static str> = None;

    fn decode(value: Value) -> serde_json::Result<Self> {
        decode_enveloped(value, Self::ENVELOPE)
    }
}

/// A null payload (or a null envelope) decodes to `None`
impl<T: Entity> Entity for Option<T> {
    const ENVELOPE: Option<&'static str> = T::ENVELOPE;

    fn decode(value: Value) -> serde_json::Result<Self> {
        let wrapped_null = T::ENVELOPE
            .and_then(|key| value.get(key))
            .map_or(false, Value::is_null);
        if value.is_null() || wrapped_null {
            return Ok(None);
        }
        T::decode(value).map(Some)
    }
}

/// Decode a successful response body into `T`
///
/// Fails with [`ErrorKind::ParseError`] when the body is not a JSON object or
/// does not have the shape `T` expects.
pub fn decode_body<T: Entity>(body: &[u8]) -> Result<T, ProtocolError> {
    let raw = || String::from_utf8_lossy(body).into_owned();

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ProtocolError::parse("Result JSON parsing error", e).with_body(raw()))?;

    if !value.is_object() {
        return Err(ProtocolError::new(ErrorKind::ParseError)
            .with_message("Result JSON parsing error: expected an object")
            .with_body(raw()));
    }

    T::decode(value).map_err(|e| ProtocolError::parse("Result JSON parsing error", e).with_body(raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    #[test]
    fn test_file_status() {
        let json = br#"
{
  "FileStatus":
  {
    "accessTime"      : 0,
    "blockSize"       : 0,
    "group"           : "supergroup",
    "length"          : 0,
    "modificationTime": 1320173277227,
    "owner"           : "webuser",
    "pathSuffix"      : "",
    "permission"      : "777",
    "replication"     : 0,
    "type"            : "DIRECTORY"
  }
}
"#;
        let status: FileStatus = decode_body(json).unwrap();
        assert_eq!(status.file_type, FileType::Directory);
        assert_eq!(status.modification_time, 1320173277227);
        assert_eq!(status.permission, "777");
        assert_eq!(status.owner, "webuser");
        assert_eq!(status.full_path(), None);
    }

    #[test]
    fn test_file_status_without_envelope() {
        let json = br#"{"type": "FILE", "length": 12, "pathSuffix": "a.txt", "replication": 3}"#;
        let status: FileStatus = decode_body(json).unwrap();
        assert!(status.is_file());
        assert_eq!(status.length, 12);
        assert_eq!(status.replication, 3);
    }

    #[test]
    fn test_list_status() {
        let json = br#"
{
  "FileStatuses":
  {
    "FileStatus":
    [
      {
        "accessTime"      : 1320171722771,
        "blockSize"       : 33554432,
        "group"           : "supergroup",
        "length"          : 24930,
        "modificationTime": 1320171722771,
        "owner"           : "webuser",
        "pathSuffix"      : "a.patch",
        "permission"      : "644",
        "replication"     : 1,
        "type"            : "FILE"
      },
      {
        "accessTime"      : 0,
        "blockSize"       : 0,
        "group"           : "supergroup",
        "length"          : 0,
        "modificationTime": 1320895981256,
        "owner"           : "szetszwo",
        "pathSuffix"      : "bar",
        "permission"      : "711",
        "replication"     : 0,
        "type"            : "DIRECTORY"
      }
    ]
  }
}
"#;
        let listing: DirectoryListing = decode_body(json).unwrap();
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[0].path_suffix, "a.patch");
        assert_eq!(listing.entries[0].block_size, 33554432);
        assert_eq!(listing.entries[1].file_type, FileType::Directory);
        assert_eq!(listing.files().count(), 1);
        assert_eq!(listing.directories().count(), 1);
        assert_eq!(listing.directory_path, None);
    }

    #[test]
    fn test_list_empty() {
        let listing: DirectoryListing = decode_body(br#"{"FileStatuses": {"FileStatus": []}}"#).unwrap();
        assert!(listing.entries.is_empty());
    }

    #[test]
    fn test_content_summary() {
        let json = br#"
{
  "ContentSummary":
  {
    "directoryCount": 2,
    "fileCount"     : 1,
    "length"        : 24930,
    "quota"         : -1,
    "spaceConsumed" : 24930,
    "spaceQuota"    : -1
  }
}
"#;
        let summary: ContentSummary = decode_body(json).unwrap();
        assert_eq!(summary.directory_count, 2);
        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.length, 24930);
        assert_eq!(summary.namespace_quota(), None);
        assert_eq!(summary.disk_space_quota(), None);
    }

    #[test]
    fn test_file_checksum() {
        let json = br#"
{
  "FileChecksum":
  {
    "algorithm": "MD5-of-1MD5-of-512CRC32",
    "bytes"    : "eadb10de24aa315748930df6e185c0d",
    "length"   : 28
  }
}
"#;
        let checksum: Option<FileChecksum> = decode_body(json).unwrap();
        let checksum = checksum.unwrap();
        assert_eq!(checksum.algorithm, "MD5-of-1MD5-of-512CRC32");
        assert_eq!(checksum.length, 28);

        let missing: Option<FileChecksum> = decode_body(br#"{"FileChecksum": null}"#).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_boolean_and_home_directory() {
        let result: BooleanResult = decode_body(br#"{"boolean": true}"#).unwrap();
        assert!(result.value);

        let home: HomeDirectory = decode_body(br#"{"Path": "/user/szetszwo"}"#).unwrap();
        assert_eq!(home.path, "/user/szetszwo");
    }

    #[test]
    fn test_parse_errors() {
        let err = decode_body::<BooleanResult>(b"not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.raw_body(), Some("not json"));

        let err = decode_body::<BooleanResult>(b"[true]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let err = decode_body::<FileStatus>(br#"{"FileStatus": {"type": "SOCKET"}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.status().is_none());
    }
}
