use serde::{Deserialize, Serialize};

use crate::url::join_path;

/// Type of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// Status of a single file or directory, as returned by GETFILESTATUS or LISTSTATUS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Name relative to the listed directory; empty for GETFILESTATUS
    #[serde(default)]
    pub path_suffix: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub group: String,
    /// Octal permission string, e.g. `"755"` or `"1777"`
    #[serde(default)]
    pub permission: String,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub access_time: i64,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub modification_time: i64,
    #[serde(default)]
    pub replication: u16,
    #[serde(default)]
    pub block_size: u64,
    /// Link target, present only for symlinks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<String>,
    #[serde(skip)]
    full_path: Option<String>,
}

impl FileStatus {
    /// Absolute remote path, known only for entries that came from a listing
    pub fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// Result of listing a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// The path that was listed
    pub directory_path: Option<String>,
    /// Entries in server order
    pub entries: Vec<FileStatus>,
}

impl DirectoryListing {
    pub(crate) fn new(entries: Vec<FileStatus>) -> Self {
        Self {
            directory_path: None,
            entries,
        }
    }

    /// Record the listed path and derive every child's `full_path` from it
    pub(crate) fn at_path(mut self, path: &str) -> Self {
        for entry in &mut self.entries {
            entry.full_path = Some(join_path(path, &entry.path_suffix));
        }
        self.directory_path = Some(path.to_string());
        self
    }

    pub fn directories(&self) -> impl Iterator<Item = &FileStatus> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    pub fn files(&self) -> impl Iterator<Item = &FileStatus> {
        self.entries.iter().filter(|e| e.is_file())
    }
}

/// Aggregate usage of a directory tree (GETCONTENTSUMMARY)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub directory_count: u64,
    pub file_count: u64,
    /// Bytes used by file content
    pub length: u64,
    /// Bytes used including replication
    pub space_consumed: u64,
    /// Namespace quota; negative when unset
    #[serde(default = "unset_quota")]
    pub quota: i64,
    /// Disk space quota; negative when unset
    #[serde(default = "unset_quota")]
    pub space_quota: i64,
}

fn unset_quota() -> i64 {
    -1
}

impl ContentSummary {
    pub fn namespace_quota(&self) -> Option<u64> {
        u64::try_from(self.quota).ok()
    }

    pub fn disk_space_quota(&self) -> Option<u64> {
        u64::try_from(self.space_quota).ok()
    }
}

/// File checksum (GETFILECHECKSUM)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    /// e.g. `MD5-of-0MD5-of-512CRC32C`
    pub algorithm: String,
    /// Hex-encoded digest, opaque to the client
    pub bytes: String,
    pub length: u32,
}

/// `{"boolean": ...}` envelope returned by mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanResult {
    #[serde(rename = "boolean")]
    pub value: bool,
}

/// `{"Path": ...}` returned by GETHOMEDIRECTORY
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct HomeDirectory {
    #[serde(rename = "Path")]
    pub path: String,
}

/// What a directory transfer did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Destination paths of every file written, in transfer order
    pub files_written: Vec<String>,
    /// Directories confirmed to exist at the destination, including the root
    ///
    /// Counts directories that were already present as well as new ones.
    pub directories_ensured: usize,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, file_type: FileType) -> FileStatus {
        FileStatus {
            path_suffix: name.to_string(),
            file_type,
            length: 0,
            owner: "hdfs".to_string(),
            group: "supergroup".to_string(),
            permission: "755".to_string(),
            access_time: 0,
            modification_time: 0,
            replication: 0,
            block_size: 0,
            symlink: None,
            full_path: None,
        }
    }

    #[test]
    fn test_listing_views_and_full_path() {
        let listing = DirectoryListing::new(vec![
            status("a.txt", FileType::File),
            status("sub", FileType::Directory),
            status("link", FileType::Symlink),
            status("b.txt", FileType::File),
        ])
        .at_path("/data/");

        assert_eq!(listing.directory_path.as_deref(), Some("/data/"));
        let files: Vec<_> = listing.files().map(|f| f.path_suffix.as_str()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
        let dirs: Vec<_> = listing.directories().map(|f| f.full_path().unwrap()).collect();
        assert_eq!(dirs, vec!["/data/sub"]);
        assert_eq!(listing.entries[2].full_path(), Some("/data/link"));
    }

    #[test]
    fn test_quota_sentinel() {
        let summary = ContentSummary {
            directory_count: 2,
            file_count: 1,
            length: 24930,
            space_consumed: 24930,
            quota: -1,
            space_quota: 1_000_000,
        };
        assert_eq!(summary.namespace_quota(), None);
        assert_eq!(summary.disk_space_quota(), Some(1_000_000));
    }
}
