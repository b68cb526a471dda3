//! Soft delete through a per-user trash directory

use log::{info, warn};

use crate::client::{require_path, WebHdfsClient};
use crate::error::{Error, Result};
use crate::url::{file_name, join_path, Op};

/// Location of the current trash checkpoint, relative to a home directory
pub const TRASH_CURRENT: &str = ".Trash/Current";

/// Permission of a newly created trash directory, matching Hadoop's own trash
const TRASH_PERMISSION: &str = "700";

impl WebHdfsClient {
    /// Directory soft-deleted paths are moved into
    ///
    /// `/user/<user>/.Trash/Current` for a configured user, otherwise the trash
    /// under the server-reported home directory.
    pub async fn trash_directory(&self) -> Result<String> {
        match self.user() {
            Some(user) => Ok(format!("/user/{user}/{TRASH_CURRENT}")),
            None => Ok(join_path(self.home_directory().await?, TRASH_CURRENT)),
        }
    }

    /// Delete a file or directory
    ///
    /// With `skip_trash` the path is removed for good; `recursive` must be set
    /// to remove a non-empty directory. Otherwise the path is moved into the
    /// trash (see [`move_to_trash`](Self::move_to_trash)) and `recursive` has no
    /// effect, since a rename always carries the whole subtree.
    pub async fn delete(&self, path: &str, recursive: bool, skip_trash: bool) -> Result<bool> {
        require_path(path, "path")?;
        if skip_trash {
            return self
                .call_boolean(path, Op::Delete, &[("recursive", recursive.to_string())])
                .await;
        }
        Ok(self.move_to_trash(path).await?.is_some())
    }

    /// Move `path` into the trash without overwriting anything already there
    ///
    /// The first candidate is the plain base name; after that `(2)`, `(3)`, ...
    /// is inserted before the extension until a free name is found. Returns the
    /// trash path on success and `None` if the server refused the rename.
    ///
    /// Probing and renaming are separate requests, so two clients trashing the
    /// same name at the same moment can still race for one candidate.
    pub async fn move_to_trash(&self, path: &str) -> Result<Option<String>> {
        require_path(path, "path")?;
        let name = file_name(path);
        if name.is_empty() {
            return Err(Error::invalid_argument("cannot move the root directory to trash"));
        }

        let trash = self.trash_directory().await?;
        if !self.create_directory(&trash, Some(TRASH_PERMISSION)).await? {
            warn!("MKDIRS {trash} returned false");
        }

        let mut attempt = 1;
        let mut candidate = trash_candidate(&trash, name, attempt);
        while self.exists(&candidate).await? {
            attempt += 1;
            candidate = trash_candidate(&trash, name, attempt);
        }

        if self.rename(path, &candidate).await? {
            info!("moved {path} to {candidate}");
            Ok(Some(candidate))
        } else {
            warn!("rename of {path} to {candidate} was refused");
            Ok(None)
        }
    }
}

/// Trash path for the `attempt`-th try at placing `name` in `trash`
pub(crate) fn trash_candidate(trash: &str, name: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return join_path(trash, name);
    }
    let (stem, extension) = split_extension(name);
    join_path(trash, &format!("{stem}({attempt}){extension}"))
}

/// Split at the last dot; a leading dot (`.bashrc`) is not an extension
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}
