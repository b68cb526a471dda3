//! Recursive directory transfer
//!
//! Both directions walk the tree depth-first over an explicit stack and issue
//! one request at a time. The first failure ends the walk; whatever was already
//! transferred stays where it is.

use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::fs;
use tokio_util::sync::CancellationToken;

use crate::client::{require_path, TransferOptions, WebHdfsClient};
use crate::error::{Error, ErrorKind, ProtocolError, Result};
use crate::permission::validate_permission;
use crate::types::TransferSummary;
use crate::url::join_path;

impl WebHdfsClient {
    /// Mirror a local directory tree under `remote`
    ///
    /// Creates `remote` and every subdirectory with MKDIRS and uploads each
    /// regular file with CREATE. Local symlinks are skipped. A MKDIRS answered
    /// with `false` ends the walk with a `Conflict` error.
    pub async fn upload_directory(
        &self,
        local: impl AsRef<Path>,
        remote: &str,
        options: &TransferOptions,
    ) -> Result<TransferSummary> {
        let local = local.as_ref();
        require_path(remote, "remote directory")?;
        require_local(local)?;
        validate_permission(&options.permission)?;

        if !fs::metadata(local).await?.is_dir() {
            return Err(Error::invalid_argument(format!(
                "{} is not a directory",
                local.display()
            )));
        }

        let mut summary = TransferSummary::default();
        let mut pending = vec![(local.to_path_buf(), remote.to_string())];

        while let Some((local_dir, remote_dir)) = pending.pop() {
            check_cancelled(options.cancel.as_ref())?;
            if !self
                .create_directory(&remote_dir, Some(&options.permission))
                .await?
            {
                return Err(ProtocolError::new(ErrorKind::Conflict)
                    .with_message(format!("MKDIRS refused to create {remote_dir}"))
                    .into());
            }
            summary.directories_ensured += 1;

            let mut subdirectories = Vec::new();
            let mut entries = fs::read_dir(&local_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let source = entry.path();
                let target = join_path(&remote_dir, &entry.file_name().to_string_lossy());

                let file_type = entry.file_type().await?;
                if file_type.is_symlink() {
                    debug!("skipping symlink {}", source.display());
                } else if file_type.is_dir() {
                    subdirectories.push((source, target));
                } else if file_type.is_file() {
                    check_cancelled(options.cancel.as_ref())?;
                    summary.total_bytes += self.upload_file(&source, &target, options).await?;
                    summary.files_written.push(target);
                }
            }
            pending.extend(subdirectories.into_iter().rev());
        }

        info!(
            "uploaded {} to {remote}: {} files, {} bytes",
            local.display(),
            summary.files_written.len(),
            summary.total_bytes
        );
        Ok(summary)
    }

    /// Mirror the remote tree under `remote` into a local directory
    ///
    /// Symlinks on the remote side are skipped.
    pub async fn download_directory(
        &self,
        remote: &str,
        local: impl AsRef<Path>,
        options: &TransferOptions,
    ) -> Result<TransferSummary> {
        let local = local.as_ref();
        require_path(remote, "remote directory")?;
        require_local(local)?;

        let mut summary = TransferSummary::default();
        let mut pending: Vec<(String, PathBuf)> = vec![(remote.to_string(), local.to_path_buf())];

        while let Some((remote_dir, local_dir)) = pending.pop() {
            check_cancelled(options.cancel.as_ref())?;
            fs::create_dir_all(&local_dir).await?;
            summary.directories_ensured += 1;

            let listing = self.list_status(&remote_dir).await?;

            for file in listing.files() {
                let name = safe_entry_name(&file.path_suffix, &remote_dir)?;
                let target = local_dir.join(name);
                check_cancelled(options.cancel.as_ref())?;
                summary.total_bytes += self
                    .download_file(&join_path(&remote_dir, name), &target, options)
                    .await?;
                summary.files_written.push(target.display().to_string());
            }

            let mut subdirectories = Vec::new();
            for dir in listing.directories() {
                let name = safe_entry_name(&dir.path_suffix, &remote_dir)?;
                subdirectories.push((join_path(&remote_dir, name), local_dir.join(name)));
            }
            pending.extend(subdirectories.into_iter().rev());
        }

        info!(
            "downloaded {remote} to {}: {} files, {} bytes",
            local.display(),
            summary.files_written.len(),
            summary.total_bytes
        );
        Ok(summary)
    }
}

fn require_local(local: &Path) -> Result<()> {
    if local.as_os_str().is_empty() {
        return Err(Error::invalid_argument("local directory must not be empty"));
    }
    Ok(())
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

/// A listed name must stay inside the directory it was listed from
fn safe_entry_name<'a>(name: &'a str, remote_dir: &str) -> Result<&'a str> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_argument(format!(
            "refusing entry {name:?} listed in {remote_dir}"
        )));
    }
    Ok(name)
}
