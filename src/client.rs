use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use log::debug;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::decode::{decode_body, Entity};
use crate::error::{Error, Result};
use crate::executor::execute;
use crate::permission::{validate_permission, DEFAULT_PERMISSION};
use crate::redirect;
use crate::transport::{ByteStream, HttpRequest, RequestBody, ReqwestTransport, Transport};
use crate::types::{
    BooleanResult, ContentSummary, DirectoryListing, FileChecksum, FileStatus, HomeDirectory,
};
use crate::url::{absolute_path, Op, UrlBuilder};

/// Options for [`WebHdfsClient::create_file`]
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Replace an existing file instead of failing
    pub overwrite: bool,
    /// Octal permission for the new file
    pub permission: String,
    pub cancel: Option<CancellationToken>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            permission: DEFAULT_PERMISSION.to_string(),
            cancel: None,
        }
    }
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Options for [`WebHdfsClient::open`]
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Start position in bytes; sent only when non-zero
    pub offset: u64,
    /// Number of bytes to read; sent only when non-zero
    pub length: u64,
    pub cancel: Option<CancellationToken>,
}

/// Options for single-file and directory transfers
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Replace existing files at the destination
    pub overwrite: bool,
    /// Permission for files and directories created remotely
    pub permission: String,
    pub cancel: Option<CancellationToken>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            permission: DEFAULT_PERMISSION.to_string(),
            cancel: None,
        }
    }
}

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn create_options(&self) -> CreateOptions {
        CreateOptions {
            overwrite: self.overwrite,
            permission: self.permission.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// WebHDFS client
///
/// Every method issues its own independent request(s); the client can be
/// shared behind an `Arc` and used concurrently.
pub struct WebHdfsClient {
    transport: Arc<dyn Transport>,
    urls: UrlBuilder,
    home_directory: OnceCell<String>,
}

impl fmt::Debug for WebHdfsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebHdfsClient")
            .field("transport", &self.transport.identifier())
            .field("urls", &self.urls)
            .finish()
    }
}

impl WebHdfsClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let urls = UrlBuilder::new(&config.base_url, &config.prefix, config.user)?;
        Ok(Self {
            transport,
            urls,
            home_directory: OnceCell::new(),
        })
    }

    /// Username sent as `user.name`, if any
    pub fn user(&self) -> Option<&str> {
        self.urls.user()
    }

    /// Issue `op` on `path` and return the body of the successful response
    async fn request(&self, path: &str, op: Op, params: &[(&str, String)]) -> Result<Bytes> {
        let url = self.urls.operation_url(path, op, params)?;
        let response = execute(self.transport.as_ref(), HttpRequest::new(op.method(), url), None).await?;
        response.bytes().await
    }

    async fn call<T: Entity>(&self, path: &str, op: Op, params: &[(&str, String)]) -> Result<T> {
        let body = self.request(path, op, params).await?;
        Ok(decode_body(&body)?)
    }

    /// Like `call`, but a 404 is an ordinary `None`
    async fn call_optional<T: Entity>(
        &self,
        path: &str,
        op: Op,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        match self.call(path, op, params).await {
            Ok(entity) => Ok(Some(entity)),
            Err(e) if e.is_not_found() => {
                debug!("{} {path}: not found", op.as_str());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn call_boolean(
        &self,
        path: &str,
        op: Op,
        params: &[(&str, String)],
    ) -> Result<bool> {
        Ok(self.call::<BooleanResult>(path, op, params).await?.value)
    }

    /// For operations that may answer 200 with an empty body
    async fn call_acknowledged(&self, path: &str, op: Op, params: &[(&str, String)]) -> Result<bool> {
        let body = self.request(path, op, params).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(true);
        }
        Ok(decode_body::<BooleanResult>(&body)?.value)
    }

    // ---- read ----

    /// List the statuses of the entries of a directory
    ///
    /// Each entry's `full_path` is derived from `path`.
    pub async fn list_status(&self, path: &str) -> Result<DirectoryListing> {
        let listing: DirectoryListing = self.call(path, Op::ListStatus, &[]).await?;
        Ok(listing.at_path(&absolute_path(path)))
    }

    /// Status of a file or directory, `None` if it does not exist
    pub async fn get_status(&self, path: &str) -> Result<Option<FileStatus>> {
        self.call_optional(path, Op::GetFileStatus, &[]).await
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.get_status(path).await?.is_some())
    }

    pub async fn get_content_summary(&self, path: &str) -> Result<Option<ContentSummary>> {
        self.call_optional(path, Op::GetContentSummary, &[]).await
    }

    /// Checksum of a file
    ///
    /// `None` when the path does not exist or the backing filesystem does not
    /// implement checksums.
    pub async fn get_file_checksum(&self, path: &str) -> Result<Option<FileChecksum>> {
        let checksum: Option<Option<FileChecksum>> =
            self.call_optional(path, Op::GetFileChecksum, &[]).await?;
        Ok(checksum.flatten())
    }

    /// Home directory of the configured user, fetched once and then cached
    pub async fn home_directory(&self) -> Result<&str> {
        let home = self
            .home_directory
            .get_or_try_init(|| async {
                let home: HomeDirectory = self.call("", Op::GetHomeDirectory, &[]).await?;
                Ok::<_, Error>(home.path)
            })
            .await?;
        Ok(home.as_str())
    }

    /// Open a file for streaming reads
    pub async fn open(&self, path: &str, options: &OpenOptions) -> Result<ByteStream> {
        let mut params = Vec::new();
        if options.offset > 0 {
            params.push(("offset", options.offset.to_string()));
        }
        if options.length > 0 {
            params.push(("length", options.length.to_string()));
        }

        let url = self.urls.operation_url(path, Op::Open, &params)?;
        let request = HttpRequest::new(Op::Open.method(), url);
        let response = execute(self.transport.as_ref(), request, options.cancel.as_ref()).await?;
        Ok(response.into_stream())
    }

    /// Read a whole file into memory
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let mut stream = self.open(path, &OpenOptions::default()).await?;
        let mut content = Vec::new();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(content))
    }

    /// Download a remote file to `local`, returning the number of bytes written
    ///
    /// Fails with an `AlreadyExists` IO error if `local` exists and
    /// `options.overwrite` is false.
    pub async fn download_file(
        &self,
        remote: &str,
        local: impl AsRef<Path>,
        options: &TransferOptions,
    ) -> Result<u64> {
        let local = local.as_ref();
        require_path(remote, "remote path")?;
        if local.as_os_str().is_empty() {
            return Err(Error::invalid_argument("local path must not be empty"));
        }
        if !options.overwrite && fs::try_exists(local).await? {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("destination file {} already exists", local.display()),
            )));
        }

        let open = OpenOptions {
            cancel: options.cancel.clone(),
            ..OpenOptions::default()
        };
        let mut stream = self.open(remote, &open).await?;

        let mut file = fs::File::create(local).await?;
        let mut written = 0u64;
        while let Some(chunk) = next_chunk(&mut stream, options.cancel.as_ref()).await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("downloaded {remote} to {} ({written} bytes)", local.display());
        Ok(written)
    }

    // ---- namespace ----

    /// Create a directory and any missing parents (`mkdir -p`)
    ///
    /// An existing directory is not an error. `permission` defaults to `755`.
    pub async fn create_directory(&self, path: &str, permission: Option<&str>) -> Result<bool> {
        let permission = permission.unwrap_or(DEFAULT_PERMISSION);
        validate_permission(permission)?;
        self.call_boolean(path, Op::Mkdirs, &[("permission", permission.to_string())])
            .await
    }

    /// Rename `path` to `destination`
    ///
    /// The server answers `false` rather than an error when the source is
    /// missing or the destination already exists.
    pub async fn rename(&self, path: &str, destination: &str) -> Result<bool> {
        require_path(path, "source path")?;
        require_path(destination, "destination path")?;
        self.call_boolean(path, Op::Rename, &[("destination", absolute_path(destination))])
            .await
    }

    // ---- attributes ----

    pub async fn set_permission(&self, path: &str, permission: &str) -> Result<bool> {
        validate_permission(permission)?;
        self.call_acknowledged(path, Op::SetPermission, &[("permission", permission.to_string())])
            .await
    }

    /// Change the owner; the group is left unchanged
    pub async fn set_owner(&self, path: &str, owner: &str) -> Result<bool> {
        if owner.is_empty() {
            return Err(Error::invalid_argument("owner must not be empty"));
        }
        self.call_acknowledged(path, Op::SetOwner, &[("owner", owner.to_string())])
            .await
    }

    /// Change the group; the owner is left unchanged
    pub async fn set_group(&self, path: &str, group: &str) -> Result<bool> {
        if group.is_empty() {
            return Err(Error::invalid_argument("group must not be empty"));
        }
        self.call_acknowledged(path, Op::SetOwner, &[("group", group.to_string())])
            .await
    }

    pub async fn set_replication(&self, path: &str, replication: u16) -> Result<bool> {
        self.call_boolean(path, Op::SetReplication, &[("replication", replication.to_string())])
            .await
    }

    /// Set the access time in milliseconds since the epoch
    pub async fn set_access_time(&self, path: &str, access_time: i64) -> Result<bool> {
        self.set_times(path, Some(access_time), None).await
    }

    /// Set the modification time in milliseconds since the epoch
    pub async fn set_modification_time(&self, path: &str, modification_time: i64) -> Result<bool> {
        self.set_times(path, None, Some(modification_time)).await
    }

    /// Set either or both timestamps; a `None` leaves that time unchanged
    pub async fn set_times(
        &self,
        path: &str,
        access_time: Option<i64>,
        modification_time: Option<i64>,
    ) -> Result<bool> {
        let mut params = Vec::new();
        if let Some(time) = modification_time {
            params.push(("modificationtime", time.to_string()));
        }
        if let Some(time) = access_time {
            params.push(("accesstime", time.to_string()));
        }
        if params.is_empty() {
            return Err(Error::invalid_argument(
                "set_times needs an access or modification time",
            ));
        }
        self.call_acknowledged(path, Op::SetTimes, &params).await
    }

    // ---- write ----

    /// Create a file from `body` using the two-phase redirect protocol
    pub async fn create_file(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        options: &CreateOptions,
    ) -> Result<()> {
        require_path(path, "path")?;
        validate_permission(&options.permission)?;

        let params = [
            ("overwrite", options.overwrite.to_string()),
            ("permission", options.permission.clone()),
        ];
        let url = self.urls.operation_url(path, Op::Create, &params)?;
        redirect::write(
            self.transport.as_ref(),
            Op::Create,
            url,
            body.into(),
            options.cancel.as_ref(),
        )
        .await
    }

    /// Upload a local file, streaming its content; returns the bytes sent
    pub async fn upload_file(
        &self,
        local: impl AsRef<Path>,
        remote: &str,
        options: &TransferOptions,
    ) -> Result<u64> {
        let local = local.as_ref();
        require_path(remote, "remote path")?;
        validate_permission(&options.permission)?;

        let file = fs::File::open(local).await?;
        let size = file.metadata().await?.len();
        self.create_file(remote, RequestBody::from_file(file), &options.create_options())
            .await?;

        debug!("uploaded {} to {remote} ({size} bytes)", local.display());
        Ok(size)
    }

    /// Append `body` to an existing file using the two-phase redirect protocol
    pub async fn append_file(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        require_path(path, "path")?;
        let url = self.urls.operation_url(path, Op::Append, &[])?;
        redirect::write(self.transport.as_ref(), Op::Append, url, body.into(), cancel).await
    }

    /// Append the content of a local file; returns the bytes sent
    pub async fn append_local_file(
        &self,
        local: impl AsRef<Path>,
        remote: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<u64> {
        let file = fs::File::open(local.as_ref()).await?;
        let size = file.metadata().await?.len();
        self.append_file(remote, RequestBody::from_file(file), cancel)
            .await?;
        Ok(size)
    }
}

pub(crate) fn require_path(path: &str, what: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(Error::invalid_argument(format!("{what} must not be empty")));
    }
    Ok(())
}

async fn next_chunk(
    stream: &mut ByteStream,
    cancel: Option<&CancellationToken>,
) -> Result<Option<Bytes>> {
    let next = match cancel {
        Some(token) => tokio::select! {
            biased;

            _ = token.cancelled() => return Err(Error::Cancelled),
            next = stream.next() => next,
        },
        None => stream.next().await,
    };
    next.transpose()
}
