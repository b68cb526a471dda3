pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod permission;
pub mod redirect;
pub mod transport;
pub mod trash;
pub mod tree;
pub mod types;
pub mod url;

pub use client::{CreateOptions, OpenOptions, TransferOptions, WebHdfsClient};
pub use config::{ClientConfig, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS};
pub use decode::{decode_body, Entity};
pub use error::{Error, ErrorKind, ProtocolError, RemoteException, Result};
pub use permission::{validate_permission, DEFAULT_PERMISSION};
pub use transport::{
    ByteStream, HttpRequest, HttpResponse, RedirectPolicy, ReqwestTransport, RequestBody,
    ResponseBody, Transport,
};
pub use trash::TRASH_CURRENT;
pub use types::{
    BooleanResult, ContentSummary, DirectoryListing, FileChecksum, FileStatus, FileType,
    TransferSummary,
};
pub use url::Op;

pub use tokio_util::sync::CancellationToken;
