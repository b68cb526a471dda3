use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Classification of a failed WebHDFS call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 404
    NotFound,
    /// HTTP 409
    Conflict,
    /// Any other 4xx
    BadRequest,
    /// 5xx, or a status the protocol never produces for the call
    ServerError,
    /// The call succeeded but its body could not be decoded
    ParseError,
    /// The request could not be completed at all
    Transport,
}

impl ErrorKind {
    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            status if status.is_client_error() => ErrorKind::BadRequest,
            _ => ErrorKind::ServerError,
        }
    }
}

/// Error body returned by the NameNode or a DataNode
///
/// ```json
/// {"RemoteException": {"exception": "...", "javaClassName": "...", "message": "..."}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteException {
    #[serde(default)]
    pub exception: String,
    #[serde(default)]
    pub java_class_name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteExceptionWrapper {
    remote_exception: RemoteException,
}

impl RemoteException {
    /// Parse a response body, returning `None` when it is not a RemoteException envelope
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<RemoteExceptionWrapper>(body)
            .ok()
            .map(|wrapper| wrapper.remote_exception)
    }

    fn summary(&self) -> String {
        match (self.exception.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.exception, self.message),
            (false, true) => self.exception.clone(),
            _ => self.message.clone(),
        }
    }
}

/// A failed protocol exchange
///
/// Carries the HTTP status and whatever diagnostic text the server returned. The
/// `Display` output is the full human-readable diagnostic.
#[derive(Error, Debug)]
#[error("{}", self.diagnostic())]
pub struct ProtocolError {
    kind: ErrorKind,
    status: Option<StatusCode>,
    message: Option<String>,
    server_message: Option<String>,
    raw_body: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProtocolError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            status: None,
            message: None,
            server_message: None,
            raw_body: None,
            source: None,
        }
    }

    /// An error for a non-success HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        let mut err = Self::new(ErrorKind::from_status(status));
        err.status = Some(status);
        err
    }

    /// A body that arrived with a success status but could not be decoded
    pub fn parse<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(ErrorKind::ParseError)
            .with_message(message)
            .with_source(source)
    }

    pub fn transport(source: reqwest::Error) -> Self {
        let mut err = Self::new(ErrorKind::Transport).with_message("Transport error");
        err.status = source.status();
        err.with_source(source)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the raw response body, extracting the RemoteException text if present
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if body.trim().is_empty() {
            return self;
        }
        self.server_message = RemoteException::parse(&body).map(|remote| remote.summary());
        self.raw_body = Some(body);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }

    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// Concatenate context, status line and server text into a single string
    pub fn diagnostic(&self) -> String {
        let mut parts = Vec::new();
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if let Some(status) = self.status {
            parts.push(status.to_string());
        }
        match (&self.server_message, &self.raw_body) {
            (Some(server), _) => parts.push(server.clone()),
            (None, Some(body)) => parts.push(body.trim().to_string()),
            _ => {}
        }
        if self.kind == ErrorKind::Transport || self.kind == ErrorKind::ParseError {
            if let Some(source) = &self.source {
                parts.push(source.to_string());
            }
        }
        if parts.is_empty() {
            return format!("{:?}", self.kind);
        }
        parts.join(": ")
    }
}

/// Errors returned by the client
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid permission {value:?}: expected an octal value between 000 and 1777")]
    InvalidPermission { value: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Protocol(ProtocolError::transport(err))
    }
}

impl Error {
    /// Protocol classification, if this error came from the wire
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Protocol(err) => Some(err.kind()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Protocol(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Result type alias for WebHDFS operations
pub type Result<T> = std::result::Result<T, Error>;
