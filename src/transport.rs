use std::fmt;
use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client, Method, StatusCode, Url};
use tokio_util::io::ReaderStream;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Streamed request payload
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

/// Streamed response payload
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Payload attached to a request
pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    Stream(BodyStream),
}

impl RequestBody {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    {
        RequestBody::Stream(Box::pin(stream))
    }

    /// Stream an open file without buffering it in memory
    pub fn from_file(file: tokio::fs::File) -> Self {
        Self::from_stream(ReaderStream::new(file))
    }

    /// Collect the whole payload
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Bytes(bytes) => Ok(bytes),
            RequestBody::Stream(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await?;
                Ok(Bytes::from(chunks.concat()))
            }
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(bytes: &'static [u8]) -> Self {
        RequestBody::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Whether the transport may follow 3xx responses on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    Follow,
    /// Return 3xx responses to the caller untouched
    Manual,
}

/// One HTTP request
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
    pub redirect: RedirectPolicy,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: RequestBody::Empty,
            redirect: RedirectPolicy::Follow,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn without_redirects(mut self) -> Self {
        self.redirect = RedirectPolicy::Manual;
        self
    }
}

/// Response body, read lazily
pub struct ResponseBody(ByteStream);

impl ResponseBody {
    pub fn empty() -> Self {
        ResponseBody(stream::empty().boxed())
    }

    pub fn from_stream(stream: ByteStream) -> Self {
        ResponseBody(stream)
    }

    pub async fn bytes(self) -> Result<Bytes> {
        let chunks: Vec<Bytes> = self.0.try_collect().await?;
        Ok(Bytes::from(chunks.concat()))
    }

    pub fn into_stream(self) -> ByteStream {
        self.0
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody(stream::once(async move { Ok::<_, Error>(bytes) }).boxed())
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

/// One HTTP response; the body has not been read yet
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<ResponseBody>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub async fn bytes(self) -> Result<Bytes> {
        self.body.bytes().await
    }

    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn into_stream(self) -> ByteStream {
        self.body.into_stream()
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Sends HTTP requests on behalf of the client
///
/// The production implementation is [`ReqwestTransport`]; tests substitute an
/// in-memory cluster.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the response without reading its body
    ///
    /// Only failures to complete the exchange are errors; non-2xx statuses are
    /// returned as ordinary responses.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Get a human-readable identifier for this transport (for logging/debugging)
    fn identifier(&self) -> String;
}

/// reqwest-backed transport
///
/// Holds two independent clients: one that follows redirects for ordinary calls
/// and one with redirects disabled for the first phase of CREATE/APPEND.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    manual_redirect: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        let manual_redirect = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            manual_redirect,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let client = match request.redirect {
            RedirectPolicy::Follow => &self.client,
            RedirectPolicy::Manual => &self.manual_redirect,
        };

        let sends_payload = request.method != Method::GET && request.method != Method::HEAD;
        let mut builder = client.request(request.method, request.url);
        builder = match request.body {
            // NameNodes reject bodiless PUT/POST without a Content-Length
            RequestBody::Empty if sends_payload => builder.body(Bytes::new()),
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(Error::from).boxed();

        Ok(HttpResponse {
            status,
            headers,
            body: ResponseBody::from_stream(body),
        })
    }

    fn identifier(&self) -> String {
        "reqwest".to_string()
    }
}
