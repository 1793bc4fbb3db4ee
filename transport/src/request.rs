use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use reqwest::{header::HeaderMap, Method};
use url::Url;

use crate::{
    progress::ProgressListener,
    stream::{ReadChunks, WriteChunks},
};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// What a request was for; carried through to the resulting statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub sql: String,
    pub format: Option<String>,
}

impl RequestInfo {
    pub fn new(sql: impl Into<String>, format: Option<String>) -> Self {
        Self {
            sql: sql.into(),
            format,
        }
    }
}

/// One file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub enum RequestBody {
    Empty,
    Text(String),
    Multipart(Vec<FilePart>),
    Stream(Box<dyn ReadChunks>),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Text(sql) => f.debug_tuple("Text").field(sql).finish(),
            RequestBody::Multipart(parts) => f
                .debug_tuple("Multipart")
                .field(&parts.iter().map(|p| &p.name).collect::<Vec<_>>())
                .finish(),
            RequestBody::Stream(_) => write!(f, "Stream"),
        }
    }
}

/// A fully built HTTP exchange, ready for a [`RequestQueue`](crate::RequestQueue).
///
/// The request owns everything it touches: the upload source, the download sink and the
/// progress listener. Dropping it releases them.
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
    connect_timeout: Duration,
    ssl_ca: Option<PathBuf>,
    sink: Option<Box<dyn WriteChunks>>,
    progress: Option<Arc<dyn ProgressListener>>,
    info: RequestInfo,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.path())
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("sink", &self.sink.is_some())
            .field("info", &self.info)
            .finish()
    }
}

impl Request {
    pub fn new(method: Method, url: Url, info: RequestInfo) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ssl_ca: None,
            sink: None,
            progress: None,
            info,
        }
    }

    pub fn post(url: Url, info: RequestInfo) -> Self {
        Self::new(Method::POST, url, info)
    }

    pub fn get(url: Url, info: RequestInfo) -> Self {
        Self::new(Method::GET, url, info)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn set_body(&mut self, body: RequestBody) {
        self.body = body;
    }

    pub fn into_body(self) -> RequestBody {
        self.body
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn ssl_ca(&self) -> Option<&PathBuf> {
        self.ssl_ca.as_ref()
    }

    pub fn set_ssl_ca(&mut self, path: PathBuf) {
        self.ssl_ca = Some(path);
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn set_sink(&mut self, sink: Box<dyn WriteChunks>) {
        self.sink = Some(sink);
    }

    pub fn take_sink(&mut self) -> Option<Box<dyn WriteChunks>> {
        self.sink.take()
    }

    pub fn set_progress(&mut self, listener: Arc<dyn ProgressListener>) {
        self.progress = Some(listener);
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
            sink: self.sink,
            progress: self.progress,
            info: self.info,
        }
    }
}

/// A request taken apart for execution. Client selection happens before this split.
pub(crate) struct RequestParts {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
    pub sink: Option<Box<dyn WriteChunks>>,
    pub progress: Option<Arc<dyn ProgressListener>>,
    pub info: RequestInfo,
}
