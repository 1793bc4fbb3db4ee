use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use housecall_compiler::{ClickHouse, Value};
use housecall_parser::StatementText;
use reqwest::{
    header::{HeaderValue, ACCEPT_ENCODING, CONNECTION},
    Method,
};
use tracing::debug;
use url::Url;

use crate::{
    auth::{AuthMethod, Credentials},
    bind::bind,
    errors::Result,
    payload::{WhereInFile, WriteToFile},
    progress::ProgressListener,
    queue::{Pending, ReqwestQueue, RequestQueue},
    request::{Request, RequestBody, RequestInfo, DEFAULT_CONNECT_TIMEOUT},
    settings::{Settings, UrlParams},
    statement::Statement,
    stream::{StreamAdapter, StreamRead, StreamWrite},
};

const DEFAULT_SELECT_FORMAT: &str = "JSON";
const PING_BODY: &[u8] = b"Ok.\n";

const READONLY_KEY: &str = "readonly";
const READ_LEVEL: u8 = 2;
const WRITE_LEVEL: u8 = 0;

/// Builds HTTP requests for one server and hands them to a [`RequestQueue`].
///
/// Settings belong to the transport; every request gets its own parameter and header snapshot,
/// so nothing done for one request leaks into the next.
pub struct HttpTransport {
    host: String,
    port: u16,
    credentials: Credentials,
    auth_method: AuthMethod,
    settings: Settings,
    connect_timeout: Duration,
    ssl_ca: Option<PathBuf>,
    progress: Option<Arc<dyn ProgressListener>>,
    queue: Arc<dyn RequestQueue>,
    dialect: ClickHouse,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .field("auth_method", &self.auth_method)
            .field("settings", &self.settings)
            .field("connect_timeout", &self.connect_timeout)
            .field("ssl_ca", &self.ssl_ca)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(host: impl Into<String>, port: u16, credentials: Credentials) -> Self {
        Self::with_queue(host, port, credentials, Arc::new(ReqwestQueue::new()))
    }

    pub fn with_queue(
        host: impl Into<String>,
        port: u16,
        credentials: Credentials,
        queue: Arc<dyn RequestQueue>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            auth_method: AuthMethod::default(),
            settings: Settings::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ssl_ca: None,
            progress: None,
            queue,
            dialect: ClickHouse(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_auth_method(&mut self, method: AuthMethod) {
        self.auth_method = method;
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Trust the PEM certificate(s) at `path` for HTTPS connections.
    pub fn set_ssl_ca(&mut self, path: impl Into<PathBuf>) {
        self.ssl_ca = Some(path.into());
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Called with the server's progress summary after every successful request.
    pub fn set_progress_function(&mut self, listener: impl ProgressListener + 'static) {
        self.progress = Some(Arc::new(listener));
    }

    pub fn uri(&self) -> String {
        let scheme = if self.settings.is_https() {
            "https"
        } else {
            "http"
        };
        if self.host.contains('/') || self.host.contains(':') {
            return format!("{scheme}://{}", self.host);
        }
        if self.port > 0 {
            format!("{scheme}://{}:{}", self.host, self.port)
        } else {
            format!("{scheme}://{}", self.host)
        }
    }

    /// The full URL for a request carrying `overrides` on top of the settings.
    pub fn url(&self, overrides: &UrlParams) -> Result<Url> {
        let mut url = Url::parse(&self.uri())?;
        self.settings.derive_parameters(overrides).apply_to(&mut url);
        Ok(url)
    }

    fn new_request(
        &self,
        method: Method,
        mut params: UrlParams,
        info: RequestInfo,
    ) -> Result<Request> {
        let mut url = Url::parse(&self.uri())?;
        let mut request_headers = reqwest::header::HeaderMap::new();
        self.credentials
            .apply(self.auth_method, &mut request_headers, &mut params)?;
        params.apply_to(&mut url);

        let mut request = Request::new(method, url, info);
        let headers = request.headers_mut();
        headers.extend(request_headers);
        if self.settings.is_enable_http_compression() {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }
        if self.settings.get_session_id().is_some() {
            headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }
        request.set_timeout(self.settings.get_timeout());
        request.set_connect_timeout(self.connect_timeout);
        if let Some(path) = &self.ssl_ca {
            request.set_ssl_ca(path.clone());
        }
        if let Some(listener) = &self.progress {
            request.set_progress(listener.clone());
        }
        Ok(request)
    }

    /// A `readonly=2` request. External tables move the statement into the query string so the
    /// body can carry the files.
    pub fn read_request(
        &self,
        statement: &StatementText,
        where_in: Option<&WhereInFile>,
        write_to: Option<&WriteToFile>,
    ) -> Result<Request> {
        let mut statement = statement.clone();
        if let Some(sink) = write_to {
            statement.set_format(sink.format());
        }
        let sql = statement.to_sql();
        let info = RequestInfo::new(sql.clone(), statement.format());

        let mut overrides = UrlParams::new().with(READONLY_KEY, READ_LEVEL);
        let where_in = where_in.filter(|files| !files.is_empty());
        if let Some(files) = where_in {
            overrides.merge(&files.url_params()).set("query", &sql);
        }
        let mut params = self.settings.derive_parameters(&overrides);
        if write_to.is_some() {
            params.remove("extremes");
        }

        let mut request = self.new_request(Method::POST, params, info)?;
        match where_in {
            Some(files) => request.set_body(RequestBody::Multipart(files.parts()?)),
            None => request.set_body(RequestBody::Text(sql)),
        }
        if let Some(sink) = write_to {
            request.set_sink(Box::new(sink.open()?));
        }
        debug!(
            external_tables = where_in.map(WhereInFile::size).unwrap_or_default(),
            to_file = write_to.is_some(),
            "built read request"
        );
        Ok(request)
    }

    /// A `readonly=0` request with the statement as the body.
    pub fn write_request(&self, statement: &StatementText) -> Result<Request> {
        let sql = statement.to_sql();
        let info = RequestInfo::new(sql.clone(), statement.format());
        let params = self
            .settings
            .derive_parameters(&UrlParams::new().with(READONLY_KEY, WRITE_LEVEL));
        let mut request = self.new_request(Method::POST, params, info)?;
        request.set_body(RequestBody::Text(sql));
        Ok(request)
    }

    /// A `readonly=0` request with the statement in the query string, leaving the body for data.
    pub fn write_stream_request(&self, statement: &StatementText) -> Result<Request> {
        let sql = statement.to_sql();
        let info = RequestInfo::new(sql.clone(), statement.format());
        let overrides = UrlParams::new()
            .with(READONLY_KEY, WRITE_LEVEL)
            .with("query", &sql);
        let params = self.settings.derive_parameters(&overrides);
        self.new_request(Method::POST, params, info)
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> Result<StatementText> {
        Ok(StatementText::new(bind(sql, bindings, &self.dialect)?)?)
    }

    fn select_request(
        &self,
        sql: &str,
        bindings: &[Value],
        where_in: Option<&WhereInFile>,
        write_to: Option<&WriteToFile>,
    ) -> Result<Request> {
        let mut statement = self.statement(sql, bindings)?;
        statement.set_format(DEFAULT_SELECT_FORMAT);
        self.read_request(&statement, where_in, write_to)
    }

    /// Run a read and wait for it. Server errors are left on the returned statement.
    pub async fn select(
        &self,
        sql: &str,
        bindings: &[Value],
        where_in: Option<&WhereInFile>,
        write_to: Option<&WriteToFile>,
    ) -> Result<Statement> {
        let request = self.select_request(sql, bindings, where_in, write_to)?;
        self.queue.exec_one(request, false).await
    }

    /// Queue a read and return at once.
    pub fn select_async(
        &self,
        sql: &str,
        bindings: &[Value],
        where_in: Option<&WhereInFile>,
        write_to: Option<&WriteToFile>,
    ) -> Result<Pending> {
        let request = self.select_request(sql, bindings, where_in, write_to)?;
        Ok(self.queue.add_que_loop(request))
    }

    /// Run a write. A failed statement becomes an error when `surface_error` is set.
    pub async fn write(
        &self,
        sql: &str,
        bindings: &[Value],
        surface_error: bool,
    ) -> Result<Statement> {
        let request = self.write_request(&self.statement(sql, bindings)?)?;
        let statement = self.queue.exec_one(request, false).await?;
        if surface_error {
            statement.error()?;
        }
        Ok(statement)
    }

    /// Run a read whose response body goes to `adapter` as it arrives.
    pub async fn stream_read(
        &self,
        adapter: StreamRead,
        sql: &str,
        bindings: &[Value],
    ) -> Result<Statement> {
        let statement = self.statement(sql, bindings)?;
        let request = self.read_request(&statement, None, None)?;
        self.streaming(adapter, request).await
    }

    /// Run a write whose data is uploaded from `adapter`, e.g. `insert into t format CSV`.
    pub async fn stream_write(
        &self,
        adapter: StreamWrite,
        sql: &str,
        bindings: &[Value],
    ) -> Result<Statement> {
        let statement = self.statement(sql, bindings)?;
        let request = self.write_stream_request(&statement)?;
        self.streaming(adapter, request).await
    }

    async fn streaming(
        &self,
        adapter: impl StreamAdapter,
        mut request: Request,
    ) -> Result<Statement> {
        debug!(write = adapter.is_write(), "streaming request");
        adapter.wire(&mut request);
        let statement = self.queue.exec_one(request, true).await?;
        statement.error()?;
        Ok(statement)
    }

    /// True when the server answers the base URI with `Ok.`.
    pub async fn ping(&self) -> Result<bool> {
        let mut request = Request::get(Url::parse(&self.uri())?, RequestInfo::new("", None));
        request.set_connect_timeout(self.connect_timeout);
        if let Some(path) = &self.ssl_ca {
            request.set_ssl_ca(path.clone());
        }
        let statement = self.queue.exec_one(request, false).await?;
        Ok(statement.body() == PING_BODY)
    }

    pub fn count_pending(&self) -> usize {
        self.queue.count_pending()
    }

    /// Wait for every queued request to finish.
    pub async fn drain(&self) {
        self.queue.drain().await
    }
}
