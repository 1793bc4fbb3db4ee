use std::{
    collections::HashMap,
    io::{self, Read, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use flate2::{read::GzDecoder, write::GzDecoder as GzWriteDecoder};
use futures::TryStreamExt;
use parking_lot::Mutex;
use reqwest::{
    header::{HeaderMap, CONTENT_ENCODING},
    multipart::{Form, Part},
    Certificate, Client,
};
use tokio::sync::{oneshot, Notify};
use tracing::{debug, trace, warn};

use crate::{
    errors::{Error, Result},
    progress,
    request::{FilePart, Request, RequestBody, RequestInfo, RequestParts},
    statement::{Response, Statement},
    stream::{upload_body, WriteChunks},
};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Executes requests. This is the seam between building requests and putting them on the wire.
#[async_trait]
pub trait RequestQueue: Send + Sync {
    /// Execute one request and wait for it. With `streaming` set the response body is passed on
    /// exactly as received.
    async fn exec_one(&self, request: Request, streaming: bool) -> Result<Statement>;

    /// Start a request in the background.
    fn add_que_loop(&self, request: Request) -> Pending;

    /// Requests started with [`RequestQueue::add_que_loop`] that have not finished yet.
    fn count_pending(&self) -> usize;

    /// Wait until nothing is pending.
    async fn drain(&self);
}

/// A request running in the background.
#[derive(Debug)]
pub struct Pending {
    info: RequestInfo,
    receiver: oneshot::Receiver<Result<Statement>>,
}

impl Pending {
    pub fn new(info: RequestInfo, receiver: oneshot::Receiver<Result<Statement>>) -> Self {
        Self { info, receiver }
    }

    /// A handle for a request that finished before it was handed out.
    pub fn ready(info: RequestInfo, result: Result<Statement>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Self { info, receiver }
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub async fn wait(self) -> Result<Statement> {
        self.receiver.await.map_err(|_| Error::QueueClosed)?
    }
}

#[derive(Debug, Default)]
struct PendingCounter {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingCounter {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

type ClientKey = (Option<PathBuf>, Duration);

/// [`RequestQueue`] backed by `reqwest` and the ambient tokio runtime.
///
/// Clients are cached per trust root and connect timeout so connections are pooled across
/// requests.
#[derive(Debug, Clone, Default)]
pub struct ReqwestQueue {
    clients: Arc<Mutex<HashMap<ClientKey, Client>>>,
    pending: Arc<PendingCounter>,
}

impl ReqwestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, request: &Request) -> Result<Client> {
        let key = (request.ssl_ca().cloned(), request.connect_timeout());
        if let Some(client) = self.clients.lock().get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(key.1);
        if let Some(path) = &key.0 {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        let client = builder.build()?;
        self.clients.lock().insert(key, client.clone());
        Ok(client)
    }

    async fn execute(&self, request: Request, streaming: bool) -> Result<Statement> {
        let client = self.client_for(&request)?;
        let RequestParts {
            method,
            url,
            headers,
            body,
            timeout,
            sink,
            progress,
            info,
        } = request.into_parts();

        debug!(%method, path = url.path(), format = ?info.format, "executing request");
        trace!(sql = %info.sql, "request statement");

        let mut builder = client.request(method, url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Text(sql) => builder.body(sql),
            RequestBody::Multipart(parts) => builder.multipart(form(parts)),
            RequestBody::Stream(source) => builder.body(upload_body(source)),
        };

        let started = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() {
            if let Some(listener) = &progress {
                progress::report(&headers, listener.as_ref());
            }
        }

        let body = match sink {
            Some(sink) if status.is_success() => {
                let mut sink = if !streaming && is_gzip(&headers) {
                    GunzipChunks::new(sink)
                } else {
                    sink
                };
                let mut chunks = response.bytes_stream();
                while let Some(chunk) = chunks.try_next().await? {
                    sink.write_chunk(&chunk)?;
                }
                sink.finish()?;
                Bytes::new()
            }
            _ => {
                let bytes = response.bytes().await?;
                if !streaming && is_gzip(&headers) {
                    gunzip(&bytes)?
                } else {
                    bytes
                }
            }
        };

        let elapsed = started.elapsed();
        debug!(%status, ?elapsed, bytes = body.len(), "request finished");
        Ok(Statement::new(
            info,
            Response::new(status, headers, body).with_elapsed(elapsed),
        ))
    }
}

#[async_trait]
impl RequestQueue for ReqwestQueue {
    async fn exec_one(&self, request: Request, streaming: bool) -> Result<Statement> {
        self.execute(request, streaming).await
    }

    fn add_que_loop(&self, request: Request) -> Pending {
        let info = request.info().clone();
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(%e, "no runtime to queue the request on");
                let (_, receiver) = oneshot::channel();
                return Pending::new(info, receiver);
            }
        };

        let (sender, receiver) = oneshot::channel();
        let queue = self.clone();
        queue.pending.start();
        debug!(pending = queue.pending.get(), "request queued");
        handle.spawn(async move {
            let result = queue.execute(request, false).await;
            queue.pending.finish();
            let _ = sender.send(result);
        });
        Pending::new(info, receiver)
    }

    fn count_pending(&self) -> usize {
        self.pending.get()
    }

    async fn drain(&self) {
        self.pending.wait_idle().await;
        debug!("request queue drained");
    }
}

fn form(parts: Vec<FilePart>) -> Form {
    parts.into_iter().fold(Form::new(), |form, part| {
        form.part(part.name, Part::bytes(part.bytes).file_name(part.file_name))
    })
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}

fn gunzip(bytes: &[u8]) -> Result<Bytes> {
    let mut decoded = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut decoded)?;
    Ok(Bytes::from(decoded))
}

struct ChunkWriter(Box<dyn WriteChunks>);

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_chunk(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Decodes a gzip encoded download on its way into a sink.
struct GunzipChunks(GzWriteDecoder<ChunkWriter>);

impl GunzipChunks {
    fn new(sink: Box<dyn WriteChunks>) -> Box<dyn WriteChunks> {
        Box::new(GunzipChunks(GzWriteDecoder::new(ChunkWriter(sink))))
    }
}

impl WriteChunks for GunzipChunks {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.0.write_all(chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.0.try_finish()?;
        self.0.get_mut().0.finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use url::Url;

    use super::*;
    use crate::progress::ProgressSummary;

    /// A one-shot HTTP responder. Returns the base URL and a handle yielding the raw request head.
    pub(crate) async fn respond_once(
        status: &'static str,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
    ) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            let mut response = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
            for (name, value) in headers {
                response.push_str(&format!("{name}: {value}\r\n"));
            }
            response.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
            head
        });
        (Url::parse(&format!("http://{addr}/")).unwrap(), handle)
    }

    /// Read the request head and as much body as it announces.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            let Some(end) = text.find("\r\n\r\n") else {
                continue;
            };
            let head = text[..end].to_ascii_lowercase();
            let body = &raw[end + 4..];
            let complete = if let Some(len) = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
            {
                body.len() >= len
            } else if head.contains("transfer-encoding: chunked") {
                body.ends_with(b"0\r\n\r\n")
            } else {
                true
            };
            if complete {
                break;
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    fn get(url: Url) -> Request {
        Request::get(url, RequestInfo::new("", None))
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        written: Arc<Mutex<Vec<u8>>>,
        finished: Arc<Mutex<bool>>,
    }

    impl WriteChunks for RecordingSink {
        fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
            self.written.lock().extend_from_slice(chunk);
            Ok(())
        }

        fn finish(&mut self) -> io::Result<()> {
            *self.finished.lock() = true;
            Ok(())
        }
    }

    fn get_into(url: Url, sink: &RecordingSink) -> Request {
        let mut request = get(url);
        request.set_sink(Box::new(sink.clone()));
        request
    }

    #[tokio::test]
    async fn test_exec_one_buffers_body() {
        let (url, server) = respond_once("200 OK", vec![], b"Ok.\n".to_vec()).await;
        let statement = ReqwestQueue::new().exec_one(get(url), false).await.unwrap();
        assert_eq!(statement.body(), b"Ok.\n");
        assert!(server.await.unwrap().starts_with("GET / HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_gzip_body_is_decoded_unless_streaming() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"1\n2\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let headers = vec![("Content-Encoding", "gzip".to_string())];
        let (url, _) = respond_once("200 OK", headers.clone(), compressed.clone()).await;
        let statement = ReqwestQueue::new().exec_one(get(url), false).await.unwrap();
        assert_eq!(statement.body(), b"1\n2\n");

        let (url, _) = respond_once("200 OK", headers, compressed.clone()).await;
        let statement = ReqwestQueue::new().exec_one(get(url), true).await.unwrap();
        assert_eq!(statement.body(), &compressed[..]);
    }

    #[tokio::test]
    async fn test_successful_body_goes_to_sink() {
        let sink = RecordingSink::default();
        let (url, _) = respond_once("200 OK", vec![], b"1,2\n3,4\n".to_vec()).await;
        let statement = ReqwestQueue::new()
            .exec_one(get_into(url, &sink), false)
            .await
            .unwrap();
        assert!(!statement.is_error());
        assert!(statement.body().is_empty());
        assert_eq!(&sink.written.lock()[..], b"1,2\n3,4\n");
        assert!(*sink.finished.lock());
    }

    #[tokio::test]
    async fn test_failed_body_skips_sink() {
        let sink = RecordingSink::default();
        let (url, _) = respond_once("500 Internal Server Error", vec![], b"boom".to_vec()).await;
        let statement = ReqwestQueue::new()
            .exec_one(get_into(url, &sink), false)
            .await
            .unwrap();
        assert!(statement.is_error());
        assert_eq!(statement.body(), b"boom");
        assert!(sink.written.lock().is_empty());
        assert!(!*sink.finished.lock());
    }

    #[tokio::test]
    async fn test_gzip_body_is_decoded_into_sink_unless_streaming() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"1\n2\n").unwrap();
        let compressed = encoder.finish().unwrap();
        let headers = vec![("Content-Encoding", "gzip".to_string())];

        let sink = RecordingSink::default();
        let (url, _) = respond_once("200 OK", headers.clone(), compressed.clone()).await;
        ReqwestQueue::new()
            .exec_one(get_into(url, &sink), false)
            .await
            .unwrap();
        assert_eq!(&sink.written.lock()[..], b"1\n2\n");
        assert!(*sink.finished.lock());

        let sink = RecordingSink::default();
        let (url, _) = respond_once("200 OK", headers, compressed.clone()).await;
        ReqwestQueue::new()
            .exec_one(get_into(url, &sink), true)
            .await
            .unwrap();
        assert_eq!(&sink.written.lock()[..], &compressed[..]);
    }

    #[tokio::test]
    async fn test_progress_listener_sees_summary() {
        let headers = vec![(
            "X-ClickHouse-Summary",
            r#"{"read_rows":"5","read_bytes":"40"}"#.to_string(),
        )];
        let (url, _) = respond_once("200 OK", headers, vec![]).await;
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let mut request = get(url);
        request.set_progress(Arc::new(move |summary: &ProgressSummary| {
            *captured.lock() = summary.get_u64("read_rows");
        }));
        ReqwestQueue::new().exec_one(request, false).await.unwrap();
        assert_eq!(*seen.lock(), Some(5));
    }

    #[tokio::test]
    async fn test_progress_skipped_on_failure() {
        let headers = vec![("X-ClickHouse-Summary", r#"{"read_rows":"5"}"#.to_string())];
        let (url, _) = respond_once("500 Internal Server Error", headers, b"boom".to_vec()).await;
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();
        let mut request = get(url);
        request.set_progress(Arc::new(move |_: &ProgressSummary| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let statement = ReqwestQueue::new().exec_one(request, false).await.unwrap();
        assert!(statement.is_error());
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_queued_requests_are_counted_and_drained() {
        let queue = ReqwestQueue::new();
        let (first, _) = respond_once("200 OK", vec![], b"a".to_vec()).await;
        let (second, _) = respond_once("200 OK", vec![], b"b".to_vec()).await;
        let a = queue.add_que_loop(get(first));
        let b = queue.add_que_loop(get(second));
        assert!(queue.count_pending() <= 2);
        queue.drain().await;
        assert_eq!(queue.count_pending(), 0);
        assert_eq!(a.wait().await.unwrap().body(), b"a");
        assert_eq!(b.wait().await.unwrap().body(), b"b");
    }

    #[test]
    fn test_queue_without_runtime_reports_closed() {
        let queue = ReqwestQueue::new();
        let pending = queue.add_que_loop(get(Url::parse("http://localhost/").unwrap()));
        assert_eq!(queue.count_pending(), 0);
        let result = futures::executor::block_on(pending.wait());
        assert!(matches!(result, Err(Error::QueueClosed)));
    }
}
