//! The streaming engine: chunk strategies for uploads and downloads, and the adapters that wire
//! them onto a request.

use std::io::{self, Read, Write};

use bytes::Bytes;
use flate2::{read::GzEncoder, Compression};
use reqwest::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, TRANSFER_ENCODING};

use crate::request::{Request, RequestBody};

pub const CHUNK_SIZE: usize = 64 * 1024;

/// Produces upload chunks. An empty chunk ends the upload.
pub trait ReadChunks: Send + 'static {
    fn read_chunk(&mut self, max: usize) -> io::Result<Vec<u8>>;
}

/// Consumes download chunks as they arrive.
pub trait WriteChunks: Send + 'static {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Called once after the last chunk.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type ReadCallback = Box<dyn FnMut(&mut dyn Read, usize) -> io::Result<Vec<u8>> + Send>;
type WriteCallback = Box<dyn FnMut(&mut dyn Write, &[u8]) -> io::Result<()> + Send>;

/// Default upload strategy: fill fixed-size chunks from the reader.
struct ReaderChunks {
    reader: Box<dyn Read + Send>,
    callback: Option<ReadCallback>,
}

impl ReadChunks for ReaderChunks {
    fn read_chunk(&mut self, max: usize) -> io::Result<Vec<u8>> {
        if let Some(callback) = &mut self.callback {
            return callback(&mut self.reader, max);
        }
        let mut chunk = Vec::with_capacity(max);
        (&mut self.reader).take(max as u64).read_to_end(&mut chunk)?;
        Ok(chunk)
    }
}

/// Default download strategy: write every chunk through to the writer.
struct WriterChunks {
    writer: Box<dyn Write + Send>,
    callback: Option<WriteCallback>,
}

impl WriteChunks for WriterChunks {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match &mut self.callback {
            Some(callback) => callback(&mut self.writer, chunk),
            None => self.writer.write_all(chunk),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Something that can be wired onto a request for a streaming exchange.
pub trait StreamAdapter {
    fn is_write(&self) -> bool;

    fn wire(self, request: &mut Request);
}

/// A local source uploaded as the request body.
pub struct StreamWrite {
    source: Box<dyn Read + Send>,
    callback: Option<ReadCallback>,
    gzip: bool,
}

impl StreamWrite {
    pub fn new(source: impl Read + Send + 'static) -> Self {
        Self {
            source: Box::new(source),
            callback: None,
            gzip: false,
        }
    }

    /// Replace the default chunk reader. The callback receives the (possibly compressed) source
    /// and the maximum chunk size.
    pub fn closure(
        mut self,
        callback: impl FnMut(&mut dyn Read, usize) -> io::Result<Vec<u8>> + Send + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Compress the source on the fly.
    pub fn apply_gzip(mut self) -> Self {
        if !self.gzip {
            self.source = Box::new(GzEncoder::new(self.source, Compression::default()));
            self.gzip = true;
        }
        self
    }

    pub fn is_gzip(&self) -> bool {
        self.gzip
    }
}

impl StreamAdapter for StreamWrite {
    fn is_write(&self) -> bool {
        true
    }

    fn wire(self, request: &mut Request) {
        let headers = request.headers_mut();
        if self.gzip {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        request.set_body(RequestBody::Stream(Box::new(ReaderChunks {
            reader: self.source,
            callback: self.callback,
        })));
    }
}

/// A local sink the response body is streamed into.
pub struct StreamRead {
    sink: Box<dyn Write + Send>,
    callback: Option<WriteCallback>,
    gzip: bool,
}

impl StreamRead {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            callback: None,
            gzip: false,
        }
    }

    pub fn closure(
        mut self,
        callback: impl FnMut(&mut dyn Write, &[u8]) -> io::Result<()> + Send + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Ask for a compressed response. The compressed bytes are written as they arrive.
    pub fn apply_gzip(mut self) -> Self {
        self.gzip = true;
        self
    }

    pub fn is_gzip(&self) -> bool {
        self.gzip
    }
}

impl StreamAdapter for StreamRead {
    fn is_write(&self) -> bool {
        false
    }

    fn wire(self, request: &mut Request) {
        let headers = request.headers_mut();
        if self.gzip {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        request.set_sink(Box::new(WriterChunks {
            writer: self.sink,
            callback: self.callback,
        }));
    }
}

/// Turn an upload strategy into a request body. The strategy is dropped when the stream ends,
/// fails, or the request itself is dropped.
pub(crate) fn upload_body(source: Box<dyn ReadChunks>) -> reqwest::Body {
    let chunks = futures::stream::unfold(Some(source), |state| async move {
        let mut source = state?;
        match source.read_chunk(CHUNK_SIZE) {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => Some((Ok(Bytes::from(chunk)), Some(source))),
            Err(e) => Some((Err(e), None)),
        }
    });
    reqwest::Body::wrap_stream(chunks)
}
