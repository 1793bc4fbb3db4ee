//! An HTTP client for ClickHouse.
//!
//! Queries are built as [`QueryModel`]s, compiled by a [`Grammar`] and sent through an
//! [`HttpTransport`]. [`Client`] ties the two together.

mod auth;
mod bind;
mod client;
mod config;
mod errors;
mod payload;
mod progress;
mod queue;
mod request;
mod settings;
mod statement;
mod stream;
mod transport;

pub use auth::{AuthMethod, Credentials, KEY_HEADER, USER_HEADER};
pub use bind::bind;
pub use client::{Client, Record};
pub use config::{ClientConfig, ConnectionConfig, Driver};
pub use errors::{Error, Result, TransportError};
pub use payload::{ExternalTable, FileSink, WhereInFile, WriteToFile, GZIP_PREFIX};
pub use progress::{parse_summary, ProgressListener, ProgressSummary, SUMMARY_HEADER};
pub use queue::{Pending, ReqwestQueue, RequestQueue};
pub use request::{FilePart, Request, RequestBody, RequestInfo, DEFAULT_CONNECT_TIMEOUT};
pub use settings::{Settings, UrlParams};
pub use statement::{Response, Statement, EXCEPTION_CODE_HEADER};
pub use stream::{ReadChunks, StreamAdapter, StreamRead, StreamWrite, WriteChunks, CHUNK_SIZE};
pub use transport::HttpTransport;

pub use housecall_compiler::{
    raw, Boolean, Column, DatePart, Direction, Expression, Filter, Grammar, InsertValues,
    JoinClause, JoinKind, Operand, Options, QueryModel, Row, Value,
};
pub use housecall_parser::{FormatSet, QueryError, StatementText};
