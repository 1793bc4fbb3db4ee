use reqwest::StatusCode;

/// A request that reached the server and came back as a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Request failed with status {status} (exception code {code:?}): {body}")]
pub struct TransportError {
    pub status: StatusCode,
    /// Taken from `X-ClickHouse-Exception-Code` when the server sent it.
    pub code: Option<i32>,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Query(#[from] housecall_parser::QueryError),

    #[error(transparent)]
    Compile(#[from] housecall_compiler::Error),

    #[error("Cannot bind values: {0}")]
    Binding(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Response(String),

    #[error("Request queue dropped the request before it completed")]
    QueueClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
