#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Empty query")]
    Empty,

    #[error("Malformed statement: {0}")]
    Malformed(String),
}
