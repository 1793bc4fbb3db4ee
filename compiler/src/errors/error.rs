use std::error;
use std::fmt;

use super::msg;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error { kind }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// The kind of an error that can occur.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An insert was compiled without any rows, or with a first row that has no columns.
    EmptyInsert,
    /// An insert was compiled for a query model with no `from` table.
    MissingTable,
    /// A row of a multi-row insert does not set the same columns as the first row.
    MismatchedInsertColumns { row: usize },
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::EmptyInsert => write!(f, "{}", msg::empty_insert()),
            ErrorKind::MissingTable => write!(f, "{}", msg::missing_table()),
            ErrorKind::MismatchedInsertColumns { row } => {
                write!(f, "{}", msg::mismatched_insert_columns(row))
            }
        }
    }
}
