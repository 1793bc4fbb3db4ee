mod errors;
mod format;
mod parser;
mod statement;

pub mod ast;
pub mod tokens;

use chumsky::Parser;

pub use errors::QueryError;
pub use format::{find_format_directive, FormatSet, DEFAULT_FORMATS};
pub use statement::StatementText;

/// Split a statement into tokens whose texts concatenate back to `input`.
pub fn lex(input: &str) -> Result<Vec<ast::Token>, QueryError> {
    parser::statement().parse(input).map_err(|errors| {
        QueryError::Malformed(
            errors
                .into_iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}
