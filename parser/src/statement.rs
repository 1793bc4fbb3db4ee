use std::fmt::{Display, Formatter};

use crate::{
    ast::{Token, TokenKind},
    errors::QueryError,
    find_format_directive,
    format::FormatSet,
    lex,
    tokens::{FORMAT_KEYWORD, LINE_COMMENT, STATEMENT_TERMINATOR},
};

/// SQL text plus the output format the caller would like the server to answer in.
///
/// The raw text is never rewritten. [`StatementText::to_sql`] derives the final statement from it
/// on every call, so rendering is idempotent no matter how often it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementText {
    raw: String,
    format: Option<String>,
    formats: FormatSet,
}

struct Resolved {
    sql: String,
    format: Option<String>,
}

impl StatementText {
    pub fn new(sql: impl Into<String>) -> Result<Self, QueryError> {
        let raw = sql.into();
        if raw.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self {
            raw,
            format: None,
            formats: FormatSet::default(),
        })
    }

    /// Replace the set of format names recognised in existing directives.
    pub fn with_formats(mut self, formats: FormatSet) -> Self {
        self.formats = formats;
        self
    }

    pub fn set_format(&mut self, format: impl Into<String>) -> &mut Self {
        self.format = Some(format.into());
        self
    }

    pub fn raw_sql(&self) -> &str {
        &self.raw
    }

    /// The format that was asked for programmatically, before looking at the text.
    pub fn requested_format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// The format the server will actually answer in. A directive already written in the text
    /// wins over the requested one.
    pub fn format(&self) -> Option<String> {
        self.resolve().format
    }

    pub fn to_sql(&self) -> String {
        self.resolve().sql
    }

    fn resolve(&self) -> Resolved {
        let Some(requested) = self.format.as_deref() else {
            return Resolved {
                sql: self.raw.clone(),
                format: None,
            };
        };

        let trimmed = strip_terminator(&self.raw);
        let tokens = lex(trimmed).unwrap_or_default();
        if let Some(format) = find_format_directive(&tokens, &self.formats) {
            return Resolved {
                sql: trimmed.to_string(),
                format: Some(format.to_string()),
            };
        }

        // A trailing line comment would swallow the directive.
        let separator = if ends_with_line_comment(&tokens) {
            '\n'
        } else {
            ' '
        };
        Resolved {
            sql: format!("{trimmed}{separator}{FORMAT_KEYWORD} {requested}"),
            format: Some(requested.to_string()),
        }
    }
}

impl Display for StatementText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

fn ends_with_line_comment(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .rev()
        .find(|t| t.kind != TokenKind::Whitespace)
        .map(|t| t.kind == TokenKind::Comment && t.text.starts_with(LINE_COMMENT))
        .unwrap_or(false)
}

fn strip_terminator(sql: &str) -> &str {
    let sql = sql.trim();
    sql.strip_suffix(STATEMENT_TERMINATOR)
        .map(str::trim_end)
        .unwrap_or(sql)
}
