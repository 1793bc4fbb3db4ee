/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    /// A `-- line` or `/* block */` comment, delimiters included.
    Comment,
    /// A single-quoted string literal, quotes included.
    String,
    /// A backtick or double-quoted identifier, quotes included.
    QuotedIdentifier,
    /// A keyword, bare identifier or number.
    Word,
    /// A positional `?` parameter.
    Placeholder,
    Punctuation,
}

/// One lexeme of a SQL statement.
///
/// `text` is always the exact source slice, so concatenating the text of every token reproduces
/// the statement byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Whitespace and comments never change the meaning of a statement.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}
