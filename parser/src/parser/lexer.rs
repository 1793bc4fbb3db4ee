use chumsky::prelude::*;

use crate::ast::{Token, TokenKind};
use crate::tokens::*;

use super::utils::*;

pub fn statement() -> impl Psr<Vec<Token>> {
    token().repeated().then_ignore(end())
}

fn token() -> impl Psr<Token> {
    choice((
        whitespace_run().map(|text| Token::new(TokenKind::Whitespace, text)),
        line_comment().map(|text| Token::new(TokenKind::Comment, text)),
        block_comment().map(|text| Token::new(TokenKind::Comment, text)),
        quoted_raw(STRING_QUOTE).map(|text| Token::new(TokenKind::String, text)),
        quoted_raw(BACKTICK).map(|text| Token::new(TokenKind::QuotedIdentifier, text)),
        quoted_raw(DOUBLE_QUOTE).map(|text| Token::new(TokenKind::QuotedIdentifier, text)),
        word().map(|text| Token::new(TokenKind::Word, text)),
        just(PLACEHOLDER).map(|c| Token::new(TokenKind::Placeholder, c.to_string())),
        punctuation().map(|c| Token::new(TokenKind::Punctuation, c.to_string())),
    ))
}

fn whitespace_run() -> impl Psr<String> {
    filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .collect::<String>()
}

fn line_comment() -> impl Psr<String> {
    just(LINE_COMMENT)
        .ignore_then(filter(|c: &char| *c != '\n').repeated())
        .collect::<String>()
        .map(|body| format!("{LINE_COMMENT}{body}"))
}

fn block_comment() -> impl Psr<String> {
    just(BLOCK_COMMENT_OPEN)
        .ignore_then(take_until(just(BLOCK_COMMENT_CLOSE)))
        .map(|(body, _)| {
            let body = body.into_iter().collect::<String>();
            format!("{BLOCK_COMMENT_OPEN}{body}{BLOCK_COMMENT_CLOSE}")
        })
}

fn word() -> impl Psr<String> {
    filter(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Quote characters are excluded so that an unterminated literal is a lexing error instead of a
/// stray punctuation token.
fn punctuation() -> impl Psr<char> {
    filter(|c: &char| !matches!(*c, STRING_QUOTE | BACKTICK | DOUBLE_QUOTE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        statement()
            .parse(input)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn t(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn test_lex_simple_select() {
        use TokenKind::*;
        assert_eq!(
            kinds("select 1"),
            vec![t(Word, "select"), t(Whitespace, " "), t(Word, "1")]
        );
        assert_eq!(
            kinds("a.b=?"),
            vec![
                t(Word, "a"),
                t(Punctuation, "."),
                t(Word, "b"),
                t(Punctuation, "="),
                t(Placeholder, "?"),
            ]
        );
    }

    #[test]
    fn test_lex_quotes() {
        use TokenKind::*;
        assert_eq!(
            kinds("'it''s' `a``b` \"c\""),
            vec![
                t(String, "'it''s'"),
                t(Whitespace, " "),
                t(QuotedIdentifier, "`a``b`"),
                t(Whitespace, " "),
                t(QuotedIdentifier, "\"c\""),
            ]
        );
        assert_eq!(kinds(r"'a\'?'"), vec![t(String, r"'a\'?'")]);
        assert_eq!(kinds("''"), vec![t(String, "''")]);
    }

    #[test]
    fn test_lex_comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("x -- FORMAT JSON\ny"),
            vec![
                t(Word, "x"),
                t(Whitespace, " "),
                t(Comment, "-- FORMAT JSON"),
                t(Whitespace, "\n"),
                t(Word, "y"),
            ]
        );
        assert_eq!(
            kinds("/* ? */-1"),
            vec![t(Comment, "/* ? */"), t(Punctuation, "-"), t(Word, "1")]
        );
    }

    #[test]
    fn test_lex_round_trips_source() {
        let input = "SELECT `x`, 'y' /* z */ FROM t -- end";
        let tokens = statement().parse(input).unwrap();
        assert_eq!(tokens.iter().map(|t| t.text.as_str()).collect::<String>(), input);
    }

    #[test]
    fn test_lex_unterminated_quote_fails() {
        assert!(statement().parse("select 'oops").is_err());
        assert!(statement().parse("select `oops").is_err());
    }
}
