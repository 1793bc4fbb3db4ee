use crate::ast::{Token, TokenKind};
use crate::tokens::FORMAT_KEYWORD;

/// Output formats recognised in a `FORMAT <name>` directive unless a caller supplies its own set.
pub const DEFAULT_FORMATS: &[&str] = &[
    "TabSeparated",
    "TabSeparatedRaw",
    "TabSeparatedWithNames",
    "TabSeparatedWithNamesAndTypes",
    "TSV",
    "TSVRaw",
    "TSVWithNames",
    "TSVWithNamesAndTypes",
    "BlockTabSeparated",
    "TSKV",
    "CSV",
    "CSVWithNames",
    "CSVWithNamesAndTypes",
    "JSON",
    "JSONStrings",
    "JSONCompact",
    "JSONEachRow",
    "JSONCompactEachRow",
    "Vertical",
    "Values",
    "Pretty",
    "PrettyCompact",
    "RowBinary",
    "Native",
    "Null",
];

/// A closed set of output format names, matched case-insensitively as whole tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSet {
    names: Vec<String>,
}

impl FormatSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The canonical spelling of `candidate`, if it names a known format.
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(candidate))
            .map(String::as_str)
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.resolve(candidate).is_some()
    }
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::new(DEFAULT_FORMATS.iter().copied())
    }
}

/// Find the first `FORMAT <known format>` directive among `tokens`.
///
/// Only bare words count, so the keyword inside a string literal, a quoted identifier or a comment
/// is never mistaken for a directive, and `JSONStrings` is not read as `JSON`.
pub fn find_format_directive<'a>(tokens: &[Token], formats: &'a FormatSet) -> Option<&'a str> {
    let mut significant = tokens.iter().filter(|t| !t.is_trivia()).peekable();
    while let Some(token) = significant.next() {
        if !token.is_keyword(FORMAT_KEYWORD) {
            continue;
        }
        let Some(next) = significant.peek() else {
            break;
        };
        if next.kind == TokenKind::Word {
            if let Some(name) = formats.resolve(&next.text) {
                return Some(name);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex;

    fn directive(sql: &str) -> Option<String> {
        let formats = FormatSet::default();
        find_format_directive(&lex(sql).unwrap(), &formats).map(str::to_string)
    }

    #[test]
    fn test_find_format_directive() {
        assert_eq!(directive("select 1 FORMAT JSON"), Some("JSON".to_string()));
        assert_eq!(directive("select 1 format  csv"), Some("CSV".to_string()));
        assert_eq!(
            directive("select 1 FORMAT /* x */ JSONEachRow"),
            Some("JSONEachRow".to_string())
        );
        assert_eq!(directive("select 1"), None);
        assert_eq!(directive("select 'FORMAT JSON'"), None);
        assert_eq!(directive("select `format` from t -- FORMAT CSV"), None);
        assert_eq!(directive("select 1 FORMAT Unknown"), None);
        assert_eq!(directive("select formatDateTime(now(), '%Y') as format"), None);
    }

    #[test]
    fn test_whole_token_match() {
        assert_eq!(
            directive("select 1 FORMAT JSONStrings"),
            Some("JSONStrings".to_string())
        );
        let formats = FormatSet::new(["JSON"]);
        let tokens = lex("select 1 FORMAT JSONStrings").unwrap();
        assert_eq!(find_format_directive(&tokens, &formats), None);
    }

    #[test]
    fn test_format_set() {
        let formats = FormatSet::default();
        assert_eq!(formats.resolve("tsv"), Some("TSV"));
        assert!(formats.contains("PrettyCompact"));
        assert!(!formats.contains("Parquet"));
    }
}
