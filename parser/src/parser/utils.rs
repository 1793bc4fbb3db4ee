use chumsky::prelude::*;

use crate::tokens::*;

/// `Psr` is an abbreviation for "Parser". This is abbreviated because it is used in many places,
/// and we don't want it to conflict with Chumsky's `Parser` trait.
///
/// This is a utility type to reduce code duplication in types. It would be easier to write as
/// follows:
///
/// ```rs
/// pub type Psr<T> = Parser<char, T, Error = Simple<char>> + Clone + 'static;
/// ```
///
/// However, we can't do that without [trait aliases][1].
///
/// [1]: https://github.com/rust-lang/rust/issues/41517
pub trait Psr<T>: Parser<char, T, Error = Simple<char>> + Clone + 'static {}
impl<S, T> Psr<T> for S where S: Parser<char, T, Error = Simple<char>> + Clone + 'static {}

/// Any single character.
pub fn anything() -> impl Psr<char> {
    filter(|_: &char| true)
}

/// A quoted run of text, returned verbatim with its delimiters.
///
/// Inside the quotes a backslash escapes the following character and a doubled quote stands for
/// a literal quote, which are the two escaping styles the server accepts.
pub fn quoted_raw(quote: char) -> impl Psr<String> {
    let escaped = just(STRING_ESCAPE_PREFIX).chain::<char, _, _>(anything());
    let doubled = just(quote).chain::<char, _, _>(just(quote));
    let plain = filter(move |c: &char| *c != quote && *c != STRING_ESCAPE_PREFIX).map(|c| vec![c]);

    just(quote)
        .chain::<char, _, _>(choice((escaped, doubled, plain)).repeated().flatten())
        .chain::<char, _, _>(just(quote))
        .collect::<String>()
}
