use housecall_compiler::{Dialect, Value};
use housecall_parser::{ast::TokenKind, lex};

use crate::errors::{Error, Result};

/// Substitute `bindings` into the `?` placeholders of `sql`, in order.
///
/// Question marks inside string literals, quoted identifiers and comments are left alone. The
/// number of placeholders must match the number of values exactly.
pub fn bind(sql: &str, bindings: &[Value], dialect: &dyn Dialect) -> Result<String> {
    if bindings.is_empty() {
        return Ok(sql.to_string());
    }
    let tokens = lex(sql)?;
    let mut values = bindings.iter();
    let mut bound = String::with_capacity(sql.len());
    for token in &tokens {
        if token.kind != TokenKind::Placeholder {
            bound.push_str(&token.text);
            continue;
        }
        let value = values.next().ok_or_else(|| {
            Error::Binding(format!(
                "statement has more placeholders than the {} values given",
                bindings.len()
            ))
        })?;
        bound.push_str(&dialect.literal(value));
    }
    let unused = values.count();
    if unused > 0 {
        return Err(Error::Binding(format!(
            "{unused} of {} values have no placeholder",
            bindings.len()
        )));
    }
    Ok(bound)
}
