use std::fmt::Debug;

use itertools::Itertools;

use crate::model::{DatePart, Value};

pub trait Dialect: Debug + Send + Sync {
    /// Quote a table or column for use in SQL.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string for use in SQL.
    fn quote_string(&self, string: &str) -> String;

    /// Name of the function that extracts `part` from a date or date-time column.
    fn date_part_function(&self, part: DatePart) -> &'static str;

    /// Render a JSON path lookup on an already-quoted field.
    ///
    /// * `field` - The quoted column holding the JSON document
    /// * `path` - The keys to descend through, outermost first
    fn json_selector(&self, field: &str, path: &[&str]) -> String {
        let path = path.iter().map(|key| format!(r#""{key}""#)).join(".");
        format!("{field}->'$.{path}'")
    }

    /// The placeholder the grammar emits for a bound value.
    fn placeholder(&self) -> &'static str {
        "?"
    }

    /// Render a bound value as a literal, for substitution into a placeholder.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) if f.is_nan() => "nan".to_string(),
            Value::Float(f) if f.is_infinite() => {
                let sign = if f.is_sign_negative() { "-" } else { "" };
                format!("{sign}inf")
            }
            Value::Float(f) => f.to_string(),
            Value::String(s) => self.quote_string(s),
            Value::Array(items) => {
                format!("[{}]", items.iter().map(|item| self.literal(item)).join(", "))
            }
        }
    }
}
