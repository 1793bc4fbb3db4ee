use crate::model::DatePart;

use super::dialect::Dialect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickHouse();

impl Dialect for ClickHouse {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn quote_string(&self, string: &str) -> String {
        format!("'{}'", string.replace('\\', r"\\").replace('\'', r"\'"))
    }

    fn date_part_function(&self, part: DatePart) -> &'static str {
        match part {
            DatePart::Date => "toDate",
            DatePart::Month => "toMonth",
            DatePart::Day => "toDayOfMonth",
            DatePart::Year => "toYear",
            DatePart::Time => "toTime",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_quote_identifier_doubles_backticks() {
        assert_eq!(ClickHouse().quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_quote_string_escapes() {
        assert_eq!(ClickHouse().quote_string(r"it's \ here"), r"'it\'s \\ here'");
    }

    #[test]
    fn test_literals() {
        let d = ClickHouse();
        assert_eq!(d.literal(&Value::Null), "NULL");
        assert_eq!(d.literal(&Value::Bool(true)), "true");
        assert_eq!(d.literal(&Value::Int(-3)), "-3");
        assert_eq!(d.literal(&Value::Float(1.5)), "1.5");
        assert_eq!(d.literal(&Value::Float(f64::NEG_INFINITY)), "-inf");
        assert_eq!(
            d.literal(&Value::Array(vec![Value::from("a"), Value::from(1)])),
            "['a', 1]"
        );
    }

    #[test]
    fn test_json_selector() {
        assert_eq!(
            ClickHouse().json_selector("`data`", &["a", "b"]),
            r#"`data`->'$."a"."b"'"#
        );
    }
}
