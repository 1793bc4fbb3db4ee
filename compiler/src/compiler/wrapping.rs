use itertools::Itertools;

use crate::model::{Column, Operand};

use super::{
    constants::{ALIAS_KEYWORD, JSON_ARROW, SEGMENT_SEPARATOR, STAR},
    Grammar,
};

impl Grammar {
    /// Quote a column reference. Qualified names have their first segment treated as a table.
    pub fn wrap(&self, column: &Column) -> String {
        match column {
            Column::Raw(expression) => expression.to_string(),
            Column::Name(name) => self.wrap_name(name),
        }
    }

    /// Quote a table reference, applying the table prefix to the name and to any alias.
    pub fn wrap_table(&self, table: &Column) -> String {
        let name = match table {
            Column::Raw(expression) => return expression.to_string(),
            Column::Name(name) => name,
        };
        let prefix = &self.options().table_prefix;
        match split_alias(name) {
            Some((table, alias)) => format!(
                "{} as {}",
                self.wrap_table_name(table),
                self.wrap_value(&format!("{prefix}{alias}"))
            ),
            None => self.wrap_table_name(name),
        }
    }

    pub fn columnize<'a>(&self, columns: impl IntoIterator<Item = &'a Column>) -> String {
        columns.into_iter().map(|c| self.wrap(c)).join(", ")
    }

    /// Raw operands are inlined; everything else becomes a placeholder.
    pub fn parameter(&self, operand: &Operand) -> String {
        match operand {
            Operand::Raw(expression) => expression.to_string(),
            Operand::Value(_) => self.options().dialect.placeholder().to_string(),
        }
    }

    pub fn parameterize<'a>(&self, operands: impl IntoIterator<Item = &'a Operand>) -> String {
        operands.into_iter().map(|o| self.parameter(o)).join(", ")
    }

    fn wrap_name(&self, name: &str) -> String {
        match split_alias(name) {
            Some((expr, alias)) => format!("{} as {}", self.wrap_name(expr), self.wrap_value(alias)),
            None => self.wrap_segments(name),
        }
    }

    fn wrap_segments(&self, name: &str) -> String {
        let segments = name.split(SEGMENT_SEPARATOR).collect::<Vec<_>>();
        let prefix = &self.options().table_prefix;
        segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                if i == 0 && segments.len() > 1 {
                    self.wrap_value(&format!("{prefix}{segment}"))
                } else {
                    self.wrap_value(segment)
                }
            })
            .join(".")
    }

    fn wrap_table_name(&self, table: &str) -> String {
        let prefixed = format!("{}{table}", self.options().table_prefix);
        prefixed
            .split(SEGMENT_SEPARATOR)
            .map(|segment| self.wrap_value(segment))
            .join(".")
    }

    fn wrap_value(&self, value: &str) -> String {
        if value == STAR {
            return value.to_string();
        }
        let dialect = &self.options().dialect;
        if value.contains(JSON_ARROW) {
            let mut path = value.split(JSON_ARROW);
            let field = dialect.quote_identifier(path.next().unwrap_or_default());
            return dialect.json_selector(&field, &path.collect::<Vec<_>>());
        }
        dialect.quote_identifier(value)
    }
}

/// Split `expr as alias` once on the first `as`, ignoring case.
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let at = value.to_ascii_lowercase().find(ALIAS_KEYWORD)?;
    let expr = value.get(..at)?.trim_end();
    let alias = value.get(at + ALIAS_KEYWORD.len()..)?.trim_start();
    Some((expr, alias))
}
