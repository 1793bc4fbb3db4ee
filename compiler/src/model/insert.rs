use std::iter::FromIterator;

use crate::errors::{Error, ErrorKind};

use super::operand::{Operand, Value};

/// One record to insert: column names paired with their values, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Operand)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing its value in place if it was already set.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Operand> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn get(&self, column: &str) -> Option<&Operand> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Row::new(), |row, (column, value)| row.set(column, value))
    }
}

/// The rows of an insert statement. A single row is promoted to a one-element batch.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    One(Row),
    Many(Vec<Row>),
}

impl InsertValues {
    pub fn rows(&self) -> &[Row] {
        match self {
            InsertValues::One(row) => std::slice::from_ref(row),
            InsertValues::Many(rows) => rows,
        }
    }

    /// Every row's values in the column order of the first row. Each row must set exactly the
    /// first row's columns.
    pub fn aligned(&self) -> Result<Vec<Vec<&Operand>>, Error> {
        let rows = self.rows();
        let Some(first) = rows.first() else {
            return Ok(vec![]);
        };
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let mismatch = || Error::new(ErrorKind::MismatchedInsertColumns { row: index });
                if row.len() != first.len() {
                    return Err(mismatch());
                }
                first
                    .columns()
                    .map(|column| row.get(column).ok_or_else(mismatch))
                    .collect()
            })
            .collect()
    }

    /// Bound values in the order [`Grammar::compile_insert`](crate::Grammar::compile_insert)
    /// emits their placeholders.
    pub fn bindings(&self) -> Result<Vec<Value>, Error> {
        Ok(self
            .aligned()?
            .into_iter()
            .flatten()
            .filter_map(Operand::as_value)
            .cloned()
            .collect())
    }
}

impl From<Row> for InsertValues {
    fn from(row: Row) -> Self {
        InsertValues::One(row)
    }
}

impl From<Vec<Row>> for InsertValues {
    fn from(rows: Vec<Row>) -> Self {
        InsertValues::Many(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operand::raw;

    #[test]
    fn test_set_keeps_first_position() {
        let row = Row::new().set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            row.values().collect::<Vec<_>>(),
            vec![&Operand::from(3), &Operand::from(2)]
        );
    }

    #[test]
    fn test_single_row_is_promoted() {
        let values = InsertValues::from(Row::from_iter([("a", 1)]));
        assert_eq!(values.rows().len(), 1);
    }

    #[test]
    fn test_bindings_skip_raw_cells() {
        let values = InsertValues::from(vec![
            Row::new().set("a", 1).set("b", raw("now()")),
            Row::new().set("a", 2).set("b", raw("now()")),
        ]);
        assert_eq!(values.bindings().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_bindings_follow_first_row_column_order() {
        let values = InsertValues::from(vec![
            Row::new().set("a", 1).set("b", 2),
            Row::new().set("b", 3).set("a", 4),
        ]);
        assert_eq!(
            values.bindings().unwrap(),
            vec![Value::Int(1), Value::Int(2), Value::Int(4), Value::Int(3)]
        );
    }

    #[test]
    fn test_rows_with_other_columns_are_rejected() {
        let extra = InsertValues::from(vec![
            Row::new().set("a", 1),
            Row::new().set("a", 2).set("b", 3),
        ]);
        let renamed = InsertValues::from(vec![
            Row::new().set("a", 1).set("b", 2),
            Row::new().set("a", 3).set("c", 4),
        ]);
        for values in [extra, renamed] {
            assert_eq!(
                values.bindings().unwrap_err().kind(),
                &ErrorKind::MismatchedInsertColumns { row: 1 }
            );
        }
    }
}
