use itertools::Itertools;

use crate::{
    errors::{Error, ErrorKind},
    model::{Column, InsertValues, QueryModel},
    Options,
};

use super::{constants::EXISTS_ALIAS, rendering::concatenate};

/// Turns query models into ClickHouse SQL.
///
/// Compilation is a pure function of the model and the options: it never mutates its input and
/// the same model always yields the same string. Values are never escaped here. Every bindable
/// value becomes a placeholder, and [`QueryModel::bindings`] lists them in the same order.
#[derive(Debug, Default)]
pub struct Grammar {
    options: Options,
}

impl Grammar {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn compile_select(&self, query: &QueryModel) -> String {
        let sql = concatenate([
            self.compile_aggregate(query),
            self.compile_columns(query),
            self.compile_from(query),
            self.compile_joins(query),
            self.compile_wheres(query),
            self.compile_groups(query),
            self.compile_havings(query),
            self.compile_orders(&query.orders),
            self.compile_limit(query.limit),
            self.compile_offset(query.offset),
        ]);
        if query.unions.is_empty() {
            return sql;
        }
        format!("({sql}) {}", self.compile_unions(query))
    }

    pub fn compile_exists(&self, query: &QueryModel) -> String {
        let alias = self.wrap(&Column::from(EXISTS_ALIAS));
        format!("select exists({}) as {alias}", self.compile_select(query))
    }

    /// Column names come from the first row; every row contributes one parenthesized tuple in
    /// that column order.
    pub fn compile_insert(
        &self,
        query: &QueryModel,
        values: &InsertValues,
    ) -> Result<String, Error> {
        let table = query
            .from
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::MissingTable))?;
        let rows = values.rows();
        let first = match rows.first() {
            Some(row) if !row.is_empty() => row,
            _ => return Err(Error::new(ErrorKind::EmptyInsert)),
        };
        let columns = self.columnize(&first.columns().map(Column::from).collect::<Vec<_>>());
        let tuples = values
            .aligned()?
            .into_iter()
            .map(|row| format!("({})", self.parameterize(row)))
            .join(", ");
        Ok(format!(
            "insert into {} ({columns}) values {tuples}",
            self.wrap_table(table)
        ))
    }
}
