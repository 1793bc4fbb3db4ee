use crate::sql::{ClickHouse, Dialect};

#[derive(Debug)]
pub struct Options {
    pub dialect: Box<dyn Dialect>,
    /// Prepended to every table name the grammar wraps.
    pub table_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Box::new(ClickHouse()),
            table_prefix: String::new(),
        }
    }
}
