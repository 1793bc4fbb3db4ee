use std::fmt::{Display, Formatter};

use super::operand::{Column, Operand, Value};
use super::query::QueryModel;

/// How a predicate attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl Display for Boolean {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Boolean::And => write!(f, "and"),
            Boolean::Or => write!(f, "or"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Month,
    Day,
    Year,
    Time,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Raw {
        sql: String,
        bindings: Vec<Value>,
    },
    Basic {
        column: Column,
        operator: String,
        value: Operand,
    },
    In {
        column: Column,
        values: Vec<Operand>,
        not: bool,
    },
    InSub {
        column: Column,
        query: Box<QueryModel>,
        not: bool,
    },
    Null {
        column: Column,
        not: bool,
    },
    Between {
        column: Column,
        low: Operand,
        high: Operand,
        not: bool,
    },
    DateBased {
        part: DatePart,
        column: Column,
        operator: String,
        value: Operand,
    },
    Nested(Conditions),
    Sub {
        column: Column,
        operator: String,
        query: Box<QueryModel>,
    },
    Exists {
        query: Box<QueryModel>,
        not: bool,
    },
    Column {
        first: Column,
        operator: String,
        second: Column,
    },
}

/// One node of a where tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereNode {
    pub boolean: Boolean,
    pub predicate: Predicate,
}

impl WhereNode {
    /// Values bound to this node's placeholders, in the order they are rendered.
    pub fn bindings(&self) -> Vec<Value> {
        fn values<'a>(operands: impl IntoIterator<Item = &'a Operand>) -> Vec<Value> {
            operands
                .into_iter()
                .filter_map(Operand::as_value)
                .cloned()
                .collect()
        }

        match &self.predicate {
            Predicate::Raw { bindings, .. } => bindings.clone(),
            Predicate::Basic { value, .. } | Predicate::DateBased { value, .. } => values([value]),
            Predicate::In { values: v, .. } => values(v),
            Predicate::Between { low, high, .. } => values([low, high]),
            Predicate::InSub { query, .. }
            | Predicate::Sub { query, .. }
            | Predicate::Exists { query, .. } => query.bindings(),
            Predicate::Nested(conditions) => conditions.bindings(),
            Predicate::Null { .. } | Predicate::Column { .. } => vec![],
        }
    }
}

/// An ordered list of where nodes. This is the single where-tree builder shared by queries, join
/// clauses and nested groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    nodes: Vec<WhereNode>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WhereNode> {
        self.nodes.iter()
    }

    pub fn push(&mut self, boolean: Boolean, predicate: Predicate) {
        self.nodes.push(WhereNode { boolean, predicate });
    }

    pub fn bindings(&self) -> Vec<Value> {
        self.nodes.iter().flat_map(WhereNode::bindings).collect()
    }
}

impl Filter for Conditions {
    fn conditions_mut(&mut self) -> &mut Conditions {
        self
    }
}

/// Where-building operations, available on anything that owns a [`Conditions`].
pub trait Filter: Sized {
    fn conditions_mut(&mut self) -> &mut Conditions;

    fn add(mut self, boolean: Boolean, predicate: Predicate) -> Self {
        self.conditions_mut().push(boolean, predicate);
        self
    }

    fn where_(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add(Boolean::And, basic(column, operator, value))
    }

    fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add(Boolean::Or, basic(column, operator, value))
    }

    fn where_eq(self, column: impl Into<Column>, value: impl Into<Operand>) -> Self {
        self.where_(column, "=", value)
    }

    fn where_raw(self, sql: impl Into<String>) -> Self {
        self.where_raw_bindings(sql, Vec::<Value>::new())
    }

    fn or_where_raw(self, sql: impl Into<String>) -> Self {
        self.add(
            Boolean::Or,
            Predicate::Raw {
                sql: sql.into(),
                bindings: vec![],
            },
        )
    }

    /// A raw predicate whose `?` placeholders are bound to `bindings`.
    fn where_raw_bindings<V: Into<Value>>(
        self,
        sql: impl Into<String>,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add(
            Boolean::And,
            Predicate::Raw {
                sql: sql.into(),
                bindings: bindings.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add(Boolean::And, in_list(column, values, false))
    }

    fn or_where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add(Boolean::Or, in_list(column, values, false))
    }

    fn where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add(Boolean::And, in_list(column, values, true))
    }

    fn or_where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add(Boolean::Or, in_list(column, values, true))
    }

    fn where_in_sub(self, column: impl Into<Column>, query: QueryModel) -> Self {
        self.add(
            Boolean::And,
            Predicate::InSub {
                column: column.into(),
                query: Box::new(query),
                not: false,
            },
        )
    }

    fn where_not_in_sub(self, column: impl Into<Column>, query: QueryModel) -> Self {
        self.add(
            Boolean::And,
            Predicate::InSub {
                column: column.into(),
                query: Box::new(query),
                not: true,
            },
        )
    }

    fn where_null(self, column: impl Into<Column>) -> Self {
        self.add(Boolean::And, null_check(column, false))
    }

    fn or_where_null(self, column: impl Into<Column>) -> Self {
        self.add(Boolean::Or, null_check(column, false))
    }

    fn where_not_null(self, column: impl Into<Column>) -> Self {
        self.add(Boolean::And, null_check(column, true))
    }

    fn or_where_not_null(self, column: impl Into<Column>) -> Self {
        self.add(Boolean::Or, null_check(column, true))
    }

    fn where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add(Boolean::And, between(column, low, high, false))
    }

    fn or_where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add(Boolean::Or, between(column, low, high, false))
    }

    fn where_not_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add(Boolean::And, between(column, low, high, true))
    }

    fn where_date_part(
        self,
        part: DatePart,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add(
            Boolean::And,
            Predicate::DateBased {
                part,
                column: column.into(),
                operator: operator.to_string(),
                value: value.into(),
            },
        )
    }

    fn where_date(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(DatePart::Date, column, operator, value)
    }

    fn where_month(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(DatePart::Month, column, operator, value)
    }

    fn where_day(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(DatePart::Day, column, operator, value)
    }

    fn where_year(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(DatePart::Year, column, operator, value)
    }

    fn where_time(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(DatePart::Time, column, operator, value)
    }

    /// A parenthesized group. Empty groups are dropped.
    fn where_nested(self, build: impl FnOnce(Conditions) -> Conditions) -> Self {
        nested(self, Boolean::And, build)
    }

    fn or_where_nested(self, build: impl FnOnce(Conditions) -> Conditions) -> Self {
        nested(self, Boolean::Or, build)
    }

    fn where_sub(self, column: impl Into<Column>, operator: &str, query: QueryModel) -> Self {
        self.add(
            Boolean::And,
            Predicate::Sub {
                column: column.into(),
                operator: operator.to_string(),
                query: Box::new(query),
            },
        )
    }

    fn where_exists(self, query: QueryModel) -> Self {
        self.add(Boolean::And, exists(query, false))
    }

    fn or_where_exists(self, query: QueryModel) -> Self {
        self.add(Boolean::Or, exists(query, false))
    }

    fn where_not_exists(self, query: QueryModel) -> Self {
        self.add(Boolean::And, exists(query, true))
    }

    fn where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add(Boolean::And, column_compare(first, operator, second))
    }

    fn or_where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add(Boolean::Or, column_compare(first, operator, second))
    }
}

fn basic(column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Predicate {
    Predicate::Basic {
        column: column.into(),
        operator: operator.to_string(),
        value: value.into(),
    }
}

fn in_list<V: Into<Operand>>(
    column: impl Into<Column>,
    values: impl IntoIterator<Item = V>,
    not: bool,
) -> Predicate {
    Predicate::In {
        column: column.into(),
        values: values.into_iter().map(Into::into).collect(),
        not,
    }
}

fn null_check(column: impl Into<Column>, not: bool) -> Predicate {
    Predicate::Null {
        column: column.into(),
        not,
    }
}

fn between(
    column: impl Into<Column>,
    low: impl Into<Operand>,
    high: impl Into<Operand>,
    not: bool,
) -> Predicate {
    Predicate::Between {
        column: column.into(),
        low: low.into(),
        high: high.into(),
        not,
    }
}

fn exists(query: QueryModel, not: bool) -> Predicate {
    Predicate::Exists {
        query: Box::new(query),
        not,
    }
}

pub(crate) fn column_compare(
    first: impl Into<Column>,
    operator: &str,
    second: impl Into<Column>,
) -> Predicate {
    Predicate::Column {
        first: first.into(),
        operator: operator.to_string(),
        second: second.into(),
    }
}

pub(crate) fn nested<F: Filter>(
    target: F,
    boolean: Boolean,
    build: impl FnOnce(Conditions) -> Conditions,
) -> F {
    let conditions = build(Conditions::new());
    if conditions.is_empty() {
        return target;
    }
    target.add(boolean, Predicate::Nested(conditions))
}
