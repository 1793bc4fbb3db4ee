use std::fmt::{Display, Formatter};

use super::conditions::{column_compare, nested, Boolean, Conditions, Filter};
use super::operand::{Column, Operand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    /// Any other join keyword sequence, e.g. `global any left`.
    Other(String),
}

impl Display for JoinKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
            JoinKind::Right => write!(f, "right"),
            JoinKind::Full => write!(f, "full"),
            JoinKind::Cross => write!(f, "cross"),
            JoinKind::Other(keywords) => write!(f, "{keywords}"),
        }
    }
}

/// A join target together with its `on` conditions.
///
/// Only condition-building is exposed here; everything else about the query belongs to the
/// owning [`QueryModel`](super::query::QueryModel).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: Column,
    conditions: Conditions,
}

impl JoinClause {
    pub fn new(kind: JoinKind, table: impl Into<Column>) -> Self {
        Self {
            kind,
            table: table.into(),
            conditions: Conditions::new(),
        }
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn on(
        mut self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.conditions
            .push(Boolean::And, column_compare(first, operator, second));
        self
    }

    pub fn or_on(
        mut self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.conditions
            .push(Boolean::Or, column_compare(first, operator, second));
        self
    }

    pub fn on_nested(mut self, build: impl FnOnce(Conditions) -> Conditions) -> Self {
        self.conditions = nested(self.conditions, Boolean::And, build);
        self
    }

    pub fn where_(
        mut self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.conditions = self.conditions.where_(column, operator, value);
        self
    }

    pub fn or_where(
        mut self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.conditions = self.conditions.or_where(column, operator, value);
        self
    }
}
