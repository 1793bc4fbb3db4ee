use std::fmt::{Display, Formatter};

use crate::compiler::Grammar;

use super::conditions::{Boolean, Conditions, Filter};
use super::join::{JoinClause, JoinKind};
use super::operand::{Column, Expression, Operand, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Column { column: Column, direction: Direction },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HavingKind {
    Basic {
        column: Column,
        operator: String,
        value: Operand,
    },
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Having {
    pub boolean: Boolean,
    pub kind: HavingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub query: Box<QueryModel>,
    pub all: bool,
}

/// A structured `select` statement.
///
/// The model is plain data: building it never touches the network and compiling it never
/// modifies it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryModel {
    /// `None` selects `*`.
    pub columns: Option<Vec<Column>>,
    pub from: Option<Column>,
    pub joins: Vec<JoinClause>,
    pub wheres: Conditions,
    pub groups: Vec<Column>,
    pub havings: Vec<Having>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Takes precedence over `columns` when set.
    pub aggregate: Option<Aggregate>,
    pub unions: Vec<Union>,
    pub union_orders: Vec<Order>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub distinct: bool,
}

impl QueryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(table: impl Into<Column>) -> Self {
        Self::new().from(table)
    }

    pub fn from(mut self, table: impl Into<Column>) -> Self {
        self.from = Some(table.into());
        self
    }

    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn add_select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns
            .get_or_insert_with(Vec::new)
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.add_select([Expression::new(sql)])
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let join = JoinClause::new(JoinKind::Inner, table).on(first, operator, second);
        self.join_clause(join)
    }

    pub fn left_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let join = JoinClause::new(JoinKind::Left, table).on(first, operator, second);
        self.join_clause(join)
    }

    pub fn right_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let join = JoinClause::new(JoinKind::Right, table).on(first, operator, second);
        self.join_clause(join)
    }

    pub fn cross_join(self, table: impl Into<Column>) -> Self {
        self.join_clause(JoinClause::new(JoinKind::Cross, table))
    }

    /// Join with conditions assembled by `build`.
    pub fn join_with(
        self,
        kind: JoinKind,
        table: impl Into<Column>,
        build: impl FnOnce(JoinClause) -> JoinClause,
    ) -> Self {
        self.join_clause(build(JoinClause::new(kind, table)))
    }

    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn group_by<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.push_having(Boolean::And, column, operator, value)
    }

    pub fn or_having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.push_having(Boolean::Or, column, operator, value)
    }

    pub fn having_raw(mut self, sql: impl Into<String>) -> Self {
        self.havings.push(Having {
            boolean: Boolean::And,
            kind: HavingKind::Raw(sql.into()),
        });
        self
    }

    fn push_having(
        mut self,
        boolean: Boolean,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.havings.push(Having {
            boolean,
            kind: HavingKind::Basic {
                column: column.into(),
                operator: operator.to_string(),
                value: value.into(),
            },
        });
        self
    }

    /// Once a union has been added, ordering applies to the combined result.
    pub fn order_by(self, column: impl Into<Column>, direction: Direction) -> Self {
        self.push_order(Order::Column {
            column: column.into(),
            direction,
        })
    }

    pub fn order_by_desc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn order_by_raw(self, sql: impl Into<String>) -> Self {
        self.push_order(Order::Raw(sql.into()))
    }

    fn push_order(mut self, order: Order) -> Self {
        if self.unions.is_empty() {
            self.orders.push(order);
        } else {
            self.union_orders.push(order);
        }
        self
    }

    /// Once a union has been added, the limit applies to the combined result.
    pub fn limit(mut self, limit: u64) -> Self {
        if self.unions.is_empty() {
            self.limit = Some(limit);
        } else {
            self.union_limit = Some(limit);
        }
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        if self.unions.is_empty() {
            self.offset = Some(offset);
        } else {
            self.union_offset = Some(offset);
        }
        self
    }

    /// Limit and offset for a 1-based page number.
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        self.offset(page.saturating_sub(1).saturating_mul(per_page))
            .limit(per_page)
    }

    pub fn union(mut self, query: QueryModel) -> Self {
        self.unions.push(Union {
            query: Box::new(query),
            all: false,
        });
        self
    }

    pub fn union_all(mut self, query: QueryModel) -> Self {
        self.unions.push(Union {
            query: Box::new(query),
            all: true,
        });
        self
    }

    pub fn aggregate<C: Into<Column>>(
        mut self,
        function: impl Into<String>,
        columns: impl IntoIterator<Item = C>,
    ) -> Self {
        self.aggregate = Some(Aggregate {
            function: function.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Values for every `?` placeholder, in the order [`Grammar::compile_select`] emits them.
    pub fn bindings(&self) -> Vec<Value> {
        let mut bindings = vec![];
        for join in &self.joins {
            bindings.extend(join.conditions().bindings());
        }
        bindings.extend(self.wheres.bindings());
        for having in &self.havings {
            if let HavingKind::Basic { value, .. } = &having.kind {
                bindings.extend(value.as_value().cloned());
            }
        }
        for union in &self.unions {
            bindings.extend(union.query.bindings());
        }
        bindings
    }

    /// Compile with the default ClickHouse grammar.
    pub fn to_sql(&self) -> String {
        Grammar::default().compile_select(self)
    }
}

impl Filter for QueryModel {
    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.wheres
    }
}
