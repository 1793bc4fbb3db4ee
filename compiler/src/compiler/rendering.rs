use itertools::Itertools;

use crate::model::{Column, Having, HavingKind, JoinClause, Order, QueryModel};

use super::{
    conditions::{remove_leading_boolean, Conjunction},
    constants::{AGGREGATE_ALIAS, SELECT, STAR},
    Grammar,
};

pub trait Render {
    fn render(&self, grammar: &Grammar) -> String;
}

impl Render for JoinClause {
    fn render(&self, g: &Grammar) -> String {
        let table = g.wrap_table(&self.table);
        let on = g.compile_conditions(self.conditions(), Conjunction::On);
        format!("{} join {table} {on}", self.kind).trim_end().to_string()
    }
}

impl Render for Having {
    fn render(&self, g: &Grammar) -> String {
        let predicate = match &self.kind {
            HavingKind::Basic {
                column,
                operator,
                value,
            } => format!("{} {operator} {}", g.wrap(column), g.parameter(value)),
            HavingKind::Raw(sql) => sql.clone(),
        };
        format!("{} {predicate}", self.boolean)
    }
}

impl Render for Order {
    fn render(&self, g: &Grammar) -> String {
        match self {
            Order::Column { column, direction } => format!("{} {direction}", g.wrap(column)),
            Order::Raw(sql) => sql.clone(),
        }
    }
}

/// Select components, each rendering to an empty string when the model leaves it unset.
impl Grammar {
    pub(super) fn compile_aggregate(&self, query: &QueryModel) -> String {
        let Some(aggregate) = &query.aggregate else {
            return String::new();
        };
        let mut column = self.columnize(&aggregate.columns);
        if column.is_empty() {
            column = STAR.to_string();
        }
        if query.distinct && column != STAR {
            column = format!("distinct {column}");
        }
        format!("{SELECT} {}({column}) as {AGGREGATE_ALIAS}", aggregate.function)
    }

    pub(super) fn compile_columns(&self, query: &QueryModel) -> String {
        if query.aggregate.is_some() {
            return String::new();
        }
        let star = [Column::from(STAR)];
        let columns: &[Column] = match query.columns.as_deref() {
            Some(columns) if !columns.is_empty() => columns,
            _ => &star,
        };
        let select = if query.distinct {
            format!("{SELECT} distinct")
        } else {
            SELECT.to_string()
        };
        format!("{select} {}", self.columnize(columns))
    }

    pub(super) fn compile_from(&self, query: &QueryModel) -> String {
        query
            .from
            .as_ref()
            .map(|table| format!("from {}", self.wrap_table(table)))
            .unwrap_or_default()
    }

    pub(super) fn compile_joins(&self, query: &QueryModel) -> String {
        query.joins.iter().map(|join| join.render(self)).join(" ")
    }

    pub(super) fn compile_wheres(&self, query: &QueryModel) -> String {
        self.compile_conditions(&query.wheres, Conjunction::Where)
    }

    pub(super) fn compile_groups(&self, query: &QueryModel) -> String {
        if query.groups.is_empty() {
            return String::new();
        }
        format!("group by {}", self.columnize(&query.groups))
    }

    pub(super) fn compile_havings(&self, query: &QueryModel) -> String {
        if query.havings.is_empty() {
            return String::new();
        }
        let sql = query.havings.iter().map(|h| h.render(self)).join(" ");
        format!("having {}", remove_leading_boolean(&sql))
    }

    pub(super) fn compile_orders(&self, orders: &[Order]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        format!("order by {}", orders.iter().map(|o| o.render(self)).join(", "))
    }

    pub(super) fn compile_limit(&self, limit: Option<u64>) -> String {
        limit.map(|n| format!("limit {n}")).unwrap_or_default()
    }

    pub(super) fn compile_offset(&self, offset: Option<u64>) -> String {
        offset.map(|n| format!("offset {n}")).unwrap_or_default()
    }

    /// Everything after the parenthesized main body of a union query.
    pub(super) fn compile_unions(&self, query: &QueryModel) -> String {
        let unions = query.unions.iter().map(|union| {
            let keyword = if union.all { "union all" } else { "union" };
            format!("{keyword} ({})", self.compile_select(&union.query))
        });
        let trailing = [
            self.compile_orders(&query.union_orders),
            self.compile_limit(query.union_limit),
            self.compile_offset(query.union_offset),
        ];
        concatenate(unions.chain(trailing))
    }
}

/// Join non-empty fragments with single spaces.
pub(super) fn concatenate(fragments: impl IntoIterator<Item = String>) -> String {
    fragments.into_iter().filter(|s| !s.is_empty()).join(" ")
}
