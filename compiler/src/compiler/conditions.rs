use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::model::{Conditions, Predicate, WhereNode};

use super::{
    constants::{EMPTY_IN, EMPTY_NOT_IN},
    rendering::Render,
    Grammar,
};

/// The keyword that introduces a condition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    Where,
    On,
}

impl Display for Conjunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Conjunction::Where => write!(f, "where"),
            Conjunction::On => write!(f, "on"),
        }
    }
}

impl Grammar {
    /// Render a condition list behind its conjunction, or nothing when the list is empty.
    pub(crate) fn compile_conditions(&self, conditions: &Conditions, conjunction: Conjunction) -> String {
        if conditions.is_empty() {
            return String::new();
        }
        format!("{conjunction} {}", self.compile_condition_body(conditions))
    }

    fn compile_condition_body(&self, conditions: &Conditions) -> String {
        let sql = conditions.iter().map(|node| node.render(self)).join(" ");
        remove_leading_boolean(&sql).to_string()
    }
}

impl Render for WhereNode {
    fn render(&self, grammar: &Grammar) -> String {
        format!("{} {}", self.boolean, self.predicate.render(grammar))
    }
}

impl Render for Predicate {
    fn render(&self, g: &Grammar) -> String {
        let not = |negated: &bool| if *negated { "not " } else { "" };
        match self {
            Predicate::Raw { sql, .. } => sql.clone(),
            Predicate::Basic {
                column,
                operator,
                value,
            } => format!("{} {operator} {}", g.wrap(column), g.parameter(value)),
            Predicate::In {
                values, not: true, ..
            } if values.is_empty() => EMPTY_NOT_IN.to_string(),
            Predicate::In { values, .. } if values.is_empty() => EMPTY_IN.to_string(),
            Predicate::In {
                column,
                values,
                not: negated,
            } => format!(
                "{} {}in ({})",
                g.wrap(column),
                not(negated),
                g.parameterize(values)
            ),
            Predicate::InSub {
                column,
                query,
                not: negated,
            } => format!(
                "{} {}in ({})",
                g.wrap(column),
                not(negated),
                g.compile_select(query)
            ),
            Predicate::Null {
                column,
                not: negated,
            } => format!("{} is {}null", g.wrap(column), not(negated)),
            Predicate::Between {
                column,
                low,
                high,
                not: negated,
            } => format!(
                "{} {}between {} and {}",
                g.wrap(column),
                not(negated),
                g.parameter(low),
                g.parameter(high)
            ),
            Predicate::DateBased {
                part,
                column,
                operator,
                value,
            } => format!(
                "{}({}) {operator} {}",
                g.options().dialect.date_part_function(*part),
                g.wrap(column),
                g.parameter(value)
            ),
            Predicate::Nested(conditions) => format!("({})", g.compile_condition_body(conditions)),
            Predicate::Sub {
                column,
                operator,
                query,
            } => format!("{} {operator} ({})", g.wrap(column), g.compile_select(query)),
            Predicate::Exists {
                query,
                not: negated,
            } => format!("{}exists ({})", not(negated), g.compile_select(query)),
            Predicate::Column {
                first,
                operator,
                second,
            } => format!("{} {operator} {}", g.wrap(first), g.wrap(second)),
        }
    }
}

/// Strip exactly one leading `and ` or `or `, ignoring case.
pub(crate) fn remove_leading_boolean(sql: &str) -> &str {
    ["and ", "or "]
        .iter()
        .find_map(|keyword| {
            let head = sql.get(..keyword.len())?;
            if head.eq_ignore_ascii_case(keyword) {
                sql.get(keyword.len()..)
            } else {
                None
            }
        })
        .unwrap_or(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_leading_boolean_strips_once() {
        assert_eq!(remove_leading_boolean("and a = 1 or b = 2"), "a = 1 or b = 2");
        assert_eq!(remove_leading_boolean("OR and x"), "and x");
        assert_eq!(remove_leading_boolean("android = 1"), "android = 1");
        assert_eq!(remove_leading_boolean("or"), "or");
        assert_eq!(remove_leading_boolean(""), "");
    }
}
