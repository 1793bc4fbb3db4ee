mod conditions;
mod insert;
mod join;
mod operand;
mod query;

pub use conditions::{Boolean, Conditions, DatePart, Filter, Predicate, WhereNode};
pub use insert::{InsertValues, Row};
pub use join::{JoinClause, JoinKind};
pub use operand::{raw, Column, Expression, Operand, Value};
pub use query::{Aggregate, Direction, Having, HavingKind, Order, QueryModel, Union};
