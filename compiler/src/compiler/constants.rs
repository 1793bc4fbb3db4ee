pub const SELECT: &str = "select";
pub const STAR: &str = "*";

/// Stands in for an `in` predicate over an empty list.
pub const EMPTY_IN: &str = "0 = 1";
/// Stands in for a `not in` predicate over an empty list.
pub const EMPTY_NOT_IN: &str = "1 = 1";

pub const AGGREGATE_ALIAS: &str = "aggregate";
pub const EXISTS_ALIAS: &str = "exists";

pub const ALIAS_KEYWORD: &str = " as ";
pub const JSON_ARROW: &str = "->";
pub const SEGMENT_SEPARATOR: char = '.';
