mod compiler;
mod errors;
mod model;
mod options;
mod sql;
mod tests;

pub use compiler::{Conjunction, Grammar, Render};
pub use errors::{Error, ErrorKind};
pub use model::*;
pub use options::Options;
pub use sql::{ClickHouse, Dialect};
