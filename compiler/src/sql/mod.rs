mod clickhouse;
mod dialect;

pub use clickhouse::*;
pub use dialect::*;
