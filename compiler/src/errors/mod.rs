mod error;
mod msg;

pub use error::{Error, ErrorKind};
