mod lexer;
mod utils;

pub use lexer::statement;
