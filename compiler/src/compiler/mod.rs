mod compiler;
mod conditions;
mod constants;
mod rendering;
mod wrapping;

pub use compiler::Grammar;
pub use conditions::Conjunction;
pub use rendering::Render;
