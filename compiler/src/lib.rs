mod compiler;
mod frame;
mod heap;
mod parser;
mod precedence;

pub use compiler::compile;
