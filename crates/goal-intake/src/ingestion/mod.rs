//! Bounded multi-format parsing

mod cells;
pub mod document;
mod parser;
pub mod plaintext;
pub mod spreadsheet;
pub mod tabular;

pub use parser::Parser;
