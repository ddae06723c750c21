//! Trie node representation and manipulation

mod operations;
mod representation;
mod shuttle;

pub mod visitor;

pub use operations::*;
pub use representation::*;
pub use shuttle::*;
