//! Trie node lookup and manipulation

mod insert;
pub use insert::*;

mod lookup;
pub use lookup::*;

mod delete;
pub use delete::*;

mod minmax;
pub use minmax::*;

mod serialize;
pub use serialize::*;

mod deserialize;
pub use deserialize::*;
