//! Module containing the tree and the container registry, along with their
//! iterators.

mod art;
mod containers;

pub use art::*;
pub use containers::*;
