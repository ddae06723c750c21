#![deny(
    // missing_docs,
    deprecated_in_future,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    rustdoc::invalid_codeblock_attributes
)]
#![forbid(unsafe_code)]
#![doc(
    html_playground_url = "https://play.rust-lang.org/",
    test(attr(deny(warnings)))
)]

//! Adaptive radix tree index for 64-bit roaring bitmaps
//!
//! The high 48 bits of every 64-bit value are used as a 6 byte key in an
//! [`Art`], whose leaves hold the index of a [`Container`] in a
//! [`Containers`] registry. The container stores the low 16 bits.
//!
//! # References
//!
//!  - Leis, V., Kemper, A., & Neumann, T. (2013, April). The adaptive radix
//!    tree: ARTful indexing for main-memory databases. In 2013 IEEE 29th
//!    International Conference on Data Engineering (ICDE) (pp. 38-49). IEEE.
//!    [Link to PDF][ART paper]
//!
//! [ART paper]: https://www-db.in.tum.de/~leis/papers/ART.pdf

mod bytes;
mod collections;
pub mod error;
mod nodes;

#[doc(hidden)]
pub mod tests_common;

pub use bytes::*;
pub use collections::*;
pub use nodes::{visitor, *};

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
