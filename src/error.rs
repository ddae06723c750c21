//! Error types for serialization and registry growth.

use crate::NodeType;
use std::{collections::TryReserveError, io};
use thiserror::Error;

/// Errors produced while decoding a tree or registry stream.
///
/// All of these abort the decode; there is no partial recovery.
#[derive(Error, Debug)]
pub enum DeserializeError {
    /// The node type tag is not one of the five known node types.
    #[error("unknown node type tag [{0}]")]
    UnknownNodeType(u8),

    /// The container type tag is not run (0), bitmap (1) or array (2).
    #[error("unknown container type tag [{0}]")]
    UnknownContainerType(u8),

    /// A registry slot marker was neither null (0) nor not-null (1).
    #[error("the null marker byte [{0:#04x}] is not recognized")]
    InvalidNullMarker(u8),

    /// A leaf declared a key length other than 6 bytes.
    #[error("leaf key length must be 6 bytes, found [{0}]")]
    InvalidLeafKeyLength(u32),

    /// A node prefix is longer than any key.
    #[error("node prefix length [{0}] is longer than a key")]
    InvalidPrefixLength(u8),

    /// The declared child count does not fit the node type or its body.
    #[error("node of type [{node_type:?}] cannot hold [{count}] children")]
    InvalidChildCount {
        /// The type of the decoded node
        node_type: NodeType,
        /// The declared number of children
        count: u16,
    },

    /// The key bytes of a Node4 or Node16 are not strictly ascending.
    #[error("key bytes of a [{0:?}] are not strictly ascending")]
    UnsortedChildKeys(NodeType),

    /// A Node48 index entry reuses a child slot.
    #[error("Node48 key byte [{key_byte}] maps to invalid child slot [{index}]")]
    InvalidChildIndex {
        /// The key byte with the bad entry
        key_byte: u8,
        /// The slot the entry points to
        index: u8,
    },

    /// An array container declared more values than fit in 16 bits.
    #[error("array container cardinality [{0}] is larger than 65536")]
    InvalidCardinality(i32),

    /// The registry trailer does not point into the last bucket.
    #[error("registry trailer index [{first_level}, {second_level}] does not match the buckets")]
    InvalidLastIndex {
        /// The decoded level-1 index
        first_level: i32,
        /// The decoded level-2 index
        second_level: i32,
    },

    /// A length or counter field was negative.
    #[error("negative length [{0}] in stream")]
    NegativeLength(i64),

    /// The underlying reader failed, including running out of bytes.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors produced while encoding into a fixed-size buffer.
#[derive(Error, Debug)]
pub enum SerializeError {
    /// The destination buffer cannot hold the encoded form.
    #[error("buffer too small: need [{needed}] bytes, have [{available}]")]
    BufferTooSmall {
        /// The number of bytes the encoded form takes
        needed: u64,
        /// The number of bytes in the destination buffer
        available: usize,
    },

    /// The underlying writer failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The registry could not make room for another container.
#[derive(Error, Debug)]
pub enum CapacityError {
    /// Sizing the bucket overflowed.
    #[error("container bucket cannot grow to [{requested}] slots")]
    Overflow {
        /// The minimum capacity that was requested
        requested: usize,
    },

    /// The allocator refused to grow the bucket.
    #[error("container bucket allocation failed")]
    AllocationFailed(#[from] TryReserveError),
}
