use crate::{
    visitor::{Visitable, Visitor},
    Art, InnerNode, InnerNode16, InnerNode256, InnerNode4, InnerNode48, Key, LeafNode, NodeType,
    KEY_LEN,
};
use std::fmt;
use thiserror::Error;

/// A portion of an entire key that identifies a node in the tree: the inner
/// node prefixes and edge bytes on the path from the root.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct KeyPrefix(Box<[u8]>);

impl fmt::Debug for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl From<&[u8]> for KeyPrefix {
    fn from(src: &[u8]) -> Self {
        KeyPrefix(Box::from(src))
    }
}

impl<const LEN: usize> PartialEq<[u8; LEN]> for KeyPrefix {
    fn eq(&self, other: &[u8; LEN]) -> bool {
        self.0.as_ref() == other.as_slice()
    }
}

/// An issue with the well-formed-ness of the tree. See the documentation on
/// [`WellFormedChecker`] for more context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedTreeError {
    /// An inner node had an incorrect number of children
    #[error(
        "Found an inner node of type [{inner_node_type:?}] at location [{key_prefix:?}] that had \
         the wrong number of children! Expected children in range [{:?}], but found \
         [{num_children}] children",
        .inner_node_type.capacity_range()
    )]
    WrongChildrenCount {
        /// The key prefix identifying the inner node
        key_prefix: KeyPrefix,
        /// The type of the inner node (InnerNode4, InnerNode16, etc)
        ///
        /// This field is guaranteed not to be [`NodeType::Leaf`]
        inner_node_type: NodeType,
        /// The number of children found at the inner node
        num_children: usize,
    },
    /// The child count in the header of an inner node does not match the
    /// number of children it holds
    #[error(
        "Inner node at [{key_prefix:?}] records [{recorded}] children in its header, but holds \
         [{actual}]"
    )]
    HeaderCountMismatch {
        /// The key prefix identifying the inner node
        key_prefix: KeyPrefix,
        /// The count stored in the header
        recorded: usize,
        /// The number of children reached by iteration
        actual: usize,
    },
    /// The key bytes of an inner node were not strictly ascending
    #[error("Inner node at [{key_prefix:?}] has child key bytes out of order")]
    UnorderedChildren {
        /// The key prefix identifying the inner node
        key_prefix: KeyPrefix,
    },
    /// The occupancy bitmap of an [`InnerNode256`] does not match its
    /// children
    #[error("Node256 at [{key_prefix:?}] has [{bits_set}] bits set for [{num_children}] children")]
    BitmapMismatch {
        /// The key prefix identifying the inner node
        key_prefix: KeyPrefix,
        /// The number of set bits in the bitmap
        bits_set: u32,
        /// The number of children reached by iteration
        num_children: usize,
    },
    /// The path to a node is at least as long as a key, so it cannot branch
    #[error("Inner node at [{key_prefix:?}] sits at or below the full key length")]
    TooDeep {
        /// The key prefix identifying the inner node
        key_prefix: KeyPrefix,
    },
    /// The expected key prefix did not match the actual prefix that was present
    /// in the leaf
    #[error(
        "Found a leaf that had a mismatched key from the expected prefix! Expected the leaf key \
         to start with [{expected_prefix:?}], but the leaf key was [{entire_key:?}]"
    )]
    PrefixMismatch {
        /// The expected key prefix
        expected_prefix: KeyPrefix,
        /// The entire key
        entire_key: Key,
    },
    /// The tree holds more leaves than keys were ever inserted
    #[error("The tree holds [{num_leaves}] leaves but only counts [{key_size}] keys")]
    LeafCountExceedsKeySize {
        /// The number of leaves found
        num_leaves: usize,
        /// The key counter of the tree
        key_size: u64,
    },
}

/// A visitor of the radix tree which checks that the tree is well-formed.
///
/// In this context, well-formed means that in the tree:
///  1. every inner node has a number of children that is in range for the
///     inner node type, matching the count in its header. For example,
///     InnerNode16 has between 4 and 16 children.
///  2. children are ordered by ascending key byte, and the bitmap of every
///     InnerNode256 mirrors its children
///  3. the elements of the key (as part of inner node prefixes and child
///     edges) combine to match the leaf node key prefix
///  4. the tree does not hold more leaves than its key counter
///
/// This checker will only return a single issue at a time. A tree is only
/// "well-formed" (by the definition given above) if the checker returns
/// `Ok(_)`.
#[derive(Debug)]
pub struct WellFormedChecker {
    current_key_prefix: Vec<u8>,
    num_leaves: usize,
}

impl WellFormedChecker {
    /// Traverse the given tree and check that it is well-formed. Returns the
    /// number of nodes in the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the given tree is not well-formed.
    pub fn check(tree: &Art) -> Result<usize, MalformedTreeError> {
        let Some(root) = tree.root() else {
            return Ok(0);
        };

        let mut visitor = WellFormedChecker {
            current_key_prefix: Vec::with_capacity(KEY_LEN),
            num_leaves: 0,
        };
        let num_nodes = root.visit_with(&mut visitor)?;

        if visitor.num_leaves as u64 > tree.key_size() {
            return Err(MalformedTreeError::LeafCountExceedsKeySize {
                num_leaves: visitor.num_leaves,
                key_size: tree.key_size(),
            });
        }

        Ok(num_nodes)
    }

    fn key_prefix(&self) -> KeyPrefix {
        self.current_key_prefix.as_slice().into()
    }

    fn visit_inner_node<N: InnerNode>(&mut self, inner_node: &N) -> Result<usize, MalformedTreeError> {
        let original_key_prefix_len = self.current_key_prefix.len();

        // update running key prefix with inner node prefix
        self.current_key_prefix
            .extend_from_slice(inner_node.header().read_prefix());
        if self.current_key_prefix.len() >= KEY_LEN {
            self.current_key_prefix.truncate(original_key_prefix_len);
            return Err(MalformedTreeError::TooDeep {
                key_prefix: self.key_prefix(),
            });
        }

        let mut running_node_count = 0;
        let mut num_children: usize = 0;
        let mut previous_key_byte = None;
        for (key_byte, child) in inner_node.iter() {
            if previous_key_byte.is_some_and(|previous| previous >= key_byte) {
                self.current_key_prefix.truncate(original_key_prefix_len);
                return Err(MalformedTreeError::UnorderedChildren {
                    key_prefix: self.key_prefix(),
                });
            }
            previous_key_byte = Some(key_byte);

            // update running key prefix with child key fragment
            self.current_key_prefix.push(key_byte);
            running_node_count += child.visit_with(self)?;
            self.current_key_prefix.pop();

            num_children += 1;
        }

        // remove inner node prefix
        self.current_key_prefix.truncate(original_key_prefix_len);

        if !(N::TYPE.capacity_range().contains(&num_children)) {
            return Err(MalformedTreeError::WrongChildrenCount {
                key_prefix: self.key_prefix(),
                inner_node_type: N::TYPE,
                num_children,
            });
        }

        let recorded = inner_node.header().num_children();
        if recorded != num_children {
            return Err(MalformedTreeError::HeaderCountMismatch {
                key_prefix: self.key_prefix(),
                recorded,
                actual: num_children,
            });
        }

        Ok(running_node_count + 1)
    }
}

impl Visitor for WellFormedChecker {
    type Output = Result<usize, MalformedTreeError>;

    fn default_output(&self) -> Self::Output {
        // Zero, so that any places that call `default_output` don't influence the
        // overall count
        Ok(0)
    }

    fn combine_output(&self, o1: Self::Output, o2: Self::Output) -> Self::Output {
        Ok(o1? + o2?)
    }

    fn visit_node4(&mut self, t: &InnerNode4) -> Self::Output {
        self.visit_inner_node(t)
    }

    fn visit_node16(&mut self, t: &InnerNode16) -> Self::Output {
        self.visit_inner_node(t)
    }

    fn visit_node48(&mut self, t: &InnerNode48) -> Self::Output {
        self.visit_inner_node(t)
    }

    fn visit_node256(&mut self, t: &InnerNode256) -> Self::Output {
        let num_nodes = self.visit_inner_node(t)?;

        let bits_set: u32 = t.bitmap().iter().map(|word| word.count_ones()).sum();
        let num_children = t.iter().count();
        if bits_set as usize != num_children {
            return Err(MalformedTreeError::BitmapMismatch {
                key_prefix: self.key_prefix(),
                bits_set,
                num_children,
            });
        }

        Ok(num_nodes)
    }

    fn visit_leaf(&mut self, t: &LeafNode) -> Self::Output {
        if !t.key().starts_with(&self.current_key_prefix) {
            return Err(MalformedTreeError::PrefixMismatch {
                expected_prefix: self.key_prefix(),
                entire_key: t.key(),
            });
        }

        self.num_leaves += 1;
        Ok(1)
    }
}
