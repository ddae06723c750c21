//! Trie node representation

use crate::{key_to_u64, Key};
use std::{iter, ops::RangeInclusive};

mod header;
mod inner_node_256;
mod inner_node_48;
mod inner_node_compressed;

pub use header::*;
pub use inner_node_256::*;
pub use inner_node_48::*;
pub use inner_node_compressed::*;


/// The representation of inner nodes
///
/// The discriminant of each variant is the tag used in the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    /// Node that references between 2 and 4 children
    Node4 = 0,
    /// Node that references between 4 and 16 children
    Node16 = 1,
    /// Node that references between 13 and 48 children
    Node48 = 2,
    /// Node that references between 37 and 256 children
    Node256 = 3,
    /// Node that contains a single key and container index
    Leaf = 4,
}

impl NodeType {
    /// The upper bound on the number of child nodes that this
    /// NodeType can have.
    pub const fn upper_capacity(self) -> usize {
        match self {
            NodeType::Node4 => 4,
            NodeType::Node16 => 16,
            NodeType::Node48 => 48,
            NodeType::Node256 => 256,
            NodeType::Leaf => 0,
        }
    }

    /// Attempt to convert a u8 value to a [`NodeType`], returning None if there
    /// is no match.
    pub const fn from_u8(src: u8) -> Option<NodeType> {
        let node_type = match src {
            x if x == NodeType::Node4 as u8 => NodeType::Node4,
            x if x == NodeType::Node16 as u8 => NodeType::Node16,
            x if x == NodeType::Node48 as u8 => NodeType::Node48,
            x if x == NodeType::Node256 as u8 => NodeType::Node256,
            x if x == NodeType::Leaf as u8 => NodeType::Leaf,
            _ => {
                return None;
            },
        };

        Some(node_type)
    }

    /// Return true if an [`InnerNode`] with the given [`NodeType`] and
    /// specified number of children should be shrunk.
    ///
    /// A [`NodeType::Node4`] is never shrunk, it is collapsed into its last
    /// child instead.
    ///
    /// # Panics
    ///  - Panics if `node_type` equals [`NodeType::Leaf`]
    pub fn should_shrink_inner_node(self, num_children: usize) -> bool {
        match self {
            NodeType::Node4 => false,
            NodeType::Node16 => num_children <= 3,
            NodeType::Node48 => num_children <= 12,
            NodeType::Node256 => num_children <= 36,
            NodeType::Leaf => panic!("cannot shrink leaf"),
        }
    }

    /// Return the range of number of children that each node type holds in a
    /// well-formed tree.
    ///
    /// The lower bounds follow from the shrink thresholds, so they overlap
    /// with the upper bound of the next smaller node type.
    pub const fn capacity_range(self) -> RangeInclusive<usize> {
        match self {
            NodeType::Node4 => 2..=4,
            NodeType::Node16 => 4..=16,
            NodeType::Node48 => 13..=48,
            NodeType::Node256 => 37..=256,
            NodeType::Leaf => 0..=0,
        }
    }
}

/// Node that contains a single key and the index of its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafNode {
    key: Key,
    container_idx: u64,
}

impl LeafNode {
    /// Create a new leaf node for the given key and container index.
    pub fn new(key: Key, container_idx: u64) -> Self {
        LeafNode { key, container_idx }
    }

    /// Return the full key bytes of this leaf.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Return the 48-bit value of the key, in the low bits of a `u64`.
    pub fn key_u64(&self) -> u64 {
        key_to_u64(self.key)
    }

    /// Return the index of the container associated with this key.
    pub fn container_idx(&self) -> u64 {
        self.container_idx
    }
}

/// The outcome of searching an inner node for a key byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// The key byte has a child at this position.
    Found(usize),
    /// The key byte has no child. The positions of the closest children on
    /// either side are given, if they exist.
    NotFound {
        /// The position of the child with the largest key byte that is smaller
        next_smaller: Option<usize>,
        /// The position of the child with the smallest key byte that is larger
        next_larger: Option<usize>,
    },
}

pub(crate) mod private {
    /// This trait is used to seal other traits, such that they cannot be
    /// implemented outside of the crate.
    pub trait Sealed {}

    impl Sealed for super::InnerNode4 {}
    impl Sealed for super::InnerNode16 {}
    impl Sealed for super::InnerNode48 {}
    impl Sealed for super::InnerNode256 {}
}

/// Common methods implemented by all inner node.
///
/// Children are addressed by position. For [`InnerNode4`] and
/// [`InnerNode16`] a position is the slot index, for [`InnerNode48`] and
/// [`InnerNode256`] it is the key byte itself. Position arguments must refer
/// to an occupied child unless documented otherwise.
pub trait InnerNode: Sized + private::Sealed + Into<Node> {
    /// The runtime type of the node.
    const TYPE: NodeType;

    /// The type of the next larger node type.
    type GrownNode: InnerNode;

    /// The type of the next smaller node type.
    type ShrunkNode: InnerNode;

    /// Create an empty `InnerNode`, with no children and no prefix
    fn empty() -> Self {
        Self::from_header(Header::empty())
    }

    /// Create a new `InnerNode` using a `Header`
    fn from_header(header: Header) -> Self;

    /// Access the header information for this node.
    fn header(&self) -> &Header;

    /// Access the header information for this node.
    fn header_mut(&mut self) -> &mut Header;

    /// Return the position of the child for the given key fragment, if
    /// present.
    fn get_child_pos(&self, key_fragment: u8) -> Option<usize>;

    /// Search for the child with the given key fragment, returning the
    /// closest neighbours when it is absent.
    fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult;

    /// Return the key fragment of the child at `pos`.
    fn child_key(&self, pos: usize) -> u8;

    /// Return the child at `pos`.
    fn child_at(&self, pos: usize) -> &Node;

    /// Return the child at `pos`.
    fn child_at_mut(&mut self, pos: usize) -> &mut Node;

    /// Search through this node for a child node that corresponds to the given
    /// key fragment.
    fn lookup_child(&self, key_fragment: u8) -> Option<&Node> {
        self.get_child_pos(key_fragment)
            .map(|pos| self.child_at(pos))
    }

    /// Write a child node with key fragment to this inner node.
    ///
    /// If the key fragment already exists in the node, overwrite the existing
    /// child.
    ///
    /// # Panics
    ///
    /// Panics when the node is full.
    fn write_child(&mut self, key_fragment: u8, child: Node);

    /// Remove the child at `pos` and return it.
    fn remove_child_at(&mut self, pos: usize) -> Node;

    /// Return the position of the child after `pos` in ascending key order.
    ///
    /// `None` as input means "before the first child".
    fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize>;

    /// Return the position of the child before `pos` in ascending key order.
    ///
    /// `None` as input means "after the last child".
    fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize>;

    /// Return the position of the child with the smallest key fragment.
    fn min_pos(&self) -> Option<usize> {
        self.next_larger_pos(None)
    }

    /// Return the position of the child with the largest key fragment.
    fn max_pos(&self) -> Option<usize> {
        self.next_smaller_pos(None)
    }

    /// Grow this node into the next larger class, moving over children and
    /// prefix information.
    ///
    /// This node is left without children.
    fn grow(&mut self) -> Self::GrownNode;

    /// Shrink this node into the next smaller class, moving over children and
    /// prefix information.
    ///
    /// This node is left without children.
    ///
    /// # Panics
    ///
    /// Panics if the new, smaller node size does not have enough capacity to
    /// hold all the children.
    fn shrink(&mut self) -> Self::ShrunkNode;

    /// Returns true if this node has no more space to store children.
    fn is_full(&self) -> bool {
        self.header().num_children() >= Self::TYPE.upper_capacity()
    }

    /// Iterate over `(key fragment, child)` pairs in ascending key order.
    fn iter(&self) -> impl Iterator<Item = (u8, &Node)> {
        iter::successors(self.min_pos(), |pos| self.next_larger_pos(Some(*pos)))
            .map(|pos| (self.child_key(pos), self.child_at(pos)))
    }
}

/// A node in the tree, either one of the four inner node types or a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Node that references between 2 and 4 children
    Node4(Box<InnerNode4>),
    /// Node that references between 4 and 16 children
    Node16(Box<InnerNode16>),
    /// Node that references between 13 and 48 children
    Node48(Box<InnerNode48>),
    /// Node that references between 37 and 256 children
    Node256(Box<InnerNode256>),
    /// Node that contains a single key and container index
    Leaf(LeafNode),
}

/// Run `$body` against the concrete inner node, panicking on a leaf.
macro_rules! dispatch_inner {
    ($node:expr, $inner:ident => $body:expr) => {
        match $node {
            Node::Node4($inner) => $body,
            Node::Node16($inner) => $body,
            Node::Node48($inner) => $body,
            Node::Node256($inner) => $body,
            Node::Leaf(_) => panic!("leaf nodes have no children"),
        }
    };
}

macro_rules! node_from_inner {
    ($($variant:ident => $inner:ty),*) => {
        $(
            impl From<$inner> for Node {
                fn from(inner: $inner) -> Self {
                    Node::$variant(Box::new(inner))
                }
            }
        )*
    };
}

node_from_inner!(
    Node4 => InnerNode4,
    Node16 => InnerNode16,
    Node48 => InnerNode48,
    Node256 => InnerNode256
);

impl From<LeafNode> for Node {
    fn from(leaf: LeafNode) -> Self {
        Node::Leaf(leaf)
    }
}

impl Node {
    /// Retrieve the runtime node type information.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Node4(_) => NodeType::Node4,
            Node::Node16(_) => NodeType::Node16,
            Node::Node48(_) => NodeType::Node48,
            Node::Node256(_) => NodeType::Node256,
            Node::Leaf(_) => NodeType::Leaf,
        }
    }

    /// Return true if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Return the leaf, if this node is one.
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Return the header of an inner node, or `None` for a leaf.
    pub fn header(&self) -> Option<&Header> {
        match self {
            Node::Node4(inner) => Some(inner.header()),
            Node::Node16(inner) => Some(inner.header()),
            Node::Node48(inner) => Some(inner.header()),
            Node::Node256(inner) => Some(inner.header()),
            Node::Leaf(_) => None,
        }
    }

    /// Return the header of an inner node, or `None` for a leaf.
    pub fn header_mut(&mut self) -> Option<&mut Header> {
        match self {
            Node::Node4(inner) => Some(inner.header_mut()),
            Node::Node16(inner) => Some(inner.header_mut()),
            Node::Node48(inner) => Some(inner.header_mut()),
            Node::Node256(inner) => Some(inner.header_mut()),
            Node::Leaf(_) => None,
        }
    }

    /// Return the key prefix of an inner node, empty for a leaf.
    pub fn prefix(&self) -> &[u8] {
        match self.header() {
            Some(header) => header.read_prefix(),
            None => &[],
        }
    }

    /// Return the number of children, zero for a leaf.
    pub fn num_children(&self) -> usize {
        self.header().map_or(0, Header::num_children)
    }

    /// See [`InnerNode::get_child_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn get_child_pos(&self, key_fragment: u8) -> Option<usize> {
        dispatch_inner!(self, inner => inner.get_child_pos(key_fragment))
    }

    /// See [`InnerNode::get_nearest_child_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult {
        dispatch_inner!(self, inner => inner.get_nearest_child_pos(key_fragment))
    }

    /// See [`InnerNode::child_key`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn child_key(&self, pos: usize) -> u8 {
        dispatch_inner!(self, inner => inner.child_key(pos))
    }

    /// See [`InnerNode::child_at`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn child_at(&self, pos: usize) -> &Node {
        dispatch_inner!(self, inner => inner.child_at(pos))
    }

    /// See [`InnerNode::child_at_mut`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn child_at_mut(&mut self, pos: usize) -> &mut Node {
        dispatch_inner!(self, inner => inner.child_at_mut(pos))
    }

    /// See [`InnerNode::lookup_child`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn lookup_child(&self, key_fragment: u8) -> Option<&Node> {
        dispatch_inner!(self, inner => inner.lookup_child(key_fragment))
    }

    /// See [`InnerNode::min_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn min_pos(&self) -> Option<usize> {
        dispatch_inner!(self, inner => inner.min_pos())
    }

    /// See [`InnerNode::max_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn max_pos(&self) -> Option<usize> {
        dispatch_inner!(self, inner => inner.max_pos())
    }

    /// See [`InnerNode::next_larger_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        dispatch_inner!(self, inner => inner.next_larger_pos(pos))
    }

    /// See [`InnerNode::next_smaller_pos`].
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        dispatch_inner!(self, inner => inner.next_smaller_pos(pos))
    }

    /// Iterate over `(key fragment, child)` pairs in ascending key order.
    ///
    /// A leaf has no children, so the iterator is empty.
    pub fn children(&self) -> Children<'_> {
        let next = if self.is_leaf() {
            None
        } else {
            self.min_pos()
        };

        Children { node: self, next }
    }

    /// Add a child for a key fragment that is not yet present, growing this
    /// node into the next larger class first if it is full.
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub(crate) fn insert_child(&mut self, key_fragment: u8, child: Node) {
        let is_full = dispatch_inner!(&*self, inner => inner.is_full());
        if is_full {
            self.grow();
        }

        dispatch_inner!(self, inner => inner.write_child(key_fragment, child))
    }

    /// Remove the child at `pos` without adjusting the node class.
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub(crate) fn remove_child_at(&mut self, pos: usize) -> Node {
        dispatch_inner!(self, inner => inner.remove_child_at(pos))
    }

    /// Replace this node with the next larger node class.
    ///
    /// # Panics
    ///  - Panics if this node is a leaf or a [`NodeType::Node256`].
    pub(crate) fn grow(&mut self) {
        let grown: Node = match self {
            Node::Node4(inner) => inner.grow().into(),
            Node::Node16(inner) => inner.grow().into(),
            Node::Node48(inner) => inner.grow().into(),
            Node::Node256(_) => panic!("unable to grow a Node256, something went wrong!"),
            Node::Leaf(_) => panic!("leaf nodes have no children"),
        };

        tracing::trace!(
            from = ?self.node_type(),
            to = ?grown.node_type(),
            num_children = grown.num_children(),
            "grew inner node"
        );
        *self = grown;
    }

    /// Replace this node with a smaller representation if a removal took it
    /// below its shrink threshold.
    ///
    /// A [`NodeType::Node4`] left with a single child is collapsed into that
    /// child, which takes over this node's prefix and the edge byte in front
    /// of its own prefix. Returns true in that case.
    ///
    /// # Panics
    ///  - Panics if this node is a leaf.
    pub(crate) fn shrink_after_remove(&mut self) -> bool {
        let node_type = self.node_type();
        let num_children = self.num_children();

        let fresh: Node = match self {
            Node::Node4(inner) if num_children == 1 => inner.collapse(),
            Node::Node16(inner) if node_type.should_shrink_inner_node(num_children) => {
                inner.shrink().into()
            },
            Node::Node48(inner) if node_type.should_shrink_inner_node(num_children) => {
                inner.shrink().into()
            },
            Node::Node256(inner) if node_type.should_shrink_inner_node(num_children) => {
                inner.shrink().into()
            },
            Node::Leaf(_) => panic!("leaf nodes have no children"),
            _ => return false,
        };

        let collapsed = node_type == NodeType::Node4;
        if collapsed {
            tracing::trace!(into = ?fresh.node_type(), "collapsed Node4 into its last child");
        } else {
            tracing::trace!(
                from = ?node_type,
                to = ?fresh.node_type(),
                num_children,
                "shrank inner node"
            );
        }
        *self = fresh;

        collapsed
    }
}

/// An iterator over the children of a [`Node`], in ascending key order.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    node: &'a Node,
    next: Option<usize>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (u8, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.next?;
        self.next = self.node.next_larger_pos(Some(pos));
        Some((self.node.child_key(pos), self.node.child_at(pos)))
    }
}
