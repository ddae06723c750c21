use crate::{LeafNode, Node};

/// Search for the leaf with the minimum key, by lexicographic ordering.
///
/// Returns `None` only if an inner node without children is reached.
pub fn minimum(root: &Node) -> Option<&LeafNode> {
    let mut current_node = root;

    loop {
        match current_node {
            Node::Leaf(leaf) => return Some(leaf),
            inner => current_node = inner.child_at(inner.min_pos()?),
        }
    }
}

/// Search for the leaf with the maximum key, by lexicographic ordering.
///
/// Returns `None` only if an inner node without children is reached.
pub fn maximum(root: &Node) -> Option<&LeafNode> {
    let mut current_node = root;

    loop {
        match current_node {
            Node::Leaf(leaf) => return Some(leaf),
            inner => current_node = inner.child_at(inner.max_pos()?),
        }
    }
}
