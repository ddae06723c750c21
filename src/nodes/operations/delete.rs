use crate::{Key, LeafNode, Node};

/// What happened to the parent of a removed leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentChange {
    /// The removed leaf was the root, the tree is now empty.
    Root,
    /// The parent is still an inner node, possibly of a smaller class.
    Kept,
    /// The parent was a [`InnerNode4`](crate::InnerNode4) left with one
    /// child, and was replaced by that child.
    Collapsed,
}

/// The result of a successful removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed {
    /// The leaf that was removed from the tree.
    pub leaf: LeafNode,
    /// The effect the removal had on the leaf's parent.
    pub parent: ParentChange,
}

enum Step {
    RemoveLeaf(LeafNode),
    Descend,
    Miss,
}

/// Remove the leaf with the given key from the tree.
///
/// The parent of the leaf is shrunk or collapsed in place when it falls
/// below its minimum size, so the link from the grandparent (or the root
/// slot) always points at the fresh parent.
pub fn remove(root: &mut Option<Node>, key: &Key) -> Option<Removed> {
    let mut current_node = root.as_mut()?;

    if let Some(leaf) = current_node.as_leaf().copied() {
        if leaf.key() != *key {
            return None;
        }

        *root = None;
        return Some(Removed {
            leaf,
            parent: ParentChange::Root,
        });
    }

    let mut depth = 0;
    loop {
        let prefix = current_node.prefix();
        if !key[depth..].starts_with(prefix) {
            return None;
        }
        depth += prefix.len();

        let pos = current_node.get_child_pos(*key.get(depth)?)?;
        let step = match current_node.child_at(pos) {
            Node::Leaf(leaf) if leaf.key() == *key => Step::RemoveLeaf(*leaf),
            Node::Leaf(_) => Step::Miss,
            _ => Step::Descend,
        };

        match step {
            Step::RemoveLeaf(leaf) => {
                current_node.remove_child_at(pos);
                let parent = if current_node.shrink_after_remove() {
                    ParentChange::Collapsed
                } else {
                    ParentChange::Kept
                };

                return Some(Removed { leaf, parent });
            },
            Step::Miss => return None,
            Step::Descend => {
                current_node = current_node.child_at_mut(pos);
                depth += 1;
            },
        }
    }
}

#[cfg(test)]
mod tests;
