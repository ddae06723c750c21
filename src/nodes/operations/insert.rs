use crate::{common_prefix_len, Header, InnerNode, InnerNode4, Key, LeafNode, Node};
use std::mem;

/// Where the new leaf ended up, relative to the existing tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The tree was empty and the leaf became the root.
    NewRoot,
    /// The leaf was added as a new child of an existing inner node.
    AddedChild,
    /// A new [`InnerNode4`] was created to separate the leaf from an existing
    /// leaf or from an inner node whose prefix did not match.
    Split,
    /// A leaf with the same key existed, and its container index was
    /// replaced. The previous container index is returned.
    Overwrote(u64),
}

/// Insert a leaf for `key` into the tree rooted at `root`.
///
/// The root slot is updated in place when the root changes. If `key` is
/// already present, the existing leaf is overwritten.
pub fn insert(root: &mut Option<Node>, key: Key, container_idx: u64) -> InsertOutcome {
    let new_leaf = LeafNode::new(key, container_idx);

    let Some(mut current_node) = root.as_mut() else {
        *root = Some(Node::Leaf(new_leaf));
        return InsertOutcome::NewRoot;
    };
    let mut depth = 0;

    loop {
        if let Some(existing) = current_node.as_leaf().copied() {
            if existing.key() == key {
                *current_node = Node::Leaf(new_leaf);
                return InsertOutcome::Overwrote(existing.container_idx());
            }

            // Both keys agree on everything before `depth`, and differ
            // somewhere after it.
            let existing_key = existing.key();
            let matched = common_prefix_len(&existing_key[depth..], &key[depth..]);
            let split_depth = depth + matched;

            let mut new_node = InnerNode4::from_header(Header::new(&key[depth..split_depth]));
            new_node.write_child(existing_key[split_depth], Node::Leaf(existing));
            new_node.write_child(key[split_depth], Node::Leaf(new_leaf));
            *current_node = new_node.into();

            return InsertOutcome::Split;
        }

        let prefix = current_node.prefix();
        let prefix_len = prefix.len();
        let matched = common_prefix_len(prefix, &key[depth..]);

        if matched < prefix_len {
            let old_edge = prefix[matched];
            let mut new_node = InnerNode4::from_header(Header::new(&key[depth..depth + matched]));

            // The new leaf temporarily holds the slot while the old node is
            // moved under the new parent.
            let mut old_node = mem::replace(current_node, Node::Leaf(new_leaf));
            if let Some(header) = old_node.header_mut() {
                header.ltrim_by(matched + 1);
            }

            new_node.write_child(old_edge, old_node);
            new_node.write_child(key[depth + matched], Node::Leaf(new_leaf));
            *current_node = new_node.into();

            return InsertOutcome::Split;
        }

        depth += prefix_len;
        let key_fragment = key[depth];
        match current_node.get_child_pos(key_fragment) {
            Some(pos) => {
                current_node = current_node.child_at_mut(pos);
                depth += 1;
            },
            None => {
                current_node.insert_child(key_fragment, Node::Leaf(new_leaf));
                return InsertOutcome::AddedChild;
            },
        }
    }
}
