use crate::{Key, LeafNode, Node};

/// Search in the given tree for the leaf stored with the given key.
///
/// A mismatch in any inner node prefix, or a missing child byte, ends the
/// search early. Reaching a leaf still requires its full key to match.
pub fn search<'a>(root: &'a Node, key: &Key) -> Option<&'a LeafNode> {
    let mut current_node = root;
    let mut depth = 0;

    loop {
        if let Node::Leaf(leaf) = current_node {
            return (leaf.key() == *key).then_some(leaf);
        }

        let prefix = current_node.prefix();
        if !key[depth..].starts_with(prefix) {
            return None;
        }
        depth += prefix.len();

        current_node = current_node.lookup_child(*key.get(depth)?)?;
        depth += 1;
    }
}

#[cfg(test)]
mod tests;
