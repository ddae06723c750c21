//! Ordered traversal of the tree with an explicit stack.

use crate::{common_prefix_len, remove, Key, LeafNode, Node, ParentChange, SearchResult, KEY_LEN};
use std::{fmt, marker::PhantomData};

mod direction;

pub use direction::*;

#[cfg(test)]
mod tests;

/// The most frames a shuttle can hold: one per key byte plus the leaf.
pub const MAX_SHUTTLE_DEPTH: usize = KEY_LEN + 1;

/// The traversal state of one node on the path from the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Frame {
    /// The child currently being visited.
    position: Option<usize>,
    /// Set once the first child has been chosen.
    visited: bool,
    /// `position` already points at the child to visit next.
    start_from_next_sibling: bool,
    /// For a leaf, the key byte of the sibling that follows it in scan order.
    next_sibling_key: Option<u8>,
}

/// A resumable cursor over the leaves of a tree, in the order given by `D`.
///
/// Frames do not hold references into the tree. Each frame's node is found
/// again from the root through the positions of the frames above it, so the
/// shuttle can be kept next to the tree while the tree is mutated through
/// [`Shuttle::remove`]. Any other mutation of the tree invalidates the
/// shuttle.
///
/// The first call to [`move_to_next_leaf`](Shuttle::move_to_next_leaf) after
/// [`init`](Shuttle::init) or [`init_from`](Shuttle::init_from) reports the
/// leaf the shuttle landed on, every later call advances.
pub struct Shuttle<D: Direction> {
    frames: [Frame; MAX_SHUTTLE_DEPTH],
    len: usize,
    has_run: bool,
    pending_resume: bool,
    _direction: PhantomData<D>,
}

impl<D: Direction> fmt::Debug for Shuttle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shuttle")
            .field("frames", &&self.frames[..self.len])
            .field("has_run", &self.has_run)
            .field("pending_resume", &self.pending_resume)
            .finish()
    }
}

impl<D: Direction> Clone for Shuttle<D> {
    fn clone(&self) -> Self {
        Shuttle {
            frames: self.frames,
            len: self.len,
            has_run: self.has_run,
            pending_resume: self.pending_resume,
            _direction: PhantomData,
        }
    }
}

impl<D: Direction> Default for Shuttle<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Direction> Shuttle<D> {
    /// Create a shuttle that is not positioned on any leaf.
    pub fn new() -> Self {
        Shuttle {
            frames: [Frame::default(); MAX_SHUTTLE_DEPTH],
            len: 0,
            has_run: false,
            pending_resume: false,
            _direction: PhantomData,
        }
    }

    fn reset(&mut self) {
        self.len = 0;
        self.has_run = false;
        self.pending_resume = false;
    }

    fn push(&mut self) {
        assert!(
            self.len < MAX_SHUTTLE_DEPTH,
            "tree is deeper than [{MAX_SHUTTLE_DEPTH}] levels"
        );
        self.frames[self.len] = Frame::default();
        self.len += 1;
    }

    /// Resolve the node of the frame at `depth`.
    fn node_at<'a>(&self, root: &'a Node, depth: usize) -> Option<&'a Node> {
        let mut node = root;
        for frame in &self.frames[..depth] {
            node = node.child_at(frame.position?);
        }
        Some(node)
    }

    fn top_node<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        self.node_at(root, self.len.checked_sub(1)?)
    }

    /// Record which sibling follows the leaf on top of the stack, so the scan
    /// can pick up there if the leaf is removed.
    fn cache_next_sibling(&mut self, root: &Node) {
        let Some(parent_depth) = self.len.checked_sub(2) else {
            return;
        };

        let next_sibling_key = self.node_at(root, parent_depth).and_then(|parent| {
            let pos = D::next_position(parent, self.frames[parent_depth].position?)?;
            Some(parent.child_key(pos))
        });
        self.frames[parent_depth + 1].next_sibling_key = next_sibling_key;
    }

    /// Push frames from the node on top of the stack down to a leaf, always
    /// taking the boundary child.
    fn descend_to_boundary(&mut self, root: &Node, in_run_direction: bool) {
        while let Some(node) = self.top_node(root) {
            if node.is_leaf() {
                self.cache_next_sibling(root);
                return;
            }

            let Some(pos) = D::boundary_position(node, in_run_direction) else {
                return;
            };
            let top = self.len - 1;
            self.frames[top].position = Some(pos);
            self.frames[top].visited = true;
            self.push();
        }
    }

    /// Position the shuttle on the first leaf in scan order.
    pub fn init(&mut self, root: Option<&Node>) {
        self.reset();
        let Some(root) = root else {
            return;
        };

        self.push();
        self.descend_to_boundary(root, false);
    }

    /// Position the shuttle on the leaf with `key`, or on the first leaf
    /// after `key` in scan order if there is none.
    pub fn init_from(&mut self, root: Option<&Node>, key: &Key) {
        self.reset();
        let Some(root) = root else {
            return;
        };

        self.push();
        self.seek_down(root, key);

        let landed_before = self
            .current_leaf(Some(root))
            .is_some_and(|leaf| D::current_before(&leaf.key(), key));
        if landed_before {
            self.has_run = true;
            self.move_to_next_leaf(Some(root));
            self.has_run = false;
        }
    }

    fn seek_down(&mut self, root: &Node, key: &Key) {
        let mut depth = 0;

        while let Some(node) = self.top_node(root) {
            if node.is_leaf() {
                self.cache_next_sibling(root);
                return;
            }

            let prefix = node.prefix();
            let matched = common_prefix_len(prefix, &key[depth..]);
            if matched < prefix.len() {
                let in_run_direction = match key.get(depth + matched) {
                    Some(target_byte) => {
                        D::prefix_mismatch_is_in_run_direction(prefix[matched], *target_byte)
                    },
                    None => false,
                };
                self.descend_to_boundary(root, in_run_direction);
                return;
            }
            depth += prefix.len();

            let Some(&key_byte) = key.get(depth) else {
                self.descend_to_boundary(root, false);
                return;
            };
            let (pos, boundary_descent) = match node.get_nearest_child_pos(key_byte) {
                SearchResult::Found(pos) => (pos, None),
                miss => match D::search_miss_next_position(miss) {
                    Some(pos) => (pos, Some(false)),
                    // Everything below this node is behind the target
                    None => match D::boundary_position(node, true) {
                        Some(pos) => (pos, Some(true)),
                        None => return,
                    },
                },
            };

            let top = self.len - 1;
            self.frames[top].position = Some(pos);
            self.frames[top].visited = true;
            self.push();
            depth += 1;

            if let Some(in_run_direction) = boundary_descent {
                self.descend_to_boundary(root, in_run_direction);
                return;
            }
        }
    }

    /// Return the leaf the shuttle is positioned on.
    ///
    /// After [`remove`](Shuttle::remove) there is no current leaf until the
    /// shuttle is moved again.
    pub fn current_leaf(&self, root: Option<&Node>) -> Option<LeafNode> {
        if self.pending_resume {
            return None;
        }

        self.top_node(root?)?.as_leaf().copied()
    }

    /// Move to the next leaf in scan order, returning false once the scan is
    /// exhausted.
    pub fn move_to_next_leaf(&mut self, root: Option<&Node>) -> bool {
        let Some(root) = root else {
            self.len = 0;
            return false;
        };
        if self.len == 0 {
            return false;
        }

        if !self.has_run {
            self.has_run = true;
            return self.current_leaf(Some(root)).is_some();
        }

        if self.pending_resume {
            self.pending_resume = false;
        } else if self.top_node(root).is_some_and(Node::is_leaf) {
            self.len -= 1;
        }

        while let Some(node) = self.top_node(root) {
            if node.is_leaf() {
                self.cache_next_sibling(root);
                return true;
            }

            let frame = &mut self.frames[self.len - 1];
            let next_pos = if !frame.visited {
                frame.visited = true;
                D::boundary_position(node, false)
            } else if frame.start_from_next_sibling {
                frame.start_from_next_sibling = false;
                frame.position
            } else {
                frame.position.and_then(|pos| D::next_position(node, pos))
            };

            match next_pos {
                Some(pos) => {
                    frame.position = Some(pos);
                    self.push();
                },
                None => self.len -= 1,
            }
        }

        self.len = 0;
        false
    }

    /// Remove the current leaf from the tree and return it.
    ///
    /// The shuttle is re-seated so that the next call to
    /// [`move_to_next_leaf`](Shuttle::move_to_next_leaf) continues with the
    /// leaf that would have followed the removed one.
    pub fn remove(&mut self, root: &mut Option<Node>) -> Option<LeafNode> {
        let leaf = self.current_leaf(root.as_ref())?;
        let top = self.len - 1;
        let next_sibling_key = self.frames[top].next_sibling_key;

        let removed = remove(root, &leaf.key())?;
        self.has_run = true;
        self.pending_resume = true;

        match removed.parent {
            ParentChange::Root => self.len = 0,
            ParentChange::Kept => {
                let parent_depth = top - 1;
                self.len = top;

                // The parent may have shrunk, so positions are found again by
                // key byte.
                let position = root
                    .as_ref()
                    .and_then(|root| self.node_at(root, parent_depth))
                    .zip(next_sibling_key)
                    .and_then(|(parent, key_byte)| parent.get_child_pos(key_byte));
                let frame = &mut self.frames[parent_depth];
                frame.position = position;
                frame.start_from_next_sibling = true;
            },
            ParentChange::Collapsed => {
                // The parent slot now holds the only sibling of the leaf.
                let parent_depth = top - 1;
                if next_sibling_key.is_some() {
                    self.frames[parent_depth] = Frame::default();
                    self.len = parent_depth + 1;
                } else {
                    self.len = parent_depth;
                }
            },
        }

        tracing::trace!(key = ?leaf.key(), parent = ?removed.parent, "removed leaf under shuttle");
        Some(leaf)
    }
}
