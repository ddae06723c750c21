use crate::{Key, Node, SearchResult};

/// The scan order of a [`Shuttle`](crate::Shuttle).
///
/// The shuttle algorithm is shared by both directions, the hooks below pick
/// which side of a node is visited first and which way a seek continues.
pub trait Direction: private::Sealed {
    /// The child to descend into first.
    ///
    /// `in_run_direction` is set after a seek found that the whole subtree is
    /// already behind the target, in which case the last child in scan order
    /// is chosen so the shuttle lands next to the target.
    fn boundary_position(node: &Node, in_run_direction: bool) -> Option<usize>;

    /// The child after `pos` in scan order.
    fn next_position(node: &Node, pos: usize) -> Option<usize>;

    /// Return true if a subtree whose prefix holds `node_byte` where the seek
    /// target holds `target_byte` lies entirely behind the target.
    fn prefix_mismatch_is_in_run_direction(node_byte: u8, target_byte: u8) -> bool;

    /// The neighbouring child a seek continues into when the target byte has
    /// no child.
    fn search_miss_next_position(result: SearchResult) -> Option<usize>;

    /// Return true if `current` comes before `target` in scan order.
    fn current_before(current: &Key, target: &Key) -> bool;
}

/// Ascending key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forward;

/// Descending key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backward;

mod private {
    pub trait Sealed {}

    impl Sealed for super::Forward {}
    impl Sealed for super::Backward {}
}

impl Direction for Forward {
    fn boundary_position(node: &Node, in_run_direction: bool) -> Option<usize> {
        if in_run_direction {
            node.max_pos()
        } else {
            node.min_pos()
        }
    }

    fn next_position(node: &Node, pos: usize) -> Option<usize> {
        node.next_larger_pos(Some(pos))
    }

    fn prefix_mismatch_is_in_run_direction(node_byte: u8, target_byte: u8) -> bool {
        node_byte < target_byte
    }

    fn search_miss_next_position(result: SearchResult) -> Option<usize> {
        match result {
            SearchResult::Found(pos) => Some(pos),
            SearchResult::NotFound { next_larger, .. } => next_larger,
        }
    }

    fn current_before(current: &Key, target: &Key) -> bool {
        current < target
    }
}

impl Direction for Backward {
    fn boundary_position(node: &Node, in_run_direction: bool) -> Option<usize> {
        if in_run_direction {
            node.min_pos()
        } else {
            node.max_pos()
        }
    }

    fn next_position(node: &Node, pos: usize) -> Option<usize> {
        node.next_smaller_pos(Some(pos))
    }

    fn prefix_mismatch_is_in_run_direction(node_byte: u8, target_byte: u8) -> bool {
        node_byte > target_byte
    }

    fn search_miss_next_position(result: SearchResult) -> Option<usize> {
        match result {
            SearchResult::Found(pos) => Some(pos),
            SearchResult::NotFound { next_smaller, .. } => next_smaller,
        }
    }

    fn current_before(current: &Key, target: &Key) -> bool {
        current > target
    }
}
