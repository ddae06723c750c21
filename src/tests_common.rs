//! Key generators shared by unit tests, integration tests and doc examples.

use crate::{insert, u64_to_key, Key, Node, KEY_LEN};
use std::iter;

/// Generate a key for every combination of `value_stops + 1` evenly spaced
/// byte values at each position, in ascending order.
///
/// Produces `(value_stops + 1) ^ 6` keys that fill every level of the tree.
pub fn generate_keys_fixed(value_stops: u8) -> impl Iterator<Item = Key> {
    assert!(value_stops > 0, "at least one value stop is needed");
    let step = u8::MAX / value_stops;

    iter::successors(Some([u8::MIN; KEY_LEN]), move |prev| {
        let mut next = *prev;
        for digit in next.iter_mut().rev() {
            if *digit == u8::MAX || digit.checked_add(step).is_none() {
                *digit = u8::MIN;
                continue;
            }
            *digit = digit.saturating_add(step);
            return Some(next);
        }
        None
    })
}

/// Generate keys that branch at every depth: the all-zero key, then one key
/// for each position with a single `0xFF` byte, from the last position to the
/// first.
///
/// Inserting all of them builds a chain of nodes, one per key byte.
pub fn generate_keys_skewed() -> impl Iterator<Item = Key> {
    iter::once([u8::MIN; KEY_LEN]).chain((0..KEY_LEN).rev().map(|position| {
        let mut key = [u8::MIN; KEY_LEN];
        key[position] = u8::MAX;
        key
    }))
}

/// Generate `count` consecutive keys starting at the 48-bit value `start`.
pub fn generate_keys_sequential(start: u64, count: u64) -> impl Iterator<Item = Key> {
    (start..start + count).map(u64_to_key)
}

/// Build a tree by inserting every key, with its position as the container
/// index.
pub fn setup_tree_from_keys(keys: impl IntoIterator<Item = Key>) -> Option<Node> {
    let mut root = None;
    for (idx, key) in keys.into_iter().enumerate() {
        insert(&mut root, key, idx as u64);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_keys_are_sorted_and_complete() {
        let keys: Vec<Key> = generate_keys_fixed(1).collect();
        assert_eq!(keys.len(), 64);
        assert_eq!(keys[0], [0; 6]);
        assert_eq!(keys[1], [0, 0, 0, 0, 0, 255]);
        assert_eq!(keys[63], [255; 6]);
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn skewed_keys() {
        let keys: Vec<Key> = generate_keys_skewed().collect();
        assert_eq!(
            keys,
            vec![
                [0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 255],
                [0, 0, 0, 0, 255, 0],
                [0, 0, 0, 255, 0, 0],
                [0, 0, 255, 0, 0, 0],
                [0, 255, 0, 0, 0, 0],
                [255, 0, 0, 0, 0, 0],
            ]
        );
    }
}
