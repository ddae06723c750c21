use crate::{
    search,
    tests_common::{generate_keys_fixed, generate_keys_skewed, setup_tree_from_keys},
    Backward, Direction, Forward, Key, Node, Shuttle,
};

fn drain<D: Direction>(shuttle: &mut Shuttle<D>, root: Option<&Node>) -> Vec<Key> {
    let mut keys = Vec::new();
    while shuttle.move_to_next_leaf(root) {
        keys.push(shuttle.current_leaf(root).unwrap().key());
    }
    keys
}

fn scan_from<D: Direction>(root: Option<&Node>, key: Key) -> Vec<Key> {
    let mut shuttle = Shuttle::<D>::new();
    shuttle.init_from(root, &key);
    drain(&mut shuttle, root)
}

fn drain_removing<D: Direction>(root: &mut Option<Node>, keep: impl Fn(&Key) -> bool) -> Vec<Key> {
    let mut shuttle = Shuttle::<D>::new();
    shuttle.init(root.as_ref());

    let mut visited = Vec::new();
    while shuttle.move_to_next_leaf(root.as_ref()) {
        let leaf = shuttle.current_leaf(root.as_ref()).unwrap();
        visited.push(leaf.key());
        if !keep(&leaf.key()) {
            assert_eq!(shuttle.remove(root), Some(leaf));
            assert!(shuttle.current_leaf(root.as_ref()).is_none());
        }
    }
    visited
}

const K0: Key = [1, 2, 3, 4, 5, 10];
const K1: Key = [1, 2, 3, 4, 5, 20];
const K2: Key = [1, 2, 3, 4, 5, 30];

#[test]
fn empty_tree_has_no_leaves() {
    let mut forward = Shuttle::<Forward>::new();
    forward.init(None);
    assert!(!forward.move_to_next_leaf(None));
    assert!(forward.current_leaf(None).is_none());

    let mut backward = Shuttle::<Backward>::new();
    backward.init_from(None, &K0);
    assert!(!backward.move_to_next_leaf(None));

    let mut root = None;
    assert!(forward.remove(&mut root).is_none());
}

#[test]
fn single_leaf_tree() {
    let root = setup_tree_from_keys([K1]);

    let mut shuttle = Shuttle::<Forward>::new();
    shuttle.init(root.as_ref());
    assert_eq!(drain(&mut shuttle, root.as_ref()), vec![K1]);

    assert_eq!(scan_from::<Forward>(root.as_ref(), K0), vec![K1]);
    assert_eq!(scan_from::<Forward>(root.as_ref(), K2), Vec::<Key>::new());
    assert_eq!(scan_from::<Backward>(root.as_ref(), K2), vec![K1]);
    assert_eq!(scan_from::<Backward>(root.as_ref(), K0), Vec::<Key>::new());
}

#[test]
fn full_scans_are_ordered_and_mirrored() {
    let keys: Vec<Key> = generate_keys_fixed(3).collect();
    let root = setup_tree_from_keys(keys.iter().copied());

    let mut forward = Shuttle::<Forward>::new();
    forward.init(root.as_ref());
    let ascending = drain(&mut forward, root.as_ref());
    assert_eq!(ascending, keys);

    let mut backward = Shuttle::<Backward>::new();
    backward.init(root.as_ref());
    let mut descending = drain(&mut backward, root.as_ref());
    descending.reverse();
    assert_eq!(descending, keys);
}

#[test]
fn skewed_scan() {
    let mut keys: Vec<Key> = generate_keys_skewed().collect();
    let root = setup_tree_from_keys(keys.iter().copied());
    keys.sort();

    let mut forward = Shuttle::<Forward>::new();
    forward.init(root.as_ref());
    assert_eq!(drain(&mut forward, root.as_ref()), keys);
}

#[test]
fn first_move_reports_landing_leaf() {
    let root = setup_tree_from_keys([K0, K1, K2]);
    let mut shuttle = Shuttle::<Forward>::new();
    shuttle.init_from(root.as_ref(), &K1);

    assert_eq!(shuttle.current_leaf(root.as_ref()).map(|leaf| leaf.key()), Some(K1));
    assert!(shuttle.move_to_next_leaf(root.as_ref()));
    assert_eq!(shuttle.current_leaf(root.as_ref()).map(|leaf| leaf.key()), Some(K1));
    assert!(shuttle.move_to_next_leaf(root.as_ref()));
    assert_eq!(shuttle.current_leaf(root.as_ref()).map(|leaf| leaf.key()), Some(K2));
    assert!(!shuttle.move_to_next_leaf(root.as_ref()));
    assert!(!shuttle.move_to_next_leaf(root.as_ref()));
}

#[test]
fn seek_to_existing_keys() {
    let root = setup_tree_from_keys([K0, K1, K2]);

    assert_eq!(scan_from::<Forward>(root.as_ref(), K0), vec![K0, K1, K2]);
    assert_eq!(scan_from::<Forward>(root.as_ref(), K1), vec![K1, K2]);
    assert_eq!(scan_from::<Forward>(root.as_ref(), K2), vec![K2]);

    assert_eq!(scan_from::<Backward>(root.as_ref(), K0), vec![K0]);
    assert_eq!(scan_from::<Backward>(root.as_ref(), K1), vec![K1, K0]);
    assert_eq!(scan_from::<Backward>(root.as_ref(), K2), vec![K2, K1, K0]);
}

#[test]
fn seek_into_gaps() {
    let root = setup_tree_from_keys([K0, K1, K2]);

    assert_eq!(scan_from::<Forward>(root.as_ref(), [1, 2, 3, 4, 5, 15]), vec![K1, K2]);
    assert_eq!(scan_from::<Backward>(root.as_ref(), [1, 2, 3, 4, 5, 15]), vec![K0]);

    // before the first and after the last key
    assert_eq!(scan_from::<Forward>(root.as_ref(), [1, 2, 3, 4, 5, 0]), vec![K0, K1, K2]);
    assert_eq!(scan_from::<Forward>(root.as_ref(), [1, 2, 3, 4, 5, 31]), Vec::<Key>::new());
    assert_eq!(scan_from::<Backward>(root.as_ref(), [1, 2, 3, 4, 5, 0]), Vec::<Key>::new());
    assert_eq!(scan_from::<Backward>(root.as_ref(), [1, 2, 3, 4, 5, 31]), vec![K2, K1, K0]);
}

#[test]
fn seek_with_prefix_mismatch() {
    let root = setup_tree_from_keys([K0, K1, K2]);

    assert_eq!(scan_from::<Forward>(root.as_ref(), [1, 2, 0, 9, 9, 9]), vec![K0, K1, K2]);
    assert_eq!(scan_from::<Forward>(root.as_ref(), [1, 2, 9, 0, 0, 0]), Vec::<Key>::new());
    assert_eq!(scan_from::<Backward>(root.as_ref(), [1, 2, 9, 0, 0, 0]), vec![K2, K1, K0]);
    assert_eq!(scan_from::<Backward>(root.as_ref(), [1, 2, 0, 9, 9, 9]), Vec::<Key>::new());
}

#[test]
fn seek_misses_in_lower_levels() {
    let keys = [
        [0, 0, 0, 0, 0, 1],
        [0, 0, 5, 0, 0, 1],
        [0, 0, 5, 0, 0, 9],
        [0, 9, 0, 0, 0, 0],
        [7, 0, 0, 0, 0, 0],
    ];
    let root = setup_tree_from_keys(keys);

    // the byte after the root prefix is past every child of that node
    assert_eq!(scan_from::<Forward>(root.as_ref(), [0, 0, 6, 0, 0, 0]), keys[3..].to_vec());
    assert_eq!(scan_from::<Backward>(root.as_ref(), [0, 0, 6, 0, 0, 0]), {
        let mut expected = keys[..3].to_vec();
        expected.reverse();
        expected
    });
    assert_eq!(scan_from::<Forward>(root.as_ref(), [0, 0, 5, 0, 0, 5]), keys[2..].to_vec());
    assert_eq!(scan_from::<Forward>(root.as_ref(), [3, 0, 0, 0, 0, 0]), keys[4..].to_vec());
    assert_eq!(scan_from::<Backward>(root.as_ref(), [3, 0, 0, 0, 0, 0]), {
        let mut expected = keys[..4].to_vec();
        expected.reverse();
        expected
    });
}

#[test]
fn seek_every_key_in_dense_tree() {
    let keys: Vec<Key> = generate_keys_fixed(2).collect();
    let root = setup_tree_from_keys(keys.iter().copied());

    for (idx, key) in keys.iter().enumerate() {
        let mut forward = Shuttle::<Forward>::new();
        forward.init_from(root.as_ref(), key);
        assert!(forward.move_to_next_leaf(root.as_ref()));
        assert_eq!(forward.current_leaf(root.as_ref()).unwrap().key(), keys[idx]);

        // one past the key lands on the next key
        let mut gap = *key;
        gap[5] += 1;
        let mut forward = Shuttle::<Forward>::new();
        forward.init_from(root.as_ref(), &gap);
        let expected = keys.get(idx + 1).copied();
        let landed = forward
            .move_to_next_leaf(root.as_ref())
            .then(|| forward.current_leaf(root.as_ref()).unwrap().key());
        assert_eq!(landed, expected, "seeking {gap:?}");
    }
}

#[test]
fn remove_during_forward_iteration() {
    let mut root = setup_tree_from_keys([K0, K1, K2]);

    let visited = drain_removing::<Forward>(&mut root, |_| false);
    assert_eq!(visited, vec![K0, K1, K2]);
    assert!(root.is_none());
}

#[test]
fn remove_during_backward_iteration() {
    let mut root = setup_tree_from_keys([K0, K1, K2]);

    let visited = drain_removing::<Backward>(&mut root, |_| false);
    assert_eq!(visited, vec![K2, K1, K0]);
    assert!(root.is_none());
}

#[test]
fn remove_with_collapse_into_next_sibling() {
    let keys = [
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 8, 0, 0, 0],
    ];
    let mut root = setup_tree_from_keys(keys);

    let visited = drain_removing::<Forward>(&mut root, |key| *key != keys[0]);
    assert_eq!(visited, keys.to_vec());
    assert!(search(root.as_ref().unwrap(), &keys[0]).is_none());
    assert!(search(root.as_ref().unwrap(), &keys[1]).is_some());
}

#[test]
fn remove_with_collapse_after_last_sibling() {
    let keys = [
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 8, 0, 0, 0],
    ];
    let mut root = setup_tree_from_keys(keys);

    let visited = drain_removing::<Forward>(&mut root, |key| *key != keys[1]);
    assert_eq!(visited, keys.to_vec());

    let mut shuttle = Shuttle::<Forward>::new();
    shuttle.init(root.as_ref());
    assert_eq!(drain(&mut shuttle, root.as_ref()), vec![keys[0], keys[2]]);
}

#[test]
fn remove_every_other_key() {
    let keys: Vec<Key> = generate_keys_fixed(3).collect();

    for forward in [true, false] {
        let mut root = setup_tree_from_keys(keys.iter().copied());
        let keep = |key: &Key| key.iter().map(|byte| u32::from(*byte)).sum::<u32>() % 2 == 0;

        let mut visited = if forward {
            drain_removing::<Forward>(&mut root, keep)
        } else {
            drain_removing::<Backward>(&mut root, keep)
        };
        if !forward {
            visited.reverse();
        }
        assert_eq!(visited, keys);

        let mut shuttle = Shuttle::<Forward>::new();
        shuttle.init(root.as_ref());
        let remaining = drain(&mut shuttle, root.as_ref());
        let expected: Vec<Key> = keys.iter().copied().filter(keep).collect();
        assert_eq!(remaining, expected);
    }
}

#[test]
fn remove_entire_dense_tree() {
    let keys: Vec<Key> = generate_keys_fixed(3).collect();

    let mut root = setup_tree_from_keys(keys.iter().copied());
    assert_eq!(drain_removing::<Forward>(&mut root, |_| false), keys);
    assert!(root.is_none());

    let mut root = setup_tree_from_keys(keys.iter().copied());
    let mut visited = drain_removing::<Backward>(&mut root, |_| false);
    visited.reverse();
    assert_eq!(visited, keys);
    assert!(root.is_none());
}

#[test]
fn remove_through_node_classes() {
    let keys: Vec<Key> = (0..=255u8).map(|last| [4, 4, 4, 4, 4, last]).collect();
    let mut root = setup_tree_from_keys(keys.iter().copied());

    let visited = drain_removing::<Forward>(&mut root, |key| key[5] % 64 == 0);
    assert_eq!(visited, keys);

    let mut shuttle = Shuttle::<Forward>::new();
    shuttle.init(root.as_ref());
    assert_eq!(
        drain(&mut shuttle, root.as_ref()),
        vec![keys[0], keys[64], keys[128], keys[192]]
    );
}
