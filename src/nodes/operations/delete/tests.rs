use crate::{
    insert, remove, search,
    tests_common::{generate_keys_fixed, setup_tree_from_keys},
    LeafNode, Node, NodeType, ParentChange,
};

#[test]
fn delete_singleton_tree_leaf() {
    let mut root = Some(Node::Leaf(LeafNode::new([1, 2, 3, 4, 5, 6], 4)));

    assert!(remove(&mut root, &[1, 2, 3, 4, 5, 7]).is_none());
    assert!(root.is_some());

    let removed = remove(&mut root, &[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(removed.leaf, LeafNode::new([1, 2, 3, 4, 5, 6], 4));
    assert_eq!(removed.parent, ParentChange::Root);
    assert!(root.is_none());

    assert!(remove(&mut root, &[1, 2, 3, 4, 5, 6]).is_none());
}

#[test]
fn delete_misses_leave_tree_unchanged() {
    let mut root = setup_tree_from_keys([
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 3, 9, 9, 9],
    ]);
    let before = root.clone();

    assert!(remove(&mut root, &[1, 2, 4, 4, 5, 6]).is_none());
    assert!(remove(&mut root, &[1, 2, 3, 4, 5, 8]).is_none());
    assert!(remove(&mut root, &[1, 2, 3, 9, 9, 0]).is_none());
    assert!(remove(&mut root, &[1, 2, 3, 7, 0, 0]).is_none());

    assert_eq!(root, before);
}

#[test]
fn delete_collapses_node4_into_leaf() {
    let mut root = setup_tree_from_keys([[1, 2, 3, 4, 5, 6], [1, 2, 3, 4, 5, 7]]);

    let removed = remove(&mut root, &[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(removed.parent, ParentChange::Collapsed);
    assert_eq!(removed.leaf.container_idx(), 0);

    let root = root.unwrap();
    assert_eq!(root, Node::Leaf(LeafNode::new([1, 2, 3, 4, 5, 7], 1)));
}

#[test]
fn delete_collapse_merges_prefixes() {
    let mut root = setup_tree_from_keys([
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 8, 0, 0, 0],
    ]);
    assert_eq!(root.as_ref().unwrap().prefix(), &[1, 2]);

    let removed = remove(&mut root, &[1, 2, 8, 0, 0, 0]).unwrap();
    assert_eq!(removed.parent, ParentChange::Collapsed);

    let root = root.unwrap();
    assert_eq!(root.node_type(), NodeType::Node4);
    assert_eq!(root.prefix(), &[1, 2, 3, 4, 5]);
    assert!(search(&root, &[1, 2, 3, 4, 5, 6]).is_some());
    assert!(search(&root, &[1, 2, 3, 4, 5, 7]).is_some());
}

#[test]
fn delete_in_lower_node_collapses_into_grandparent_slot() {
    let mut root = setup_tree_from_keys([
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 8, 0, 0, 0],
    ]);

    let removed = remove(&mut root, &[1, 2, 3, 4, 5, 7]).unwrap();
    assert_eq!(removed.parent, ParentChange::Collapsed);

    let root = root.unwrap();
    assert_eq!(root.prefix(), &[1, 2]);
    assert_eq!(
        root.lookup_child(3),
        Some(&Node::Leaf(LeafNode::new([1, 2, 3, 4, 5, 6], 0)))
    );
}

#[test]
fn delete_shrinks_node48_to_node16() {
    let mut root = None;
    for last in 0..17u8 {
        insert(&mut root, [0, 0, 0, 0, 0, last], u64::from(last));
    }
    assert_eq!(root.as_ref().unwrap().node_type(), NodeType::Node48);

    for last in 0..6u8 {
        let removed = remove(&mut root, &[0, 0, 0, 0, 0, last]).unwrap();
        assert_eq!(removed.parent, ParentChange::Kept);
    }

    let root = root.unwrap();
    assert_eq!(root.node_type(), NodeType::Node16);
    assert_eq!(root.num_children(), 11);
    for last in 6..17u8 {
        assert_eq!(
            search(&root, &[0, 0, 0, 0, 0, last]).map(LeafNode::container_idx),
            Some(u64::from(last))
        );
    }
    for last in 0..6u8 {
        assert!(search(&root, &[0, 0, 0, 0, 0, last]).is_none());
    }
}

#[test]
fn delete_walks_down_node_classes() {
    let mut root = None;
    for last in 0..=255u8 {
        insert(&mut root, [7, 7, 7, 7, 7, last], u64::from(last));
    }
    assert_eq!(root.as_ref().unwrap().node_type(), NodeType::Node256);

    for last in 0..=254u8 {
        remove(&mut root, &[7, 7, 7, 7, 7, last]).unwrap();

        let remaining = 255 - usize::from(last);
        let node = root.as_ref().unwrap();
        let expected = match remaining {
            1 => NodeType::Leaf,
            2..=3 => NodeType::Node4,
            4..=12 => NodeType::Node16,
            13..=36 => NodeType::Node48,
            _ => NodeType::Node256,
        };
        assert_eq!(node.node_type(), expected, "with [{remaining}] children left");
    }

    assert_eq!(
        root,
        Some(Node::Leaf(LeafNode::new([7, 7, 7, 7, 7, 255], 255)))
    );
}

#[test]
fn delete_entire_dense_tree() {
    let keys: Vec<_> = generate_keys_fixed(2).collect();
    let mut root = setup_tree_from_keys(keys.iter().copied());

    for (idx, key) in keys.iter().enumerate() {
        let removed = remove(&mut root, key).unwrap();
        assert_eq!(removed.leaf.container_idx(), idx as u64);

        if let Some(root) = &root {
            assert!(search(root, key).is_none());
            if let Some(next) = keys.get(idx + 1) {
                assert!(search(root, next).is_some());
            }
        }
    }

    assert!(root.is_none());
}
