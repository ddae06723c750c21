use crate::{insert, search, tests_common::setup_tree_from_keys, LeafNode, Node};

#[test]
fn lookup_single_leaf() {
    let root = Node::Leaf(LeafNode::new([1, 2, 3, 4, 5, 6], 11));

    assert_eq!(
        search(&root, &[1, 2, 3, 4, 5, 6]).map(LeafNode::container_idx),
        Some(11)
    );
    assert!(search(&root, &[1, 2, 3, 4, 5, 7]).is_none());
    assert!(search(&root, &[0, 2, 3, 4, 5, 6]).is_none());
}

#[test]
fn lookup_misses() {
    let root = setup_tree_from_keys([
        [1, 2, 3, 4, 5, 6],
        [1, 2, 3, 4, 5, 7],
        [1, 2, 3, 9, 9, 9],
    ])
    .unwrap();

    // prefix mismatch at the root
    assert!(search(&root, &[1, 3, 3, 4, 5, 6]).is_none());
    // missing child byte
    assert!(search(&root, &[1, 2, 3, 5, 5, 6]).is_none());
    // prefix mismatch in a lower node
    assert!(search(&root, &[1, 2, 3, 4, 0, 6]).is_none());
    // missing last byte
    assert!(search(&root, &[1, 2, 3, 4, 5, 8]).is_none());
    // reaches a leaf whose remaining bytes differ
    assert!(search(&root, &[1, 2, 3, 9, 9, 0]).is_none());

    assert_eq!(
        search(&root, &[1, 2, 3, 9, 9, 9]).map(LeafNode::container_idx),
        Some(2)
    );
}

#[test]
fn lookup_uses_unsigned_bytes() {
    let mut root = None;
    insert(&mut root, [0x7F, 0, 0, 0, 0, 0], 1);
    insert(&mut root, [0x80, 0, 0, 0, 0, 0], 2);
    insert(&mut root, [0xFF, 0, 0, 0, 0, 0], 3);
    let root = root.unwrap();

    assert_eq!(
        search(&root, &[0x80, 0, 0, 0, 0, 0]).map(LeafNode::container_idx),
        Some(2)
    );
    assert_eq!(root.children().map(|(key, _)| key).collect::<Vec<_>>(), vec![0x7F, 0x80, 0xFF]);
}
