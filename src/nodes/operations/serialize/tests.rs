use crate::{
    insert, node_serialized_size, serialize_nodes, tests_common::setup_tree_from_keys,
    tree_serialized_size, write_node, LeafNode, Node, NodeType,
};

fn to_bytes(root: &Node) -> (Vec<u8>, usize) {
    let mut buf = Vec::new();
    let num_nodes = serialize_nodes(root, &mut buf).unwrap();
    (buf, num_nodes)
}

#[test]
fn leaf_layout() {
    let leaf = Node::Leaf(LeafNode::new([1, 2, 3, 4, 5, 6], 0x0102));
    let mut buf = Vec::new();
    write_node(&leaf, &mut buf).unwrap();

    #[rustfmt::skip]
    let expected = [
        // type, count, prefix length
        4, 0, 0, 0,
        // key length
        6, 0, 0, 0,
        1, 2, 3, 4, 5, 6,
        // container index
        0x02, 0x01, 0, 0, 0, 0, 0, 0,
    ];
    assert_eq!(buf, expected);
    assert_eq!(node_serialized_size(&leaf), expected.len() as u64);
}

#[test]
fn node4_tree_layout() {
    let root = setup_tree_from_keys([[1, 2, 3, 4, 5, 6], [1, 2, 3, 4, 5, 7]]).unwrap();
    let (buf, num_nodes) = to_bytes(&root);

    assert_eq!(num_nodes, 3);
    #[rustfmt::skip]
    let expected_root = [
        0, 2, 0, 5,
        1, 2, 3, 4, 5,
        // keys [6, 7, 0, 0] as a big-endian word, written little-endian
        0, 0, 7, 6,
    ];
    assert_eq!(&buf[..13], &expected_root);
    assert_eq!(&buf[13..17], &[4, 0, 0, 0]);
    assert_eq!(&buf[21..27], &[1, 2, 3, 4, 5, 6]);
    assert_eq!(&buf[35..39], &[4, 0, 0, 0]);
    assert_eq!(&buf[43..49], &[1, 2, 3, 4, 5, 7]);
    assert_eq!(&buf[49..], &[1, 0, 0, 0, 0, 0, 0, 0]);

    assert_eq!(tree_serialized_size(&root), buf.len() as u64);
    assert_eq!(buf.len(), 13 + 2 * 22);
}

#[test]
fn node16_keys_are_packed_in_two_words() {
    let mut root = None;
    for last in 1..=5u8 {
        insert(&mut root, [0, 0, 0, 0, 0, last], 0);
    }
    let root = root.unwrap();
    assert_eq!(root.node_type(), NodeType::Node16);

    let mut buf = Vec::new();
    write_node(&root, &mut buf).unwrap();

    assert_eq!(&buf[..4], &[1, 5, 0, 5]);
    assert_eq!(&buf[9..17], &[0, 0, 0, 5, 4, 3, 2, 1]);
    assert_eq!(&buf[17..25], &[0; 8]);
    assert_eq!(buf.len() as u64, node_serialized_size(&root));
}

#[test]
fn node48_indices_use_sentinel() {
    let mut root = None;
    for last in 0..17u8 {
        insert(&mut root, [0, 0, 0, 0, 0, last], 0);
    }
    let root = root.unwrap();
    assert_eq!(root.node_type(), NodeType::Node48);

    let mut buf = Vec::new();
    write_node(&root, &mut buf).unwrap();
    let body = &buf[4 + 5..];

    assert_eq!(body.len(), 256);
    assert_eq!(&body[..8], &[7, 6, 5, 4, 3, 2, 1, 0]);
    assert_eq!(&body[8..16], &[15, 14, 13, 12, 11, 10, 9, 8]);
    // key 16 holds slot 16, the rest are empty
    assert_eq!(&body[16..24], &[48, 48, 48, 48, 48, 48, 48, 16]);
    assert!(body[24..].iter().all(|index| *index == 48));
}

#[test]
fn node256_bitmap_layout() {
    let mut root = None;
    for last in (0..=255u8).step_by(5) {
        insert(&mut root, [9, 9, 9, 9, 9, last], 0);
    }
    for last in [1u8, 64, 129, 254] {
        insert(&mut root, [9, 9, 9, 9, 9, last], 0);
    }
    let root = root.unwrap();
    assert_eq!(root.node_type(), NodeType::Node256);
    assert_eq!(root.num_children(), 56);

    let mut buf = Vec::new();
    write_node(&root, &mut buf).unwrap();
    assert_eq!(&buf[..4], &[3, 56, 0, 5]);

    let body = &buf[9..];
    assert_eq!(body.len(), 32);
    let words: Vec<u64> = body
        .chunks_exact(8)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    let set_bits: u32 = words.iter().map(|word| word.count_ones()).sum();
    assert_eq!(set_bits, 56);
    assert_eq!(words[0] & 0b11, 0b11);
    assert_eq!(words[1] & 1, 1);
    assert_eq!((words[2] >> 1) & 1, 1);
    assert_eq!((words[3] >> 62) & 1, 1);
    assert_eq!(words[3] >> 63, 1);
}

#[test]
fn children_are_written_in_key_order() {
    let keys = [
        [5, 0, 0, 0, 0, 0],
        [1, 0, 0, 0, 0, 0],
        [3, 0, 0, 0, 0, 0],
    ];
    let root = setup_tree_from_keys(keys).unwrap();
    let (buf, num_nodes) = to_bytes(&root);

    assert_eq!(num_nodes, 4);
    let first_bytes: Vec<u8> = (0..3).map(|leaf| buf[8 + leaf * 22 + 8]).collect();
    assert_eq!(first_bytes, vec![1, 3, 5]);
}
