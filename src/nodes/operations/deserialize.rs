use crate::{
    error::DeserializeError, Header, InnerNode, InnerNode16, InnerNode256, InnerNode4,
    InnerNode48, LeafNode, Node, NodeType, ReadLeExt, KEY_LEN, MAX_PREFIX_LEN,
};
use std::io::{self, Read};

struct NodeHeader {
    node_type: NodeType,
    count: u16,
    header: Header,
}

fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<NodeHeader, DeserializeError> {
    let tag = reader.read_u8_le()?;
    let node_type = NodeType::from_u8(tag).ok_or(DeserializeError::UnknownNodeType(tag))?;
    let count = reader.read_u16_le()?;
    let prefix_len = reader.read_u8_le()?;

    // A leaf that took over the prefix of a collapsed Node4 may carry up to a
    // full key. Its key is stored in the body, so those bytes are skipped.
    let max_prefix_len = match node_type {
        NodeType::Leaf => KEY_LEN,
        _ => MAX_PREFIX_LEN,
    };
    if usize::from(prefix_len) > max_prefix_len {
        return Err(DeserializeError::InvalidPrefixLength(prefix_len));
    }
    let mut prefix = [0; KEY_LEN];
    let prefix = &mut prefix[..usize::from(prefix_len)];
    reader.read_exact(prefix)?;

    let header = match node_type {
        NodeType::Leaf => Header::empty(),
        _ => Header::new(prefix),
    };

    Ok(NodeHeader {
        node_type,
        count,
        header,
    })
}

fn check_count(node_type: NodeType, count: u16) -> Result<usize, DeserializeError> {
    let num_children = usize::from(count);
    if num_children == 0 || num_children > node_type.upper_capacity() {
        return Err(DeserializeError::InvalidChildCount { node_type, count });
    }
    Ok(num_children)
}

/// Read big-endian packed bytes that were written as little-endian 8 byte
/// words.
fn read_packed_words<R: Read + ?Sized>(reader: &mut R, out: &mut [u8]) -> io::Result<()> {
    let words: &mut [[u8; 8]] = bytemuck::cast_slice_mut(out);
    for word in words {
        *word = reader.read_u64_le()?.to_be_bytes();
    }
    Ok(())
}

fn check_sorted(node_type: NodeType, keys: &[u8]) -> Result<(), DeserializeError> {
    if keys.windows(2).all(|pair| pair[0] < pair[1]) {
        Ok(())
    } else {
        Err(DeserializeError::UnsortedChildKeys(node_type))
    }
}

fn read_leaf<R: Read + ?Sized>(reader: &mut R) -> Result<LeafNode, DeserializeError> {
    let key_len = reader.read_u32_le()?;
    if key_len as usize != KEY_LEN {
        return Err(DeserializeError::InvalidLeafKeyLength(key_len));
    }

    let mut key = [0; KEY_LEN];
    reader.read_exact(&mut key)?;
    let container_idx = reader.read_u64_le()?;

    Ok(LeafNode::new(key, container_idx))
}

/// Read a tree that was written by
/// [`serialize_nodes`](crate::serialize_nodes), and return its root and the
/// number of nodes read.
///
/// Every inner node must branch on a key byte, so a prefix that reaches the
/// end of the key is rejected.
pub fn deserialize_nodes<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<(Node, usize), DeserializeError> {
    let mut num_nodes = 0;
    let root = read_subtree(reader, 0, &mut num_nodes)?;
    Ok((root, num_nodes))
}

fn read_subtree<R: Read + ?Sized>(
    reader: &mut R,
    depth: usize,
    num_nodes: &mut usize,
) -> Result<Node, DeserializeError> {
    let NodeHeader {
        node_type,
        count,
        header,
    } = read_header(reader)?;
    *num_nodes += 1;

    // The byte after an inner node prefix selects a child, so it must exist.
    let child_depth = depth + header.prefix_len() + 1;
    let inner_layout = || {
        if child_depth > KEY_LEN {
            return Err(DeserializeError::InvalidPrefixLength(header.prefix_len() as u8));
        }
        check_count(node_type, count)
    };

    let node: Node = match node_type {
        NodeType::Node4 => {
            let num_children = inner_layout()?;
            let keys = reader.read_u32_le()?.to_be_bytes();
            check_sorted(node_type, &keys[..num_children])?;

            let mut node = InnerNode4::from_header(header);
            for key in &keys[..num_children] {
                node.push_child(*key, read_subtree(reader, child_depth, num_nodes)?);
            }
            node.into()
        },
        NodeType::Node16 => {
            let num_children = inner_layout()?;
            let mut keys = [0u8; 16];
            read_packed_words(reader, &mut keys)?;
            check_sorted(node_type, &keys[..num_children])?;

            let mut node = InnerNode16::from_header(header);
            for key in &keys[..num_children] {
                node.push_child(*key, read_subtree(reader, child_depth, num_nodes)?);
            }
            node.into()
        },
        NodeType::Node48 => {
            let num_children = inner_layout()?;
            let mut raw_indices = [0u8; 256];
            read_packed_words(reader, &mut raw_indices)?;

            let node = InnerNode48::try_from_indices(
                header,
                &raw_indices,
                |_| read_subtree(reader, child_depth, num_nodes),
                |key_byte, index| DeserializeError::InvalidChildIndex { key_byte, index },
            )?;
            if node.header.num_children() != num_children {
                return Err(DeserializeError::InvalidChildCount { node_type, count });
            }
            node.into()
        },
        NodeType::Node256 => {
            let num_children = inner_layout()?;
            let mut bitmap = [0u64; 4];
            reader.read_u64_slice_le(&mut bitmap)?;
            let occupied: u32 = bitmap.iter().map(|word| word.count_ones()).sum();
            if occupied as usize != num_children {
                return Err(DeserializeError::InvalidChildCount { node_type, count });
            }

            let mut node = InnerNode256::from_header(header);
            for key in 0..=u8::MAX {
                let idx = usize::from(key);
                if bitmap[idx / 64] & (1 << (idx % 64)) != 0 {
                    node.write_child(key, read_subtree(reader, child_depth, num_nodes)?);
                }
            }
            node.into()
        },
        NodeType::Leaf => Node::Leaf(read_leaf(reader)?),
    };

    Ok(node)
}
