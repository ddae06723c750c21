//! Encoding of nodes into the little-endian tree format.
//!
//! Every node starts with `[u8 type][u16 child count][u8 prefix length]`
//! followed by the prefix bytes and a type specific body. Inner nodes are
//! followed by their children in ascending key order, so a whole tree is
//! written in pre-order.
//!
//! The key arrays of [`InnerNode4`], [`InnerNode16`] and [`InnerNode48`] are
//! packed big-endian into 4 or 8 byte words, and each word is written
//! little-endian. On disk the bytes of every word therefore appear in reverse
//! order.

use crate::{
    InnerNode16, InnerNode256, InnerNode4, InnerNode48, LeafNode, Node, WriteLeExt, KEY_LEN,
};
use std::io::{self, Write};

/// The size of the fixed part of every node header.
pub const NODE_HEADER_LEN: u64 = 1 + 2 + 1;

/// The size of a leaf body: key length, key bytes and container index.
pub const LEAF_BODY_LEN: u64 = 4 + KEY_LEN as u64 + 8;

fn write_header<W: Write + ?Sized>(node: &Node, writer: &mut W) -> io::Result<()> {
    let prefix = node.prefix();
    writer.write_u8_le(node.node_type() as u8)?;
    writer.write_u16_le(node.num_children() as u16)?;
    writer.write_u8_le(prefix.len() as u8)?;
    writer.write_all(prefix)
}

/// Pack the sorted key bytes of a compressed node into `N` byte words, with
/// unused slots zeroed.
fn padded_keys<const N: usize>(keys: &[u8]) -> [u8; N] {
    let mut padded = [0; N];
    padded[..keys.len()].copy_from_slice(keys);
    padded
}

fn write_node4_body<W: Write + ?Sized>(node: &InnerNode4, writer: &mut W) -> io::Result<()> {
    let keys = padded_keys::<4>(node.keys());
    writer.write_u32_le(u32::from_be_bytes(keys))
}

fn write_node16_body<W: Write + ?Sized>(node: &InnerNode16, writer: &mut W) -> io::Result<()> {
    let keys = padded_keys::<16>(node.keys());
    let lanes: &[[u8; 8]] = bytemuck::cast_slice(&keys[..]);
    for lane in lanes {
        writer.write_u64_le(u64::from_be_bytes(*lane))?;
    }
    Ok(())
}

fn write_node48_body<W: Write + ?Sized>(node: &InnerNode48, writer: &mut W) -> io::Result<()> {
    let indices = node.child_indices();
    let words: &[[u8; 8]] = bytemuck::cast_slice(&indices[..]);
    for word in words {
        writer.write_u64_le(u64::from_be_bytes(*word))?;
    }
    Ok(())
}

fn write_node256_body<W: Write + ?Sized>(node: &InnerNode256, writer: &mut W) -> io::Result<()> {
    writer.write_u64_slice_le(node.bitmap())
}

fn write_leaf_body<W: Write + ?Sized>(leaf: &LeafNode, writer: &mut W) -> io::Result<()> {
    writer.write_u32_le(KEY_LEN as u32)?;
    writer.write_all(&leaf.key())?;
    writer.write_u64_le(leaf.container_idx())
}

/// Write a single node, without its children.
pub fn write_node<W: Write + ?Sized>(node: &Node, writer: &mut W) -> io::Result<()> {
    write_header(node, writer)?;
    match node {
        Node::Node4(inner) => write_node4_body(inner, writer),
        Node::Node16(inner) => write_node16_body(inner, writer),
        Node::Node48(inner) => write_node48_body(inner, writer),
        Node::Node256(inner) => write_node256_body(inner, writer),
        Node::Leaf(leaf) => write_leaf_body(leaf, writer),
    }
}

/// Return the number of bytes [`write_node`] produces for `node`.
pub fn node_serialized_size(node: &Node) -> u64 {
    let body = match node {
        Node::Node4(_) => 4,
        Node::Node16(_) => 16,
        Node::Node48(_) => 256,
        Node::Node256(_) => 4 * 8,
        Node::Leaf(_) => LEAF_BODY_LEN,
    };

    NODE_HEADER_LEN + node.prefix().len() as u64 + body
}

/// Write the tree rooted at `root` in pre-order and return the number of
/// nodes written.
pub fn serialize_nodes<W: Write + ?Sized>(root: &Node, writer: &mut W) -> io::Result<usize> {
    let mut stack = vec![root];
    let mut num_nodes = 0;

    while let Some(node) = stack.pop() {
        write_node(node, writer)?;
        num_nodes += 1;

        // Reversed, so that the smallest key byte is popped first.
        let first_child = stack.len();
        stack.extend(node.children().map(|(_, child)| child));
        stack[first_child..].reverse();
    }

    Ok(num_nodes)
}

/// Return the number of bytes [`serialize_nodes`] produces for the tree.
pub fn tree_serialized_size(root: &Node) -> u64 {
    let mut stack = vec![root];
    let mut total = 0;

    while let Some(node) = stack.pop() {
        total += node_serialized_size(node);
        stack.extend(node.children().map(|(_, child)| child));
    }

    total
}

#[cfg(test)]
mod tests;
