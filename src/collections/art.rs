//! The adaptive radix tree over 48-bit keys.

use crate::{
    deserialize_nodes,
    error::{DeserializeError, SerializeError},
    high_bytes, insert, maximum, minimum, remove, search, serialize_nodes, tree_serialized_size,
    Backward, Containers, CountingWriter, Forward, InsertOutcome, Key, LeafNode, Node, ReadLeExt,
    WriteLeExt,
};
use std::io::{self, Read, Write};

mod iterators;
pub use iterators::*;


/// The number of bytes in the key count that starts a serialized tree.
const KEY_COUNT_LEN: u64 = 8;

/// An adaptive radix tree that maps the high 48 bits of a 64-bit value to the
/// index of a container in a [`Containers`](crate::Containers) registry.
///
/// # Examples
///
/// ```rust
/// use roaring_art::Art;
///
/// let mut art = Art::new();
/// art.insert([0, 0, 0, 0, 1, 2], 7);
///
/// assert_eq!(art.find_by_key(&[0, 0, 0, 0, 1, 2]), Some(7));
/// assert_eq!(art.find_by_key(&[0, 0, 0, 0, 1, 3]), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Art {
    root: Option<Node>,
    /// Incremented on every insert, decremented on every successful removal.
    key_size: u64,
}

impl Art {
    /// Create a new, empty tree.
    pub fn new() -> Self {
        Art {
            root: None,
            key_size: 0,
        }
    }

    pub(crate) fn from_root(root: Node, key_size: u64) -> Self {
        Art {
            root: Some(root),
            key_size,
        }
    }

    /// Return the root node of the tree, if any.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Return true if the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return the key counter of the tree.
    ///
    /// The counter is incremented on every call to [`Art::insert`], including
    /// calls that overwrite an existing key, so it can be larger than the
    /// number of distinct keys.
    pub fn key_size(&self) -> u64 {
        self.key_size
    }

    /// Insert `key` with the given container index.
    ///
    /// If the key is already present, its container index is overwritten.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_art::Art;
    ///
    /// let mut art = Art::new();
    /// art.insert([1, 2, 3, 4, 5, 6], 0);
    /// art.insert([1, 2, 3, 4, 5, 6], 1);
    ///
    /// assert_eq!(art.find_by_key(&[1, 2, 3, 4, 5, 6]), Some(1));
    /// assert_eq!(art.key_size(), 2);
    /// ```
    pub fn insert(&mut self, key: Key, container_idx: u64) {
        let outcome = insert(&mut self.root, key, container_idx);
        if let InsertOutcome::Overwrote(previous) = outcome {
            tracing::trace!(?key, previous, container_idx, "overwrote existing key");
        }
        self.key_size += 1;
    }

    /// Return the container index stored for `key`.
    pub fn find_by_key(&self, key: &Key) -> Option<u64> {
        let root = self.root.as_ref()?;
        search(root, key).map(LeafNode::container_idx)
    }

    /// Return the container index stored for the high 48 bits of `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_art::{high_bytes, Art};
    ///
    /// let mut art = Art::new();
    /// art.insert(high_bytes(0x0001_0002_0003_0004), 3);
    ///
    /// assert_eq!(art.find_by_value(0x0001_0002_0003_FFFF), Some(3));
    /// assert_eq!(art.find_by_value(0x0001_0002_0004_0000), None);
    /// ```
    pub fn find_by_value(&self, value: u64) -> Option<u64> {
        self.find_by_key(&high_bytes(value))
    }

    /// Remove `key` from the tree and return its container index.
    pub fn remove(&mut self, key: &Key) -> Option<u64> {
        let removed = remove(&mut self.root, key)?;
        self.key_size = self.key_size.saturating_sub(1);
        Some(removed.leaf.container_idx())
    }

    /// Return the leaf with the smallest key.
    pub fn first(&self) -> Option<LeafNode> {
        minimum(self.root.as_ref()?).copied()
    }

    /// Return the leaf with the largest key.
    pub fn last(&self) -> Option<LeafNode> {
        maximum(self.root.as_ref()?).copied()
    }

    /// Iterate over the leaves in ascending key order.
    pub fn iter(&self) -> Iter<'_, Forward> {
        Iter::new(self.root.as_ref())
    }

    /// Iterate over the leaves in descending key order.
    pub fn iter_rev(&self) -> Iter<'_, Backward> {
        Iter::new(self.root.as_ref())
    }

    /// Return a cursor over the leaves that can also seek and remove.
    ///
    /// When `containers` is given, removing a leaf through the cursor also
    /// removes its container from the registry.
    pub fn leaf_node_iterator<'a>(
        &'a mut self,
        reverse: bool,
        containers: Option<&'a mut Containers>,
    ) -> LeafNodeIterator<'a> {
        LeafNodeIterator::new(self, reverse, containers)
    }

    /// Return a cursor like [`Art::leaf_node_iterator`], positioned on `bound`
    /// or on the first leaf after it in scan order.
    pub fn leaf_node_iterator_from<'a>(
        &'a mut self,
        bound: &Key,
        reverse: bool,
        containers: Option<&'a mut Containers>,
    ) -> LeafNodeIterator<'a> {
        let mut iter = LeafNodeIterator::new(self, reverse, containers);
        iter.seek(bound);
        iter
    }

    /// Return an ascending iterator over the keys of the tree.
    pub fn key_iterator<'a>(
        &'a mut self,
        containers: Option<&'a mut Containers>,
    ) -> KeyIterator<'a> {
        KeyIterator::new(self.leaf_node_iterator(false, containers))
    }

    /// Return the number of bytes [`Art::serialize`] writes.
    pub fn serialize_size_in_bytes(&self) -> u64 {
        KEY_COUNT_LEN + self.root.as_ref().map_or(0, tree_serialized_size)
    }

    /// Write the tree to `writer` and return the number of bytes written.
    ///
    /// The format is the key count as a little-endian `u64`, followed by every
    /// node in pre-order. An empty tree is written as a key count of 0.
    pub fn serialize<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<usize> {
        let mut writer = CountingWriter::new(writer);
        let Some(root) = self.root.as_ref() else {
            writer.write_u64_le(0)?;
            return Ok(writer.written());
        };

        writer.write_u64_le(self.key_size)?;
        let num_nodes = serialize_nodes(root, &mut writer)?;
        tracing::debug!(
            key_size = self.key_size,
            num_nodes,
            bytes = writer.written(),
            "serialized tree"
        );
        Ok(writer.written())
    }

    /// Write the tree into the front of `buf` and return the number of bytes
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] without writing anything if
    /// `buf` is shorter than [`Art::serialize_size_in_bytes`].
    pub fn serialize_into_slice(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        let needed = self.serialize_size_in_bytes();
        if needed > buf.len() as u64 {
            return Err(SerializeError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }

        let mut writer = buf;
        Ok(self.serialize(&mut writer)?)
    }

    /// Read a tree written by [`Art::serialize`].
    ///
    /// # Errors
    ///
    /// Any malformed node aborts the read, see [`DeserializeError`].
    pub fn deserialize<R: Read + ?Sized>(reader: &mut R) -> Result<Art, DeserializeError> {
        let key_size = reader.read_u64_le()?;
        if key_size == 0 {
            return Ok(Art::new());
        }

        let (root, num_nodes) = deserialize_nodes(reader)?;
        tracing::debug!(key_size, num_nodes, "deserialized tree");
        Ok(Art::from_root(root, key_size))
    }

    /// Read a tree from the front of `buf`, and return it with the number of
    /// bytes read.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_art::Art;
    ///
    /// let mut art = Art::new();
    /// art.insert([0, 0, 0, 1, 0, 0], 1);
    /// art.insert([0, 0, 0, 2, 0, 0], 2);
    ///
    /// let mut buf = vec![0; art.serialize_size_in_bytes() as usize];
    /// let written = art.serialize_into_slice(&mut buf).unwrap();
    ///
    /// let (copy, read) = Art::deserialize_from_slice(&buf).unwrap();
    /// assert_eq!(read, written);
    /// assert_eq!(copy, art);
    /// ```
    pub fn deserialize_from_slice(buf: &[u8]) -> Result<(Art, usize), DeserializeError> {
        let mut reader = buf;
        let art = Art::deserialize(&mut reader)?;
        Ok((art, buf.len() - reader.len()))
    }
}

impl<'a> IntoIterator for &'a Art {
    type IntoIter = Iter<'a, Forward>;
    type Item = LeafNode;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
