use crate::{common_prefix_len, KEY_LEN};
use std::fmt;

/// The longest prefix an inner node can carry.
///
/// Every inner node branches on at least one key byte, so a prefix never
/// covers a whole key.
pub const MAX_PREFIX_LEN: usize = KEY_LEN - 1;

/// The common header for all inner nodes
#[derive(Clone, Default)]
pub struct Header {
    /// Number of children of this inner node.
    num_children: u16,
    /// Number of bytes populated in the prefix array.
    prefix_len: u8,
    /// The key prefix for this node.
    prefix: [u8; MAX_PREFIX_LEN],
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("num_children", &self.num_children)
            .field("prefix", &self.read_prefix())
            .finish()
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.num_children == other.num_children && self.read_prefix() == other.read_prefix()
    }
}

impl Eq for Header {}

impl Header {
    /// Create a new `Header` for an empty node with the given prefix.
    ///
    /// # Panics
    ///
    ///  - Panics if the prefix is longer than [`MAX_PREFIX_LEN`].
    pub fn new(prefix: &[u8]) -> Self {
        let mut header = Header::empty();
        header.extend_prefix(prefix);
        header
    }

    /// Create a new `Header` for an empty node.
    pub fn empty() -> Self {
        Header {
            num_children: 0,
            prefix_len: 0,
            prefix: [0; MAX_PREFIX_LEN],
        }
    }

    /// Write prefix bytes to this header, appending to existing bytes if
    /// present.
    ///
    /// # Panics
    ///
    ///  - Panics if the resulting prefix is longer than [`MAX_PREFIX_LEN`].
    pub fn extend_prefix(&mut self, new_bytes: &[u8]) {
        let old_len = self.prefix_len();
        let new_len = old_len + new_bytes.len();
        assert!(
            new_len <= MAX_PREFIX_LEN,
            "prefix of [{new_len}] bytes does not fit in a header"
        );

        self.prefix[old_len..new_len].copy_from_slice(new_bytes);
        self.prefix_len = new_len as u8;
    }

    /// Write bytes to the start of the key prefix.
    ///
    /// # Panics
    ///
    ///  - Panics if the resulting prefix is longer than [`MAX_PREFIX_LEN`].
    pub fn prepend_prefix(&mut self, new_bytes: &[u8]) {
        let old_len = self.prefix_len();
        let new_len = old_len + new_bytes.len();
        assert!(
            new_len <= MAX_PREFIX_LEN,
            "prefix of [{new_len}] bytes does not fit in a header"
        );

        self.prefix.copy_within(0..old_len, new_bytes.len());
        self.prefix[..new_bytes.len()].copy_from_slice(new_bytes);
        self.prefix_len = new_len as u8;
    }

    /// Remove the specified number of bytes from the start of the prefix.
    ///
    /// # Panics
    ///
    ///  - Panics if the number of bytes to remove is greater than the prefix
    ///    size.
    pub fn ltrim_by(&mut self, num_bytes: usize) {
        let old_len = self.prefix_len();
        assert!(
            num_bytes <= old_len,
            "cannot trim [{num_bytes}] bytes from a prefix of [{old_len}] bytes"
        );

        self.prefix.copy_within(num_bytes..old_len, 0);
        self.prefix_len = (old_len - num_bytes) as u8;
    }

    /// Read the initialized portion of the prefix present in the header.
    pub fn read_prefix(&self) -> &[u8] {
        &self.prefix[..self.prefix_len()]
    }

    /// Return the number of bytes in the prefix.
    pub fn prefix_len(&self) -> usize {
        usize::from(self.prefix_len)
    }

    /// Compares the compressed path of a node with the key and returns the
    /// number of equal bytes.
    pub fn match_prefix(&self, possible_key: &[u8]) -> usize {
        common_prefix_len(self.read_prefix(), possible_key)
    }

    /// Return the number of children of this node.
    pub fn num_children(&self) -> usize {
        usize::from(self.num_children)
    }

    /// Modify the number of children of this node.
    ///
    /// # Panics
    ///
    /// This method will panic if the given `num_children` is larger than 256.
    pub fn set_num_children(&mut self, num_children: usize) {
        assert!(
            num_children <= 256,
            "The new number of children [{num_children}] is greater than 256"
        );

        self.num_children = num_children as u16;
    }

    /// Increase the number of children of this node by 1.
    ///
    /// # Panics
    ///
    /// This method will panic if the current number of children is 256.
    pub fn inc_num_children(&mut self) {
        assert!(
            self.num_children < 256,
            "Increment would overflow num_children, since it is currently 256"
        );

        self.num_children += 1;
    }

    /// Decrease the number of children of this node by 1.
    ///
    /// # Panics
    ///
    /// This method will panic if the current number of children is 0.
    pub fn dec_num_children(&mut self) {
        assert!(
            self.num_children > 0,
            "Decrement would overflow num_children, since it is currently 0"
        );

        self.num_children -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_editing() {
        let mut header = Header::new(&[3, 4]);
        assert_eq!(header.read_prefix(), &[3, 4]);

        header.prepend_prefix(&[1, 2]);
        assert_eq!(header.read_prefix(), &[1, 2, 3, 4]);
        assert_eq!(header.prefix_len(), 4);

        header.ltrim_by(3);
        assert_eq!(header.read_prefix(), &[4]);

        header.extend_prefix(&[5, 6]);
        assert_eq!(header.read_prefix(), &[4, 5, 6]);

        header.ltrim_by(3);
        assert_eq!(header.read_prefix(), &[] as &[u8]);
    }

    #[test]
    fn match_prefix_stops_at_mismatch() {
        let header = Header::new(&[1, 2, 3]);
        assert_eq!(header.match_prefix(&[1, 2, 3, 4, 5]), 3);
        assert_eq!(header.match_prefix(&[1, 2, 9]), 2);
        assert_eq!(header.match_prefix(&[1]), 1);
        assert_eq!(header.match_prefix(&[]), 0);
    }

    #[test]
    #[should_panic = "prefix of [6] bytes does not fit in a header"]
    fn prefix_overflow_panics() {
        let mut header = Header::new(&[1, 2, 3, 4]);
        header.prepend_prefix(&[0, 0]);
    }

    #[test]
    #[should_panic = "Decrement would overflow num_children, since it is currently 0"]
    fn decrement_empty_panics() {
        Header::empty().dec_num_children();
    }

    #[test]
    fn child_counts() {
        let mut header = Header::empty();
        header.inc_num_children();
        header.inc_num_children();
        assert_eq!(header.num_children(), 2);
        header.dec_num_children();
        assert_eq!(header.num_children(), 1);
        header.set_num_children(256);
        assert_eq!(header.num_children(), 256);
    }
}
