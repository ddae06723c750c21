use crate::{Header, InnerNode, InnerNode48, Node, NodeType, SearchResult};
use std::{array, fmt};

/// Node that references between 37 and 256 children
///
/// Positions in this node are key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct InnerNode256 {
    /// The common node fields.
    pub header: Header,
    /// Bit `j` of word `i` is set when the child for key byte `i * 64 + j`
    /// is present.
    bitmap: [u64; 4],
    /// An array that directly maps a key byte (as index) to a child node.
    children: [Option<Node>; 256],
}

impl fmt::Debug for InnerNode256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<(usize, &Node)> = self
            .children
            .iter()
            .enumerate()
            .filter_map(|(key, child)| child.as_ref().map(|child| (key, child)))
            .collect();

        f.debug_struct("InnerNode256")
            .field("header", &self.header)
            .field("bitmap", &self.bitmap)
            .field("children", &children)
            .finish()
    }
}

/// Return the lowest set bit position that is `>= from`.
fn next_set_bit(bitmap: &[u64; 4], from: usize) -> Option<usize> {
    if from >= 256 {
        return None;
    }

    let mut word_idx = from / 64;
    let mut word = bitmap[word_idx] & (u64::MAX << (from % 64));
    loop {
        if word != 0 {
            return Some(word_idx * 64 + word.trailing_zeros() as usize);
        }
        word_idx += 1;
        if word_idx == bitmap.len() {
            return None;
        }
        word = bitmap[word_idx];
    }
}

/// Return the highest set bit position that is `< until`.
fn prev_set_bit(bitmap: &[u64; 4], until: usize) -> Option<usize> {
    let last = until.min(256).checked_sub(1)?;

    let mut word_idx = last / 64;
    let mut word = bitmap[word_idx] & (u64::MAX >> (63 - last % 64));
    loop {
        if word != 0 {
            return Some(word_idx * 64 + 63 - word.leading_zeros() as usize);
        }
        word_idx = word_idx.checked_sub(1)?;
        word = bitmap[word_idx];
    }
}

impl InnerNode256 {
    /// Return the occupancy bitmap of this node.
    pub fn bitmap(&self) -> &[u64; 4] {
        &self.bitmap
    }

    fn set_bit(&mut self, key_fragment: u8) {
        let idx = usize::from(key_fragment);
        self.bitmap[idx / 64] |= 1 << (idx % 64);
    }

    fn clear_bit(&mut self, key_fragment: u8) {
        let idx = usize::from(key_fragment);
        self.bitmap[idx / 64] &= !(1 << (idx % 64));
    }

    fn has_child(&self, pos: usize) -> bool {
        pos < 256 && self.bitmap[pos / 64] & (1 << (pos % 64)) != 0
    }

    fn take_children_in_order(&mut self) -> impl Iterator<Item = (u8, Node)> + '_ {
        self.bitmap = [0; 4];
        self.header.set_num_children(0);

        (0..=u8::MAX)
            .zip(self.children.iter_mut())
            .filter_map(|(key, child)| child.take().map(|child| (key, child)))
    }
}

impl InnerNode for InnerNode256 {
    type GrownNode = Self;
    type ShrunkNode = InnerNode48;

    const TYPE: NodeType = NodeType::Node256;

    fn from_header(header: Header) -> Self {
        InnerNode256 {
            header,
            bitmap: [0; 4],
            children: array::from_fn(|_| None),
        }
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn get_child_pos(&self, key_fragment: u8) -> Option<usize> {
        let pos = usize::from(key_fragment);
        self.has_child(pos).then_some(pos)
    }

    fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult {
        let pos = usize::from(key_fragment);
        if self.has_child(pos) {
            SearchResult::Found(pos)
        } else {
            SearchResult::NotFound {
                next_smaller: prev_set_bit(&self.bitmap, pos),
                next_larger: next_set_bit(&self.bitmap, pos + 1),
            }
        }
    }

    fn child_key(&self, pos: usize) -> u8 {
        u8::try_from(pos).unwrap_or_else(|_| panic!("position [{pos}] is not a key byte"))
    }

    fn child_at(&self, pos: usize) -> &Node {
        match &self.children[pos] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn child_at_mut(&mut self, pos: usize) -> &mut Node {
        match &mut self.children[pos] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn write_child(&mut self, key_fragment: u8, child: Node) {
        let existing = self.children[usize::from(key_fragment)].replace(child);
        if existing.is_none() {
            self.set_bit(key_fragment);
            self.header.inc_num_children();
        }
    }

    fn remove_child_at(&mut self, pos: usize) -> Node {
        let key_fragment = self.child_key(pos);
        match self.children[pos].take() {
            Some(child) => {
                self.clear_bit(key_fragment);
                self.header.dec_num_children();
                child
            },
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        next_set_bit(&self.bitmap, pos.map_or(0, |pos| pos + 1))
    }

    fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        prev_set_bit(&self.bitmap, pos.unwrap_or(256))
    }

    fn grow(&mut self) -> Self::GrownNode {
        panic!("unable to grow a Node256, something went wrong!")
    }

    fn shrink(&mut self) -> Self::ShrunkNode {
        assert!(
            self.header.num_children() <= 48,
            "Cannot shrink a Node256 when it has more than 48 children. Currently has [{}] \
             children.",
            self.header.num_children()
        );

        let mut header = self.header.clone();
        header.set_num_children(0);
        let mut node48 = InnerNode48::from_header(header);

        for (key_fragment, child) in self.take_children_in_order() {
            node48.write_child(key_fragment, child);
        }

        node48
    }
}
