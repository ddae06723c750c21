use crate::{Header, InnerNode, InnerNode16, InnerNode256, Node, NodeType, SearchResult};
use std::{array, fmt};

/// A restricted index only valid from 0 to LIMIT - 1.
///
/// The value `LIMIT` marks an unoccupied entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct RestrictedNodeIndex<const LIMIT: u8>(u8);

impl<const LIMIT: u8> RestrictedNodeIndex<LIMIT> {
    /// A placeholder index value that indicates that the index is not occupied
    pub const EMPTY: Self = RestrictedNodeIndex(LIMIT);

    /// Create an index for `slot`, or `None` if it is out of range.
    pub fn new(slot: usize) -> Option<Self> {
        (slot < usize::from(LIMIT)).then_some(RestrictedNodeIndex(slot as u8))
    }

    /// Decode a raw index byte. Every value at or above `LIMIT` is empty.
    pub fn from_raw(raw: u8) -> Self {
        if raw < LIMIT {
            RestrictedNodeIndex(raw)
        } else {
            Self::EMPTY
        }
    }

    /// Return true if the given index is the empty sentinel value
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// Return the slot this index points to, if occupied.
    pub fn slot(self) -> Option<usize> {
        (!self.is_empty()).then_some(usize::from(self.0))
    }
}

impl<const LIMIT: u8> From<RestrictedNodeIndex<LIMIT>> for u8 {
    fn from(src: RestrictedNodeIndex<LIMIT>) -> Self {
        src.0
    }
}

/// Node that references between 13 and 48 children
///
/// Positions in this node are key bytes.
#[derive(Clone)]
pub struct InnerNode48 {
    /// The common node fields.
    pub header: Header,
    /// An array that maps key bytes (as the index) to the index value in the
    /// `children` array.
    child_indices: [RestrictedNodeIndex<48>; 256],
    /// A slot is `Some` exactly when an entry of `child_indices` points to it.
    children: [Option<Node>; 48],
}

impl fmt::Debug for InnerNode48 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupied: Vec<(u8, u8)> = (0..=u8::MAX)
            .filter_map(|key| {
                let index = self.child_indices[usize::from(key)];
                (!index.is_empty()).then(|| (key, u8::from(index)))
            })
            .collect();

        f.debug_struct("InnerNode48")
            .field("header", &self.header)
            .field("child_indices", &occupied)
            .field("children", &self.children)
            .finish()
    }
}

/// Two nodes are equal when they map the same key bytes to equal children,
/// regardless of which slots the children occupy.
impl PartialEq for InnerNode48 {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.iter().eq(other.iter())
    }
}

impl Eq for InnerNode48 {}

impl InnerNode48 {
    /// Return the raw index array, one byte per key byte, with `48` for
    /// absent children.
    pub fn child_indices(&self) -> [u8; 256] {
        self.child_indices.map(u8::from)
    }

    /// Rebuild a node from a decoded index array, reading the child for each
    /// occupied key byte in ascending key order.
    ///
    /// `read_child` receives the key byte and slot of each occupied entry.
    /// Index bytes at or above 48 are treated as empty. A slot referenced by
    /// two key bytes is reported through `on_duplicate`.
    pub(crate) fn try_from_indices<E>(
        header: Header,
        raw_indices: &[u8; 256],
        mut read_child: impl FnMut(u8) -> Result<Node, E>,
        on_duplicate: impl Fn(u8, u8) -> E,
    ) -> Result<Self, E> {
        let mut node = InnerNode48::from_header(header);
        node.header.set_num_children(0);

        for (key, raw) in (0..=u8::MAX).zip(raw_indices.iter().copied()) {
            let index = RestrictedNodeIndex::<48>::from_raw(raw);
            let Some(slot) = index.slot() else {
                continue;
            };
            if node.children[slot].is_some() {
                return Err(on_duplicate(key, raw));
            }

            node.children[slot] = Some(read_child(key)?);
            node.child_indices[usize::from(key)] = index;
            node.header.inc_num_children();
        }

        Ok(node)
    }

    fn slot_of(&self, pos: usize) -> usize {
        match self.child_indices[pos].slot() {
            Some(slot) => slot,
            None => panic!("no child at position [{pos}]"),
        }
    }

    /// Pick the slot for a new child: the slot after the last one used when
    /// it is free, otherwise the first free slot.
    fn free_slot(&self) -> usize {
        let num_children = self.header.num_children();
        if self.children[num_children].is_none() {
            return num_children;
        }

        match self.children.iter().position(Option::is_none) {
            Some(slot) => slot,
            None => panic!("node is full"),
        }
    }

    fn take_children_in_order(&mut self) -> impl Iterator<Item = (u8, Node)> + '_ {
        let Self {
            child_indices,
            children,
            header,
        } = self;
        header.set_num_children(0);

        (0..=u8::MAX).filter_map(move |key| {
            let index = std::mem::replace(
                &mut child_indices[usize::from(key)],
                RestrictedNodeIndex::EMPTY,
            );
            let slot = index.slot()?;
            children[slot].take().map(|child| (key, child))
        })
    }
}

impl InnerNode for InnerNode48 {
    type GrownNode = InnerNode256;
    type ShrunkNode = InnerNode16;

    const TYPE: NodeType = NodeType::Node48;

    fn from_header(header: Header) -> Self {
        InnerNode48 {
            header,
            child_indices: [RestrictedNodeIndex::<48>::EMPTY; 256],
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
        (!self.child_indices[pos].is_empty()).then_some(pos)
    }

    fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult {
        match self.get_child_pos(key_fragment) {
            Some(pos) => SearchResult::Found(pos),
            None => {
                let pos = usize::from(key_fragment);
                SearchResult::NotFound {
                    next_smaller: self.next_smaller_pos(Some(pos)),
                    next_larger: self.next_larger_pos(Some(pos)),
                }
            },
        }
    }

    fn child_key(&self, pos: usize) -> u8 {
        u8::try_from(pos).unwrap_or_else(|_| panic!("position [{pos}] is not a key byte"))
    }

    fn child_at(&self, pos: usize) -> &Node {
        match &self.children[self.slot_of(pos)] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn child_at_mut(&mut self, pos: usize) -> &mut Node {
        let slot = self.slot_of(pos);
        match &mut self.children[slot] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn write_child(&mut self, key_fragment: u8, child: Node) {
        let key_fragment_idx = usize::from(key_fragment);
        let slot = match self.child_indices[key_fragment_idx].slot() {
            // overwrite existing
            Some(slot) => slot,
            None => {
                assert!(
                    self.header.num_children() < self.children.len(),
                    "node is full"
                );
                let slot = self.free_slot();
                self.child_indices[key_fragment_idx] = RestrictedNodeIndex::new(slot)
                    .unwrap_or_else(|| panic!("slot [{slot}] is out of range for a Node48"));
                self.header.inc_num_children();
                slot
            },
        };

        self.children[slot] = Some(child);
    }

    fn remove_child_at(&mut self, pos: usize) -> Node {
        let slot = self.slot_of(pos);
        self.child_indices[pos] = RestrictedNodeIndex::EMPTY;
        self.header.dec_num_children();

        match self.children[slot].take() {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        let start = pos.map_or(0, |pos| pos + 1);
        (start..256).find(|&pos| !self.child_indices[pos].is_empty())
    }

    fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        let end = pos.unwrap_or(256);
        (0..end).rev().find(|&pos| !self.child_indices[pos].is_empty())
    }

    fn grow(&mut self) -> Self::GrownNode {
        let mut header = self.header.clone();
        header.set_num_children(0);
        let mut node256 = InnerNode256::from_header(header);

        for (key_fragment, child) in self.take_children_in_order() {
            node256.write_child(key_fragment, child);
        }

        node256
    }

    fn shrink(&mut self) -> Self::ShrunkNode {
        assert!(
            self.header.num_children() <= 16,
            "Cannot shrink a Node48 when it has more than 16 children. Currently has [{}] \
             children.",
            self.header.num_children()
        );

        let mut header = self.header.clone();
        header.set_num_children(0);
        let mut node16 = InnerNode16::from_header(header);

        for (key_fragment, child) in self.take_children_in_order() {
            node16.push_child(key_fragment, child);
        }

        node16
    }
}
