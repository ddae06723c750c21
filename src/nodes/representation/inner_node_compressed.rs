use crate::{Header, InnerNode, InnerNode48, Node, NodeType, SearchResult};
use std::{array, fmt};

/// Where a write should happen inside the node
enum WritePoint {
    /// In an already existing key fragment
    Existing(usize),
    /// As the last key fragment
    Last(usize),
    /// Shift the key fragments to the right
    Shift(usize),
}

/// Common methods for searching in an [`InnerNodeCompressed`]
trait SearchInnerNodeCompressed {
    /// Get the index of the child if it exists
    fn lookup_child_index(&self, key_fragment: u8) -> Option<usize>;

    /// Find the write point for `key_fragment`
    fn find_write_point(&self, key_fragment: u8) -> WritePoint;
}

/// Node type that has a compact representation for key bytes and children.
///
/// Keys are kept sorted in ascending order, and the child for `keys[i]` is
/// stored in `children[i]`.
#[derive(Clone)]
pub struct InnerNodeCompressed<const SIZE: usize> {
    /// The common node fields.
    pub header: Header,
    /// An array that contains single key bytes in the same index as the
    /// `children` array contains the matching child tree.
    ///
    /// Only the first `header.num_children` values are meaningful.
    keys: [u8; SIZE],
    /// An array that contains the child nodes.
    ///
    /// Exactly the first `header.num_children` values are `Some`.
    children: [Option<Node>; SIZE],
}

impl<const SIZE: usize> fmt::Debug for InnerNodeCompressed<SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keys, children) = self.initialized_portion();
        f.debug_struct("InnerNodeBlock")
            .field("SIZE", &SIZE)
            .field("header", &self.header)
            .field("keys", &keys)
            .field("children", &children)
            .finish()
    }
}

impl<const SIZE: usize> PartialEq for InnerNodeCompressed<SIZE> {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.initialized_portion() == other.initialized_portion()
    }
}

impl<const SIZE: usize> Eq for InnerNodeCompressed<SIZE> {}

impl<const SIZE: usize> InnerNodeCompressed<SIZE> {
    /// Return the initialized portions of the keys and children arrays.
    pub fn initialized_portion(&self) -> (&[u8], &[Option<Node>]) {
        let num_children = self.header.num_children();
        (&self.keys[..num_children], &self.children[..num_children])
    }

    /// Return the sorted key fragments of the children.
    pub fn keys(&self) -> &[u8] {
        &self.keys[..self.header.num_children()]
    }

    fn with_header(header: Header) -> Self {
        InnerNodeCompressed {
            header,
            keys: [0; SIZE],
            children: array::from_fn(|_| None),
        }
    }

    /// Writes a child to the node by check the order of insertion
    ///
    /// # Panics
    ///  - Panics if the node is full and the key fragment is not present.
    fn write_child_inner(&mut self, key_fragment: u8, child: Node)
    where
        Self: SearchInnerNodeCompressed,
    {
        let num_children = self.header.num_children();
        let idx = match self.find_write_point(key_fragment) {
            WritePoint::Existing(child_index) => child_index,
            WritePoint::Last(child_index) => {
                assert!(
                    child_index < SIZE,
                    "cannot write a new child into a full InnerNodeCompressed<{SIZE}>"
                );
                self.header.inc_num_children();
                child_index
            },
            WritePoint::Shift(child_index) => {
                assert!(
                    num_children < SIZE,
                    "cannot write a new child into a full InnerNodeCompressed<{SIZE}>"
                );
                self.keys
                    .copy_within(child_index..num_children, child_index + 1);
                // The slot at `num_children` is empty, rotating moves it to the
                // write position.
                self.children[child_index..=num_children].rotate_right(1);
                self.header.inc_num_children();
                child_index
            },
        };

        self.keys[idx] = key_fragment;
        self.children[idx] = Some(child);
    }

    /// Append a child after all existing children.
    ///
    /// The caller must write children in ascending key order.
    ///
    /// # Panics
    ///  - Panics if the node is full.
    pub(crate) fn push_child(&mut self, key_fragment: u8, child: Node) {
        let idx = self.header.num_children();
        debug_assert!(
            idx == 0 || self.keys[idx - 1] < key_fragment,
            "children must be pushed in ascending key order"
        );
        self.keys[idx] = key_fragment;
        self.children[idx] = Some(child);
        self.header.inc_num_children();
    }

    /// Removes the child at the given slot
    fn remove_child_inner(&mut self, child_index: usize) -> Node {
        let num_children = self.header.num_children();
        assert!(
            child_index < num_children,
            "no child at position [{child_index}], node has [{num_children}] children"
        );

        let child = self.take_child(child_index);

        // Shift all the children and key values in higher indices down by one.
        self.keys
            .copy_within((child_index + 1)..num_children, child_index);
        self.children[child_index..num_children].rotate_left(1);

        self.header.dec_num_children();
        child
    }

    fn take_child(&mut self, child_index: usize) -> Node {
        match self.children[child_index].take() {
            Some(child) => child,
            None => panic!("no child at position [{child_index}]"),
        }
    }

    /// Grows or shrinks the node
    fn change_block_size<const NEW_SIZE: usize>(&mut self) -> InnerNodeCompressed<NEW_SIZE> {
        let num_children = self.header.num_children();
        assert!(
            num_children <= NEW_SIZE,
            "Cannot change InnerNodeCompressed<{}> to size {} when it has more than {} children. \
             Currently has [{}] children.",
            SIZE,
            NEW_SIZE,
            NEW_SIZE,
            num_children
        );

        let mut fresh = InnerNodeCompressed::<NEW_SIZE>::with_header(self.header.clone());
        fresh.keys[..num_children].copy_from_slice(&self.keys[..num_children]);
        for (dest, src) in fresh.children.iter_mut().zip(&mut self.children[..num_children]) {
            *dest = src.take();
        }
        self.header.set_num_children(0);

        fresh
    }

    /// Transform node into a [`InnerNode48`]
    fn grow_node48(&mut self) -> InnerNode48 {
        let num_children = self.header.num_children();
        let mut header = self.header.clone();
        header.set_num_children(0);
        let mut node48 = InnerNode48::from_header(header);

        for child_index in 0..num_children {
            let key_fragment = self.keys[child_index];
            let child = self.take_child(child_index);
            node48.write_child(key_fragment, child);
        }
        self.header.set_num_children(0);

        node48
    }

    fn position_search(&self, key_fragment: u8) -> SearchResult {
        match self.keys().binary_search(&key_fragment) {
            Ok(child_index) => SearchResult::Found(child_index),
            Err(insert_point) => SearchResult::NotFound {
                next_smaller: insert_point.checked_sub(1),
                next_larger: (insert_point < self.header.num_children()).then_some(insert_point),
            },
        }
    }

    fn checked_child_index(&self, pos: usize) -> usize {
        let num_children = self.header.num_children();
        assert!(
            pos < num_children,
            "no child at position [{pos}], node has [{num_children}] children"
        );
        pos
    }

    fn inner_child_at(&self, pos: usize) -> &Node {
        match &self.children[self.checked_child_index(pos)] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn inner_child_at_mut(&mut self, pos: usize) -> &mut Node {
        let pos = self.checked_child_index(pos);
        match &mut self.children[pos] {
            Some(child) => child,
            None => panic!("no child at position [{pos}]"),
        }
    }

    fn inner_next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        let next = pos.map_or(0, |pos| pos + 1);
        (next < self.header.num_children()).then_some(next)
    }

    fn inner_next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        match pos {
            Some(pos) => pos.checked_sub(1),
            None => self.header.num_children().checked_sub(1),
        }
    }
}

/// Node that references between 2 and 4 children
pub type InnerNode4 = InnerNodeCompressed<4>;

impl SearchInnerNodeCompressed for InnerNode4 {
    fn lookup_child_index(&self, key_fragment: u8) -> Option<usize> {
        for (child_index, key) in self.keys().iter().enumerate() {
            if key_fragment == *key {
                return Some(child_index);
            }
        }

        None
    }

    fn find_write_point(&self, key_fragment: u8) -> WritePoint {
        let mut child_index = 0;
        for key in self.keys() {
            #[allow(clippy::comparison_chain)]
            if key_fragment < *key {
                return WritePoint::Shift(child_index);
            } else if key_fragment == *key {
                return WritePoint::Existing(child_index);
            }
            child_index += 1;
        }
        WritePoint::Last(child_index)
    }
}

impl InnerNode4 {
    /// Remove the only remaining child and return it, moving this node's
    /// prefix and the child's key fragment onto the front of the child's
    /// prefix.
    ///
    /// # Panics
    ///  - Panics if this node does not have exactly one child.
    pub(crate) fn collapse(&mut self) -> Node {
        assert_eq!(
            self.header.num_children(),
            1,
            "only a Node4 with a single child can be collapsed"
        );

        let key_fragment = self.keys[0];
        let mut child = self.take_child(0);
        self.header.dec_num_children();

        if let Some(child_header) = child.header_mut() {
            child_header.prepend_prefix(&[key_fragment]);
            child_header.prepend_prefix(self.header.read_prefix());
        }

        child
    }
}

impl InnerNode for InnerNode4 {
    type GrownNode = InnerNode16;
    type ShrunkNode = InnerNode4;

    const TYPE: NodeType = NodeType::Node4;

    fn from_header(header: Header) -> Self {
        Self::with_header(header)
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn get_child_pos(&self, key_fragment: u8) -> Option<usize> {
        self.lookup_child_index(key_fragment)
    }

    fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult {
        self.position_search(key_fragment)
    }

    fn child_key(&self, pos: usize) -> u8 {
        self.keys[self.checked_child_index(pos)]
    }

    fn child_at(&self, pos: usize) -> &Node {
        self.inner_child_at(pos)
    }

    fn child_at_mut(&mut self, pos: usize) -> &mut Node {
        self.inner_child_at_mut(pos)
    }

    fn write_child(&mut self, key_fragment: u8, child: Node) {
        self.write_child_inner(key_fragment, child)
    }

    fn remove_child_at(&mut self, pos: usize) -> Node {
        self.remove_child_inner(pos)
    }

    fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        self.inner_next_larger_pos(pos)
    }

    fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        self.inner_next_smaller_pos(pos)
    }

    fn grow(&mut self) -> Self::GrownNode {
        self.change_block_size()
    }

    fn shrink(&mut self) -> Self::ShrunkNode {
        panic!("unable to shrink a Node4, something went wrong!")
    }
}

/// Node that references between 4 and 16 children
pub type InnerNode16 = InnerNodeCompressed<16>;

impl SearchInnerNodeCompressed for InnerNode16 {
    fn lookup_child_index(&self, key_fragment: u8) -> Option<usize> {
        self.keys().binary_search(&key_fragment).ok()
    }

    fn find_write_point(&self, key_fragment: u8) -> WritePoint {
        match self.keys().binary_search(&key_fragment) {
            Ok(child_index) => WritePoint::Existing(child_index),
            Err(child_index) if child_index == self.header.num_children() => {
                WritePoint::Last(child_index)
            },
            Err(child_index) => WritePoint::Shift(child_index),
        }
    }
}

impl InnerNode for InnerNode16 {
    type GrownNode = InnerNode48;
    type ShrunkNode = InnerNode4;

    const TYPE: NodeType = NodeType::Node16;

    fn from_header(header: Header) -> Self {
        Self::with_header(header)
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn get_child_pos(&self, key_fragment: u8) -> Option<usize> {
        self.lookup_child_index(key_fragment)
    }

    fn get_nearest_child_pos(&self, key_fragment: u8) -> SearchResult {
        self.position_search(key_fragment)
    }

    fn child_key(&self, pos: usize) -> u8 {
        self.keys[self.checked_child_index(pos)]
    }

    fn child_at(&self, pos: usize) -> &Node {
        self.inner_child_at(pos)
    }

    fn child_at_mut(&mut self, pos: usize) -> &mut Node {
        self.inner_child_at_mut(pos)
    }

    fn write_child(&mut self, key_fragment: u8, child: Node) {
        self.write_child_inner(key_fragment, child)
    }

    fn remove_child_at(&mut self, pos: usize) -> Node {
        self.remove_child_inner(pos)
    }

    fn next_larger_pos(&self, pos: Option<usize>) -> Option<usize> {
        self.inner_next_larger_pos(pos)
    }

    fn next_smaller_pos(&self, pos: Option<usize>) -> Option<usize> {
        self.inner_next_smaller_pos(pos)
    }

    fn grow(&mut self) -> Self::GrownNode {
        self.grow_node48()
    }

    fn shrink(&mut self) -> Self::ShrunkNode {
        self.change_block_size()
    }
}
