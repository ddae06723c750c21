use crate::{Art, Backward, Containers, Direction, Forward, Key, LeafNode, Node, Shuttle};
use std::iter::FusedIterator;

/// An iterator over the leaves of an [`Art`], in the order given by `D`.
///
/// Created by [`Art::iter`] and [`Art::iter_rev`].
#[derive(Debug, Clone)]
pub struct Iter<'a, D: Direction> {
    root: Option<&'a Node>,
    shuttle: Shuttle<D>,
}

impl<'a, D: Direction> Iter<'a, D> {
    pub(crate) fn new(root: Option<&'a Node>) -> Self {
        let mut shuttle = Shuttle::new();
        shuttle.init(root);
        Iter { root, shuttle }
    }
}

impl<D: Direction> Iterator for Iter<'_, D> {
    type Item = LeafNode;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.shuttle.move_to_next_leaf(self.root) {
            return None;
        }
        self.shuttle.current_leaf(self.root)
    }
}

impl<D: Direction> FusedIterator for Iter<'_, D> {}

/// A shuttle whose direction is picked at runtime.
#[derive(Debug, Clone)]
enum DirectedShuttle {
    Forward(Shuttle<Forward>),
    Backward(Shuttle<Backward>),
}

macro_rules! dispatch {
    ($shuttle:expr, $inner:ident => $body:expr) => {
        match $shuttle {
            DirectedShuttle::Forward($inner) => $body,
            DirectedShuttle::Backward($inner) => $body,
        }
    };
}

impl DirectedShuttle {
    fn new(reverse: bool) -> Self {
        if reverse {
            DirectedShuttle::Backward(Shuttle::new())
        } else {
            DirectedShuttle::Forward(Shuttle::new())
        }
    }

    fn init(&mut self, root: Option<&Node>) {
        dispatch!(self, shuttle => shuttle.init(root))
    }

    fn init_from(&mut self, root: Option<&Node>, key: &Key) {
        dispatch!(self, shuttle => shuttle.init_from(root, key))
    }

    fn move_to_next_leaf(&mut self, root: Option<&Node>) -> bool {
        dispatch!(self, shuttle => shuttle.move_to_next_leaf(root))
    }

    fn current_leaf(&self, root: Option<&Node>) -> Option<LeafNode> {
        dispatch!(self, shuttle => shuttle.current_leaf(root))
    }

    fn remove(&mut self, root: &mut Option<Node>) -> Option<LeafNode> {
        dispatch!(self, shuttle => shuttle.remove(root))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// The shuttle sits on a leaf that has not been returned yet.
    Ready,
    /// The shuttle sits on the leaf returned last.
    Yielded,
    /// The leaf returned last was removed.
    Removed,
    Exhausted,
}

/// A cursor over the leaves of an [`Art`] that can peek, seek and remove.
///
/// Created by [`Art::leaf_node_iterator`] and
/// [`Art::leaf_node_iterator_from`].
///
/// # Examples
///
/// ```rust
/// use roaring_art::Art;
///
/// let mut art = Art::new();
/// for last in 0..4u8 {
///     art.insert([0, 0, 0, 0, 0, last], u64::from(last));
/// }
///
/// let mut cursor = art.leaf_node_iterator(false, None);
/// while let Some(leaf) = cursor.next() {
///     if leaf.container_idx() % 2 == 0 {
///         cursor.remove();
///     }
/// }
///
/// let remaining: Vec<_> = art.iter().map(|leaf| leaf.container_idx()).collect();
/// assert_eq!(remaining, [1, 3]);
/// ```
#[derive(Debug)]
pub struct LeafNodeIterator<'a> {
    art: &'a mut Art,
    containers: Option<&'a mut Containers>,
    shuttle: DirectedShuttle,
    state: CursorState,
}

impl<'a> LeafNodeIterator<'a> {
    pub(crate) fn new(
        art: &'a mut Art,
        reverse: bool,
        containers: Option<&'a mut Containers>,
    ) -> Self {
        let mut shuttle = DirectedShuttle::new(reverse);
        shuttle.init(art.root.as_ref());
        let state = Self::landing_state(&mut shuttle, art.root.as_ref());

        LeafNodeIterator {
            art,
            containers,
            shuttle,
            state,
        }
    }

    /// The first move after an init reports the leaf the shuttle landed on.
    fn landing_state(shuttle: &mut DirectedShuttle, root: Option<&Node>) -> CursorState {
        if shuttle.move_to_next_leaf(root) {
            CursorState::Ready
        } else {
            CursorState::Exhausted
        }
    }

    fn advance(&mut self) {
        match self.state {
            CursorState::Ready | CursorState::Exhausted => {},
            CursorState::Yielded | CursorState::Removed => {
                self.state = if self.shuttle.move_to_next_leaf(self.art.root.as_ref()) {
                    CursorState::Ready
                } else {
                    CursorState::Exhausted
                };
            },
        }
    }

    /// Return the leaf the next call to [`Iterator::next`] returns, without
    /// consuming it.
    ///
    /// After a peek, [`LeafNodeIterator::remove`] does nothing until the
    /// cursor is advanced again.
    pub fn peek_next(&mut self) -> Option<LeafNode> {
        self.advance();
        match self.state {
            CursorState::Ready => self.shuttle.current_leaf(self.art.root.as_ref()),
            _ => None,
        }
    }

    /// Move the cursor to `key`, or to the first leaf after `key` in scan
    /// order if `key` is absent.
    pub fn seek(&mut self, key: &Key) {
        let root = self.art.root.as_ref();
        self.shuttle.init_from(root, key);
        self.state = Self::landing_state(&mut self.shuttle, root);
    }

    /// Remove the leaf returned by the last call to [`Iterator::next`] and
    /// return it.
    ///
    /// The container of the leaf is removed from the registry as well, if the
    /// cursor was created with one. Returns `None` if there is no such leaf,
    /// or if it was already removed.
    pub fn remove(&mut self) -> Option<LeafNode> {
        if self.state != CursorState::Yielded {
            return None;
        }

        let leaf = self.shuttle.remove(&mut self.art.root)?;
        self.art.key_size = self.art.key_size.saturating_sub(1);
        if let Some(containers) = self.containers.as_deref_mut() {
            containers.remove(leaf.container_idx());
        }
        self.state = CursorState::Removed;
        Some(leaf)
    }
}

impl Iterator for LeafNodeIterator<'_> {
    type Item = LeafNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance();
        if self.state != CursorState::Ready {
            return None;
        }

        self.state = CursorState::Yielded;
        self.shuttle.current_leaf(self.art.root.as_ref())
    }
}

impl FusedIterator for LeafNodeIterator<'_> {}

/// An ascending iterator over the keys of an [`Art`].
///
/// Created by [`Art::key_iterator`].
#[derive(Debug)]
pub struct KeyIterator<'a> {
    leaves: LeafNodeIterator<'a>,
    current: Option<LeafNode>,
}

impl<'a> KeyIterator<'a> {
    pub(crate) fn new(leaves: LeafNodeIterator<'a>) -> Self {
        KeyIterator {
            leaves,
            current: None,
        }
    }

    /// Return the container index of the key returned last.
    pub fn current_container_idx(&self) -> Option<u64> {
        self.current.map(|leaf| leaf.container_idx())
    }

    /// Remove the key returned last, along with its container, and return
    /// its container index.
    pub fn remove(&mut self) -> Option<u64> {
        self.current = None;
        self.leaves.remove().map(|leaf| leaf.container_idx())
    }
}

impl Iterator for KeyIterator<'_> {
    type Item = Key;

    fn next(&mut self) -> Option<Self::Item> {
        self.current = self.leaves.next();
        self.current.map(|leaf| leaf.key())
    }
}

impl FusedIterator for KeyIterator<'_> {}
