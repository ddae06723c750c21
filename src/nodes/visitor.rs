//! Utilities for inspecting the trie structure.

mod tree_stats;
mod well_formed;

use crate::{InnerNode, InnerNode16, InnerNode256, InnerNode4, InnerNode48, LeafNode, Node};
pub use tree_stats::*;
pub use well_formed::*;

/// The `Visitable` trait allows [`Visitor`]s to traverse the structure of the
/// implementing type and produce some output.
pub trait Visitable {
    /// This function provides the default traversal behavior for the
    /// implementing type.
    ///
    /// The implementation should call `visit_with(visitor)` for all relevant
    /// sub-fields of the type. If there are no relevant sub-fields, it should
    /// just produce the default output.
    fn super_visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output;

    /// This function will traverse the implementing type and execute any
    /// specific logic from the given [`Visitor`].
    ///
    /// Types that have a matching hook in [`Visitor`] override this to call
    /// it, for example [`InnerNode4`] calls `visitor.visit_node4(self)`.
    fn visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        self.super_visit_with(visitor)
    }
}

impl Visitable for Node {
    fn super_visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Node::Node4(inner) => inner.visit_with(visitor),
            Node::Node16(inner) => inner.visit_with(visitor),
            Node::Node48(inner) => inner.visit_with(visitor),
            Node::Node256(inner) => inner.visit_with(visitor),
            Node::Leaf(leaf) => leaf.visit_with(visitor),
        }
    }
}

macro_rules! visitable_inner_node {
    ($($inner:ty => $hook:ident),*) => {
        $(
            impl Visitable for $inner {
                fn super_visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
                    combine_inner_node_child_output(self.iter(), visitor)
                }

                fn visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
                    visitor.$hook(self)
                }
            }
        )*
    };
}

visitable_inner_node!(
    InnerNode4 => visit_node4,
    InnerNode16 => visit_node16,
    InnerNode48 => visit_node48,
    InnerNode256 => visit_node256
);

impl Visitable for LeafNode {
    fn super_visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.default_output()
    }

    fn visit_with<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_leaf(self)
    }
}

/// The `Visitor` trait allows creating new operations on the radix tree by
/// overriding specific handling methods for each of the node types.
pub trait Visitor: Sized {
    /// The type of value that the visitor produces.
    type Output;

    /// Produce the default value of the [`Self::Output`] type.
    fn default_output(&self) -> Self::Output;

    /// Combine two instances of the [`Self::Output`] type for this [`Visitor`].
    fn combine_output(&self, o1: Self::Output, o2: Self::Output) -> Self::Output;

    /// Visit a [`InnerNode4`].
    fn visit_node4(&mut self, t: &InnerNode4) -> Self::Output {
        t.super_visit_with(self)
    }

    /// Visit a [`InnerNode16`].
    fn visit_node16(&mut self, t: &InnerNode16) -> Self::Output {
        t.super_visit_with(self)
    }

    /// Visit a [`InnerNode48`].
    fn visit_node48(&mut self, t: &InnerNode48) -> Self::Output {
        t.super_visit_with(self)
    }

    /// Visit a [`InnerNode256`].
    fn visit_node256(&mut self, t: &InnerNode256) -> Self::Output {
        t.super_visit_with(self)
    }

    /// Visit a [`LeafNode`].
    fn visit_leaf(&mut self, t: &LeafNode) -> Self::Output {
        t.super_visit_with(self)
    }
}

fn combine_inner_node_child_output<'a, V: Visitor>(
    mut iter: impl Iterator<Item = (u8, &'a Node)>,
    visitor: &mut V,
) -> V::Output {
    if let Some((_, first)) = iter.next() {
        let mut accum = first.visit_with(visitor);
        for (_, child) in iter {
            let output = child.visit_with(visitor);
            accum = visitor.combine_output(accum, output);
        }

        accum
    } else {
        visitor.default_output()
    }
}
