use crate::{
    visitor::{Visitable, Visitor},
    Art, InnerNode, InnerNode16, InnerNode256, InnerNode4, InnerNode48, LeafNode, NodeType,
};
use std::{fmt, mem, ops::RangeInclusive};

/// A visitor of the radix tree which collects statistics about the tree, like
/// how many inner nodes of each type, how many leaves
#[derive(Debug)]
pub struct TreeStatsCollector {
    stats: TreeStats,
    depth: usize,
}

impl TreeStatsCollector {
    /// Run the tree stats collection on the given tree, then return the
    /// accumulated stats.
    pub fn collect(tree: &Art) -> TreeStats {
        let mut collector = TreeStatsCollector {
            stats: TreeStats::new(),
            depth: 0,
        };

        if let Some(root) = tree.root() {
            root.visit_with(&mut collector);
        }

        collector.stats
    }

    fn visit_inner_node<N>(&mut self, t: &N)
    where
        N: InnerNode + Visitable,
    {
        self.depth += 1;
        t.super_visit_with(self);
        self.depth -= 1;

        let num_children = t.header().num_children();
        let dist = match N::TYPE {
            NodeType::Node4 => &mut self.stats.node4_num_children_dist,
            NodeType::Node16 => &mut self.stats.node16_num_children_dist,
            NodeType::Node48 => &mut self.stats.node48_num_children_dist,
            NodeType::Node256 => &mut self.stats.node256_num_children_dist,
            NodeType::Leaf => unreachable!("leaves are not inner nodes"),
        };
        dist.record(num_children);
        self.stats.total_inner_node_bytes += mem::size_of_val(t);
    }
}

/// Collection of stats about the number of nodes types present in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStats {
    node4_num_children_dist: ExactHistogram,
    node16_num_children_dist: ExactHistogram,
    node48_num_children_dist: ExactHistogram,
    node256_num_children_dist: ExactHistogram,
    leaf_count: u64,
    max_depth: usize,
    total_inner_node_bytes: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct DisplayAsDebug<'a, T>(&'a T);

        impl<T: fmt::Display> fmt::Debug for DisplayAsDebug<'_, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                <T as fmt::Display>::fmt(self.0, f)
            }
        }

        f.debug_struct("TreeStats")
            .field("node4", &DisplayAsDebug(&self.node4_num_children_dist))
            .field("node16", &DisplayAsDebug(&self.node16_num_children_dist))
            .field("node48", &DisplayAsDebug(&self.node48_num_children_dist))
            .field("node256", &DisplayAsDebug(&self.node256_num_children_dist))
            .field("leaf_count", &self.leaf_count)
            .field("max_depth", &self.max_depth)
            .field("total_inner_node_bytes", &self.total_inner_node_bytes)
            .field("empty_capacity", &self.empty_capacity())
            .finish()
    }
}

impl TreeStats {
    /// Create an empty collection of tree statistics.
    fn new() -> Self {
        Self {
            node4_num_children_dist: ExactHistogram::new(NodeType::Node4.capacity_range()),
            node16_num_children_dist: ExactHistogram::new(NodeType::Node16.capacity_range()),
            node48_num_children_dist: ExactHistogram::new(NodeType::Node48.capacity_range()),
            node256_num_children_dist: ExactHistogram::new(NodeType::Node256.capacity_range()),
            leaf_count: 0,
            max_depth: 0,
            total_inner_node_bytes: 0,
        }
    }

    /// Number of [`InnerNode4`]s present in the tree.
    pub fn node4_count(&self) -> u64 {
        self.node4_num_children_dist.total_count()
    }

    /// Number of [`InnerNode16`]s present in the tree.
    pub fn node16_count(&self) -> u64 {
        self.node16_num_children_dist.total_count()
    }

    /// Number of [`InnerNode48`]s present in the tree.
    pub fn node48_count(&self) -> u64 {
        self.node48_num_children_dist.total_count()
    }

    /// Number of [`InnerNode256`]s present in the tree.
    pub fn node256_count(&self) -> u64 {
        self.node256_num_children_dist.total_count()
    }

    /// Number of [`LeafNode`]s present in the tree.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// The largest number of inner nodes above any leaf.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The number of empty slots in inner nodes, that could potentially contain
    /// a leaf node.
    ///
    /// This value is useful to measure occupancy in the tree, and how much
    /// space is potentially wasted.
    pub fn empty_capacity(&self) -> u64 {
        [
            (&self.node4_num_children_dist, NodeType::Node4),
            (&self.node16_num_children_dist, NodeType::Node16),
            (&self.node48_num_children_dist, NodeType::Node48),
            (&self.node256_num_children_dist, NodeType::Node256),
        ]
        .into_iter()
        .flat_map(|(dist, node_type)| {
            let capacity = node_type.upper_capacity() as u64;
            dist.entries()
                .map(move |(value, count)| count * (capacity - value))
        })
        .sum()
    }

    /// The total number of bytes used by inner nodes.
    pub fn total_inner_node_bytes(&self) -> usize {
        self.total_inner_node_bytes
    }
}

impl Visitor for TreeStatsCollector {
    type Output = ();

    fn default_output(&self) -> Self::Output {}

    fn combine_output(&self, _: Self::Output, _: Self::Output) -> Self::Output {}

    fn visit_node4(&mut self, t: &InnerNode4) -> Self::Output {
        self.visit_inner_node(t);
    }

    fn visit_node16(&mut self, t: &InnerNode16) -> Self::Output {
        self.visit_inner_node(t);
    }

    fn visit_node48(&mut self, t: &InnerNode48) -> Self::Output {
        self.visit_inner_node(t);
    }

    fn visit_node256(&mut self, t: &InnerNode256) -> Self::Output {
        self.visit_inner_node(t);
    }

    fn visit_leaf(&mut self, _t: &LeafNode) -> Self::Output {
        self.stats.leaf_count += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
    }
}

/// This represents a discrete distribution of data with one bucket per value
/// in a fixed range.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExactHistogram {
    value_range: RangeInclusive<usize>,
    counts: Vec<u64>,
    total_count: u64,
}

impl fmt::Display for ExactHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entries(self.entries().filter(|(_, count)| *count != 0));
        map.entry(&"total", &self.total_count());
        map.finish()
    }
}

impl ExactHistogram {
    /// Create a new histogram that will accept the given range of values.
    fn new(value_range: RangeInclusive<usize>) -> ExactHistogram {
        let num_values = value_range.end() - value_range.start() + 1;
        Self {
            value_range,
            counts: vec![0; num_values],
            total_count: 0,
        }
    }

    /// Record a value in the histogram, incrementing its count by 1.
    ///
    /// # Panics
    ///
    /// This method will panic if the given value is not in the `value_range`
    /// that this histogram was created with.
    fn record(&mut self, value: usize) {
        assert!(
            self.value_range.contains(&value),
            "Value was not in expected range [{:?}]: {value}",
            self.value_range,
        );

        self.counts[value - self.value_range.start()] += 1;
        self.total_count += 1;
    }

    /// Return an iterator over the pairs of `(value, count)`, including
    /// `count`s of 0.
    fn entries(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        let start = *self.value_range.start();
        self.counts
            .iter()
            .enumerate()
            .map(move |(idx, count)| ((start + idx) as u64, *count))
    }

    /// Return the total number of recorded values
    fn total_count(&self) -> u64 {
        self.total_count
    }
}
