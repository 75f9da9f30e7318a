//! The hierarchy aggregate handed to downstream consumers.
//!
//! Wraps a built, sorted [`NodeSet`] together with the label histogram of its
//! instances:
//!
//! ```text
//! root ─► nodes[0..n]   sorted by identifier
//!         classes[0..k] distinct true-class labels, sorted by identifier
//!         counts[0..k]  instances per label
//!         total         instances across all nodes
//! ```

use core::fmt;
use std::collections::{BTreeMap, VecDeque};

use super::builder::{BuiltTree, HierarchyBuilder};
use super::node::{Instance, Node, NodeIdx};
use super::tree::NodeSet;
use crate::error::Result;
use crate::id::{self, IdKey, ROOT_ID};

/// A complete hierarchy with its label histogram.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: NodeSet,
    root: NodeIdx,
    classes: Vec<String>,
    class_counts: Vec<usize>,
    instance_count: usize,
    data_names: Option<Vec<String>>,
}

impl Hierarchy {
    /// Wrap a built tree, tallying true-class labels over every instance.
    ///
    /// Instances without a label count toward the total only.
    pub fn new(built: BuiltTree) -> Self {
        let BuiltTree { nodes, root, .. } = built;

        let mut histogram: BTreeMap<IdKey, usize> = BTreeMap::new();
        for instance in nodes.iter().flat_map(Node::instances) {
            if let Some(class) = &instance.true_class {
                *histogram.entry(IdKey::new(class.as_str())).or_default() += 1;
            }
        }

        let (classes, class_counts): (Vec<String>, Vec<usize>) =
            histogram.into_iter().map(|(k, v)| (k.0, v)).unzip();
        let instance_count = nodes.instance_count();

        Self {
            nodes,
            root,
            classes,
            class_counts,
            instance_count,
            data_names: None,
        }
    }

    /// Attach feature column names, one per feature dimension.
    pub fn with_data_names(mut self, names: Vec<String>) -> Self {
        self.data_names = Some(names);
        self
    }

    /// Build `nodes` with `builder` and wrap the result.
    pub fn build(builder: &HierarchyBuilder, nodes: NodeSet, root: Option<NodeIdx>) -> Result<Self> {
        builder.build(nodes, root).map(Self::new)
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Handle of the root node.
    pub fn root_idx(&self) -> NodeIdx {
        self.root
    }

    /// All nodes, sorted by identifier.
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    /// Number of nodes (groups).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Distinct true-class labels, sorted by identifier.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Instance count per label, parallel to [`Hierarchy::classes`].
    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }

    /// Total number of instances.
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Look a node up by identifier.
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.nodes.find_sorted(id).map(|idx| &self.nodes[idx])
    }

    /// Whether a node with this identifier exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.find_sorted(id).is_some()
    }

    /// First instance in node order.
    pub fn first_instance(&self) -> Option<&Instance> {
        self.nodes.iter().flat_map(Node::instances).next()
    }

    /// Feature column names, if the source provided them.
    pub fn data_names(&self) -> Option<&[String]> {
        self.data_names.as_deref()
    }

    /// Number of features per instance, 0 if there are no instances.
    pub fn feature_count(&self) -> usize {
        self.first_instance().map_or(0, Instance::dimension)
    }

    /// Instances labelled `class`.
    ///
    /// With `with_inheritance`, labels naming descendants of `class` count
    /// too (labels are identifiers themselves). `None` if `class` never
    /// occurs.
    pub fn class_count(&self, class: &str, with_inheritance: bool) -> Option<usize> {
        let index = self
            .classes
            .binary_search_by(|c| id::compare(c, class))
            .ok()?;

        let mut count = self.class_counts[index];
        if with_inheritance {
            count += self.classes[index + 1..]
                .iter()
                .zip(&self.class_counts[index + 1..])
                .filter(|(c, _)| id::is_ancestor_of(class, c.as_str()))
                .map(|(_, n)| n)
                .sum::<usize>();
        }
        Some(count)
    }

    /// Number of nodes in the subtree rooted at `idx`, `idx` included.
    pub fn subtree_node_count(&self, idx: NodeIdx) -> usize {
        self.nodes.subtree_size(idx)
    }

    /// A one-node hierarchy: every instance moved under a fresh root.
    pub fn flatten(&self) -> Result<Self> {
        let instances = self.nodes.iter().flat_map(Node::instances).cloned().collect();
        let mut nodes = NodeSet::with_capacity(1);
        let root = nodes.push(Node::with_instances(ROOT_ID, instances)?);
        self.rebuild(nodes, root)
    }

    /// A two-level hierarchy: an empty root whose children are the non-empty
    /// nodes of this one, renumbered `gen.0.0`, `gen.0.1`, … in node order.
    pub fn flat_with_common_root(&self) -> Result<Self> {
        let mut nodes = NodeSet::with_capacity(self.nodes.len() + 1);
        let root = nodes.push(Node::new(ROOT_ID));

        for (k, node) in self.nodes.iter().filter(|n| !n.is_empty()).enumerate() {
            let group = Node::with_instances(id::child_id(ROOT_ID, k), node.instances().to_vec())?;
            let _ = nodes.push(group);
        }
        self.rebuild(nodes, root)
    }

    fn rebuild(&self, nodes: NodeSet, root: NodeIdx) -> Result<Self> {
        let built = HierarchyBuilder::default().build(nodes, Some(root))?;
        Ok(Self {
            nodes: built.nodes,
            root: built.root,
            classes: self.classes.clone(),
            class_counts: self.class_counts.clone(),
            instance_count: self.instance_count,
            data_names: self.data_names.clone(),
        })
    }

    /// Structural statistics, level by level from the root.
    pub fn stats(&self) -> HierarchyStats {
        let mut level_sizes: Vec<usize> = Vec::new();
        let mut leaf_count = 0;
        let mut empty_nodes = 0;
        let mut internal = 0;
        let mut total_children = 0;
        let mut max_fanout = 0;

        let mut queue = VecDeque::from([(self.root, 0usize)]);
        while let Some((idx, depth)) = queue.pop_front() {
            let node = &self.nodes[idx];
            if level_sizes.len() <= depth {
                level_sizes.resize(depth + 1, 0);
            }
            level_sizes[depth] += 1;

            if node.is_empty() {
                empty_nodes += 1;
            }
            let fanout = node.children().len();
            if fanout == 0 {
                leaf_count += 1;
            } else {
                internal += 1;
                total_children += fanout;
                max_fanout = max_fanout.max(fanout);
            }
            queue.extend(node.children().iter().map(|&c| (c, depth + 1)));
        }

        let total_nodes = level_sizes.iter().sum();
        HierarchyStats {
            num_levels: level_sizes.len(),
            level_sizes,
            total_nodes,
            leaf_count,
            empty_nodes,
            avg_fanout: if internal == 0 {
                0.0
            } else {
                total_children as f32 / internal as f32
            },
            max_fanout,
        }
    }

    /// Consume the hierarchy, returning the node set and root handle.
    pub fn into_parts(self) -> (NodeSet, NodeIdx) {
        (self.nodes, self.root)
    }

    fn write_subtree(
        &self,
        f: &mut fmt::Formatter<'_>,
        idx: NodeIdx,
        prefix: &str,
        is_tail: bool,
    ) -> fmt::Result {
        let node = &self.nodes[idx];
        writeln!(f, "{prefix}{}{node}", if is_tail { "L-- " } else { "|-- " })?;

        let child_prefix = format!("{prefix}{}", if is_tail { "    " } else { "|   " });
        let children = node.children();
        for (i, &child) in children.iter().enumerate() {
            self.write_subtree(f, child, &child_prefix, i + 1 == children.len())?;
        }
        Ok(())
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_subtree(f, self.root, "", true)
    }
}

/// Statistics about a hierarchy's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyStats {
    /// Number of levels below and including the root.
    pub num_levels: usize,
    /// Nodes per level, root level first.
    pub level_sizes: Vec<usize>,
    /// Total nodes reachable from the root.
    pub total_nodes: usize,
    /// Nodes without children.
    pub leaf_count: usize,
    /// Nodes without instances of their own (fillers included).
    pub empty_nodes: usize,
    /// Average number of children over internal nodes.
    pub avg_fanout: f32,
    /// Largest number of children of any node.
    pub max_fanout: usize,
}

impl HierarchyStats {
    /// Fraction of nodes that hold no instances.
    pub fn empty_ratio(&self) -> f32 {
        if self.total_nodes == 0 {
            return 0.0;
        }
        self.empty_nodes as f32 / self.total_nodes as f32
    }
}
