//! Arena of hierarchy nodes.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::centroid::{self, CentroidScope};
use super::node::{Instance, Node, NodeIdx};
use crate::error::{Error, Result};
use crate::id;

/// Flat collection of nodes, linked by [`NodeIdx`] handles.
///
/// Input readers push nodes in any order; the builder wires and repairs the
/// links in place and finally sorts the arena by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node, returning its handle.
    pub fn push(&mut self, node: Node) -> NodeIdx {
        self.nodes.push(node);
        NodeIdx(self.nodes.len() - 1)
    }

    /// Insert a node at position 0, shifting every existing handle by one.
    pub fn push_front(&mut self, node: Node) -> NodeIdx {
        self.nodes.insert(0, node);
        for n in &mut self.nodes {
            if let Some(p) = n.parent() {
                n.set_parent(Some(NodeIdx(p.0 + 1)));
            }
            for c in n.children_mut() {
                c.0 += 1;
            }
        }
        NodeIdx(0)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by handle.
    pub fn get(&self, idx: NodeIdx) -> Option<&Node> {
        self.nodes.get(idx.0)
    }

    /// Get a node mutably by handle.
    pub fn get_mut(&mut self, idx: NodeIdx) -> Option<&mut Node> {
        self.nodes.get_mut(idx.0)
    }

    /// Get a node by handle, failing with [`Error::UnknownNode`].
    pub fn node(&self, idx: NodeIdx) -> Result<&Node> {
        self.get(idx).ok_or(Error::UnknownNode { index: idx.0 })
    }

    /// Iterate over all nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterate over all handles in arena order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIdx> {
        (0..self.nodes.len()).map(NodeIdx)
    }

    /// Find a node by identifier with a linear scan.
    pub fn find(&self, id: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.id() == id).map(NodeIdx)
    }

    /// Find a node by identifier with a binary search.
    ///
    /// Only meaningful once the set is sorted with [`NodeSet::sort_by_id`].
    pub fn find_sorted(&self, id: &str) -> Option<NodeIdx> {
        self.nodes
            .binary_search_by(|n| id::compare(n.id(), id))
            .ok()
            .map(NodeIdx)
    }

    /// Whether nodes appear in identifier order.
    pub fn is_sorted(&self) -> bool {
        self.nodes
            .windows(2)
            .all(|w| id::compare(w[0].id(), w[1].id()).is_lt())
    }

    /// Fail on the first identifier that appears twice.
    pub fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id()) {
                return Err(Error::DuplicateId {
                    id: node.id().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Record `child` under `parent`, setting the back-reference too.
    pub fn link(&mut self, parent: NodeIdx, child: NodeIdx) {
        self.nodes[child.0].set_parent(Some(parent));
        self.nodes[parent.0].children_mut().push(child);
    }

    /// Drop every parent and child link.
    pub fn clear_links(&mut self) {
        for node in &mut self.nodes {
            node.set_parent(None);
            node.children_mut().clear();
        }
    }

    /// Handles of `root` and all its descendants, in pre-order.
    pub fn subtree(&self, root: NodeIdx) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.get(idx) else { continue };
            out.push(idx);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Number of nodes in the subtree rooted at `root`, `root` included.
    pub fn subtree_size(&self, root: NodeIdx) -> usize {
        self.subtree(root).len()
    }

    /// Instances of `root` and every descendant.
    pub fn subtree_instances(&self, root: NodeIdx) -> Vec<&Instance> {
        self.subtree(root)
            .into_iter()
            .flat_map(|idx| self.nodes[idx.0].instances())
            .collect()
    }

    /// Centroid of a node over the instances selected by `scope`.
    pub fn centroid(&self, idx: NodeIdx, scope: CentroidScope) -> Result<Instance> {
        let node = self.node(idx)?;
        match scope {
            CentroidScope::DirectOnly => centroid::mean(node.id(), node.instances()),
            CentroidScope::IncludeSubtree => {
                centroid::mean(node.id(), self.subtree_instances(idx))
            }
        }
    }

    /// Recompute and store a node's representation.
    pub fn recompute_representation(&mut self, idx: NodeIdx, scope: CentroidScope) -> Result<()> {
        let representation = self.centroid(idx, scope)?;
        self.nodes[idx.0].set_representation(representation);
        Ok(())
    }

    /// Sort a node's child handles by child identifier.
    pub fn sort_children(&mut self, idx: NodeIdx) {
        let mut children = std::mem::take(self.nodes[idx.0].children_mut());
        children.sort_by(|a, b| id::compare(self.nodes[a.0].id(), self.nodes[b.0].id()));
        *self.nodes[idx.0].children_mut() = children;
    }

    /// Sort the arena by identifier, remapping every handle.
    ///
    /// Returns the new handle of `root`.
    pub fn sort_by_id(&mut self, root: NodeIdx) -> NodeIdx {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by(|&a, &b| id::compare(self.nodes[a].id(), self.nodes[b].id()));

        let mut remap = vec![0usize; order.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }

        let mut slots: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        self.nodes = order
            .iter()
            .filter_map(|&old| slots[old].take())
            .collect();

        for node in &mut self.nodes {
            if let Some(p) = node.parent() {
                node.set_parent(Some(NodeIdx(remap[p.0])));
            }
            for c in node.children_mut() {
                c.0 = remap[c.0];
            }
        }

        NodeIdx(remap[root.0])
    }

    /// Total number of instances held by all nodes.
    pub fn instance_count(&self) -> usize {
        self.nodes.iter().map(|n| n.instances().len()).sum()
    }

    /// Consume the set, returning its nodes in arena order.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0]
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl core::ops::Index<NodeIdx> for NodeSet {
    type Output = Node;

    fn index(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn leaf(id: &str, data: &[&[f64]]) -> Node {
        Node::with_instances(
            id,
            data.iter().map(|v| Instance::new(id, v.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_link_sets_both_directions() {
        let mut set = NodeSet::new();
        let root = set.push(Node::new("gen.0"));
        let child = set.push(Node::new("gen.0.0"));
        set.link(root, child);

        assert_eq!(set[child].parent(), Some(root));
        assert_eq!(set[root].children(), &[child]);

        set.clear_links();
        assert!(set[child].parent().is_none());
        assert!(set[root].is_leaf());
    }

    #[test]
    fn test_subtree_centroid() {
        let mut set = NodeSet::new();
        let parent = set.push(leaf("gen.0", &[&[1.0, 2.0], &[3.0, 4.0]]));
        let child = set.push(leaf("gen.0.0", &[&[5.0, 6.0]]));
        set.link(parent, child);

        let direct = set.centroid(parent, CentroidScope::DirectOnly).unwrap();
        assert_eq!(direct.features, vec![2.0, 3.0]);

        let subtree = set.centroid(parent, CentroidScope::IncludeSubtree).unwrap();
        assert_eq!(subtree.features, vec![3.0, 4.0]);

        set.recompute_representation(parent, CentroidScope::IncludeSubtree)
            .unwrap();
        assert_eq!(set[parent].representation().features, vec![3.0, 4.0]);
    }

    #[test]
    fn test_sort_by_id_remaps_handles() {
        let mut set = NodeSet::new();
        let c10 = set.push(Node::new("gen.0.10"));
        let c2 = set.push(Node::new("gen.0.2"));
        let root = set.push(Node::new("gen.0"));
        set.link(root, c10);
        set.link(root, c2);

        let root = set.sort_by_id(root);
        assert_eq!(root, NodeIdx(0));
        assert!(set.is_sorted());

        let ids: Vec<&str> = set.iter().map(Node::id).collect();
        assert_eq!(ids, vec!["gen.0", "gen.0.2", "gen.0.10"]);

        let children: Vec<&str> = set[root].children().iter().map(|&c| set[c].id()).collect();
        assert_eq!(children, vec!["gen.0.10", "gen.0.2"]);
        for &c in set[root].children() {
            assert_eq!(set[c].parent(), Some(root));
        }

        set.sort_children(root);
        let children: Vec<&str> = set[root].children().iter().map(|&c| set[c].id()).collect();
        assert_eq!(children, vec!["gen.0.2", "gen.0.10"]);

        assert_eq!(set.find_sorted("gen.0.10"), Some(NodeIdx(2)));
        assert_eq!(set.find_sorted("gen.0.3"), None);
    }

    #[test]
    fn test_push_front_shifts_links() {
        let mut set = NodeSet::new();
        let a = set.push(Node::new("gen.0.0"));
        let b = set.push(Node::new("gen.0.0.0"));
        set.link(a, b);

        let root = set.push_front(Node::new("gen.0"));
        assert_eq!(root, NodeIdx(0));
        assert_eq!(set[NodeIdx(2)].parent(), Some(NodeIdx(1)));
        assert_eq!(set[NodeIdx(1)].children(), &[NodeIdx(2)]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let set: NodeSet = [Node::new("gen.0"), Node::new("gen.0")].into_iter().collect();
        assert_eq!(
            set.check_unique_ids(),
            Err(Error::DuplicateId { id: "gen.0".into() })
        );
    }

    #[test]
    fn test_subtree_order_and_size() {
        let mut set = NodeSet::new();
        let r = set.push(Node::new("gen.0"));
        let a = set.push(Node::new("gen.0.0"));
        let b = set.push(Node::new("gen.0.1"));
        let a0 = set.push(Node::new("gen.0.0.0"));
        set.link(r, a);
        set.link(r, b);
        set.link(a, a0);

        assert_eq!(set.subtree(r), vec![r, a, a0, b]);
        assert_eq!(set.subtree_size(a), 2);
    }
}
