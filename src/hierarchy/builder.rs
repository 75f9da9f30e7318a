//! Hierarchy construction and gap repair.
//!
//! Readers hand over an unordered [`NodeSet`] whose parent/child links are
//! missing. The builder infers them from identifiers in five ordered phases:
//!
//! ```text
//! flat nodes ──► edges ──► depth gaps ──► breadth gaps ──► centroids ──► sort
//!                (ids)     (ancestors)    (siblings, opt)
//! ```
//!
//! Depth gaps are ancestors implied by a descendant's identifier but absent
//! from the input; breadth gaps are missing sibling slots below the highest
//! child index. Both are filled with empty filler nodes. Nodes are only ever
//! added and relinked, never removed.

use std::collections::{BTreeMap, HashMap, VecDeque};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::centroid::CentroidScope;
use super::node::{Node, NodeIdx};
use super::tree::NodeSet;
use crate::error::{Error, Result};
use crate::id::{self, IdKey, ROOT_ID, SEPARATOR};
use crate::progress::{CancellationToken, Progress};

/// Status reported while wiring parent/child links.
pub const PHASE_EDGES: &str = "Building parent-child relations";
/// Status reported while synthesizing missing ancestors.
pub const PHASE_DEPTH: &str = "Filling depth gaps";
/// Status reported while synthesizing missing siblings.
pub const PHASE_BREADTH: &str = "Filling breadth gaps";
/// Status reported while recomputing representations.
pub const PHASE_CENTROIDS: &str = "Recalculating centroids";
/// Status reported while sorting the node set.
pub const PHASE_SORT: &str = "Sorting nodes";

/// Configuration for building a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildConfig {
    /// Also fill missing sibling slots, not just missing ancestors.
    pub repair_breadth_gaps: bool,
    /// Instances that feed each node's centroid.
    pub centroid: CentroidScope,
    /// Sort every child list by identifier during the final sort.
    pub sort_children: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            repair_breadth_gaps: false,
            centroid: CentroidScope::DirectOnly,
            sort_children: true,
        }
    }
}

impl BuildConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable breadth-gap repair.
    pub fn with_breadth_repair(mut self, enabled: bool) -> Self {
        self.repair_breadth_gaps = enabled;
        self
    }

    /// Set the centroid scope.
    pub fn with_centroid_scope(mut self, scope: CentroidScope) -> Self {
        self.centroid = scope;
        self
    }

    /// Enable or disable sorting of child lists.
    pub fn with_sorted_children(mut self, enabled: bool) -> Self {
        self.sort_children = enabled;
        self
    }
}

/// Output of a complete build.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// Every node, real and synthesized, sorted by identifier.
    pub nodes: NodeSet,
    /// Handle of the root inside `nodes`.
    pub root: NodeIdx,
    /// How many filler nodes were created (root included, if synthesized).
    pub synthesized: usize,
}

/// Builds complete hierarchies from flat node sets.
///
/// Progress and cancellation handles are shared with the caller, who may
/// poll or flip them from another thread while a build runs.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    config: BuildConfig,
    progress: Progress,
    cancel: CancellationToken,
}

impl HierarchyBuilder {
    /// Create a builder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            progress: Progress::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Report into an existing progress handle.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Observe an existing cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get config.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Progress handle of this builder.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Cancellation token of this builder.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Build a complete, sorted hierarchy.
    ///
    /// `root` designates the root among `nodes`. Without one, a node named
    /// [`ROOT_ID`] is used if present, otherwise an empty root is synthesized
    /// at position 0.
    ///
    /// Fails on duplicate identifiers, on nodes that cannot be traced back to
    /// the root, on inconsistent child lists, and on cancellation. No partial
    /// result is returned.
    pub fn build(&self, mut nodes: NodeSet, root: Option<NodeIdx>) -> Result<BuiltTree> {
        nodes.check_unique_ids()?;

        let mut synthesized = 0;
        let root = match root {
            Some(idx) => {
                let _ = nodes.node(idx)?;
                idx
            }
            None => match nodes.find(ROOT_ID) {
                Some(idx) => idx,
                None => {
                    debug!(id = ROOT_ID, "root missing from input, synthesizing");
                    synthesized += 1;
                    nodes.push_front(Node::new(ROOT_ID))
                }
            },
        };

        self.build_edges(&mut nodes)?;
        synthesized += self.fill_depth_gaps(&mut nodes, root)?;
        if self.config.repair_breadth_gaps {
            synthesized += self.fill_breadth_gaps(&mut nodes, root)?;
        }
        self.recompute_representations(&mut nodes)?;
        let root = self.sort(&mut nodes, root)?;

        info!(
            nodes = nodes.len(),
            synthesized,
            root = nodes[root].id(),
            "hierarchy built"
        );

        Ok(BuiltTree {
            nodes,
            root,
            synthesized,
        })
    }

    /// Wire parent/child links purely from identifiers.
    ///
    /// Existing links are cleared first, so running this twice gives the same
    /// result. A node whose parent identifier is not in the set stays
    /// parentless; [`HierarchyBuilder::fill_depth_gaps`] handles those.
    /// Children are appended in input order.
    pub fn build_edges(&self, nodes: &mut NodeSet) -> Result<()> {
        self.progress.begin(PHASE_EDGES, false);
        nodes.clear_links();

        let lookup: HashMap<String, NodeIdx> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id().to_string(), NodeIdx(i)))
            .collect();

        let total = nodes.len();
        let mut linked = 0usize;
        for i in 0..total {
            self.cancel.check()?;
            let child = NodeIdx(i);
            let parent = id::parent_id(nodes[child].id())
                .and_then(|p| lookup.get(p))
                .copied();

            if let Some(parent) = parent {
                trace!(parent = nodes[parent].id(), child = nodes[child].id(), "edge");
                nodes.link(parent, child);
                linked += 1;
            }
            self.progress.report(i + 1, total);
        }

        debug!(nodes = total, edges = linked, "parent-child relations built");
        Ok(())
    }

    /// Connect every parentless node except `root` to its nearest ancestor,
    /// synthesizing the empty intermediate nodes in between.
    ///
    /// Nodes are handled in arena order. Synthesized ancestors are registered
    /// immediately, so later nodes sharing part of the chain reuse them.
    /// Returns how many nodes were created.
    pub fn fill_depth_gaps(&self, nodes: &mut NodeSet, root: NodeIdx) -> Result<usize> {
        let _ = nodes.node(root)?;
        self.progress.begin(PHASE_DEPTH, false);

        let mut known: BTreeMap<IdKey, NodeIdx> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (IdKey::new(n.id()), NodeIdx(i)))
            .collect();

        let total = nodes.len();
        let mut created = 0usize;

        for i in 0..total {
            self.cancel.check()?;
            self.progress.report(i, total);

            let idx = NodeIdx(i);
            if idx == root || nodes[idx].parent().is_some() {
                continue;
            }

            let node_id = nodes[idx].id().to_string();
            let (mut parent, ancestor_height) =
                nearest_ancestor(&known, &node_id).ok_or_else(|| Error::MissingAncestor {
                    id: node_id.clone(),
                })?;

            let segments: Vec<&str> = id::segments(&node_id).collect();
            for segment in &segments[ancestor_height + 1..segments.len() - 1] {
                let filler_id = format!("{}{SEPARATOR}{segment}", nodes[parent].id());
                debug!(id = %filler_id, "synthesized missing ancestor");

                let filler = nodes.push(Node::new(filler_id.clone()));
                nodes.link(parent, filler);
                let _ = known.insert(IdKey(filler_id), filler);

                parent = filler;
                created += 1;
            }

            nodes.link(parent, idx);
        }

        self.progress.report(total, total);
        info!(created, "depth gaps filled");
        Ok(created)
    }

    /// Make every child list below `root` dense: after repair the children of
    /// each node, sorted by identifier, end in `0, 1, …, k-1`.
    ///
    /// Traversal is breadth-first. Filler siblings are not descended into,
    /// since they have no children. A node's child list is checked in full
    /// before any filler is added below it, so on error that node is left
    /// as it was. Returns how many nodes were created.
    pub fn fill_breadth_gaps(&self, nodes: &mut NodeSet, root: NodeIdx) -> Result<usize> {
        let _ = nodes.node(root)?;
        self.progress.begin(PHASE_BREADTH, true);

        let mut created = 0usize;
        let mut pending = VecDeque::from([root]);

        while let Some(current) = pending.pop_front() {
            self.cancel.check()?;
            nodes.sort_children(current);
            let slotted = child_slots(nodes, current)?;

            let parent_id = nodes[current].id().to_string();
            let mut children = Vec::with_capacity(slotted.last().map_or(0, |&(_, s)| s + 1));
            for (child, slot) in slotted {
                while children.len() < slot {
                    let filler_id = id::child_id(&parent_id, children.len());
                    debug!(id = %filler_id, "synthesized missing sibling");

                    let filler = nodes.push(Node::new(filler_id));
                    nodes.node_mut(filler).set_parent(Some(current));
                    children.push(filler);
                    created += 1;
                }
                children.push(child);
                pending.push_back(child);
            }

            *nodes.node_mut(current).children_mut() = children;
        }

        info!(created, "breadth gaps filled");
        Ok(created)
    }

    /// Recompute the representation of every node with the configured scope.
    pub fn recompute_representations(&self, nodes: &mut NodeSet) -> Result<()> {
        self.progress.begin(PHASE_CENTROIDS, false);
        let total = nodes.len();
        for i in 0..total {
            self.cancel.check()?;
            nodes.recompute_representation(NodeIdx(i), self.config.centroid)?;
            self.progress.report(i + 1, total);
        }
        Ok(())
    }

    /// Sort the node set (and, if configured, every child list) by
    /// identifier. Returns the new handle of `root`.
    pub fn sort(&self, nodes: &mut NodeSet, root: NodeIdx) -> Result<NodeIdx> {
        let _ = nodes.node(root)?;
        self.progress.begin(PHASE_SORT, false);
        self.cancel.check()?;

        let root = nodes.sort_by_id(root);
        if self.config.sort_children {
            for i in 0..nodes.len() {
                nodes.sort_children(NodeIdx(i));
            }
        }

        self.progress.report(1, 1);
        Ok(root)
    }
}

/// Deepest known ancestor of `id`, with its height.
///
/// Every ancestor sorts before its descendants, and among the ancestors of
/// `id` the deepest sorts last, so the first hit walking down from `id` wins.
fn nearest_ancestor(known: &BTreeMap<IdKey, NodeIdx>, id: &str) -> Option<(NodeIdx, usize)> {
    known
        .range(..IdKey::new(id))
        .rev()
        .find(|(key, _)| id::is_ancestor_of(key.as_str(), id))
        .map(|(key, &idx)| (idx, id::height(key.as_str())))
}

/// Children of `parent` paired with the slot their last segment names.
///
/// Expects the child list sorted. Every child must descend from `parent`
/// and name a canonical slot past the previous child's.
fn child_slots(nodes: &NodeSet, parent: NodeIdx) -> Result<Vec<(NodeIdx, usize)>> {
    let parent_id = nodes[parent].id();
    let mut next = 0usize;
    let mut out = Vec::with_capacity(nodes[parent].children().len());

    for &child in nodes[parent].children() {
        let child_id = nodes[child].id();
        if !id::is_ancestor_of(parent_id, child_id) {
            return Err(Error::NotDescendant {
                parent: parent_id.to_string(),
                child: child_id.to_string(),
            });
        }
        match canonical_index(id::last_segment(child_id)) {
            Some(slot) if slot >= next => {
                out.push((child, slot));
                next = slot + 1;
            }
            _ => {
                return Err(Error::NonCanonicalChild {
                    parent: parent_id.to_string(),
                    child: child_id.to_string(),
                    expected: next,
                });
            }
        }
    }
    Ok(out)
}

/// Slot index encoded by a canonical decimal segment.
fn canonical_index(segment: &str) -> Option<usize> {
    let value: usize = segment.parse().ok()?;
    (value.to_string() == segment).then_some(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::node::Instance;
    use crate::hierarchy::validate::validate_tree_structure;
    use crate::progress::INDETERMINATE;

    fn node_set(ids: &[&str]) -> NodeSet {
        ids.iter().map(|&id| Node::new(id)).collect()
    }

    fn child_ids(nodes: &NodeSet, idx: NodeIdx) -> Vec<String> {
        let mut ids: Vec<String> = nodes[idx]
            .children()
            .iter()
            .map(|&c| nodes[c].id().to_string())
            .collect();
        ids.sort_by(|a, b| id::compare(a, b));
        ids
    }

    #[test]
    fn test_config_builders() {
        let config = BuildConfig::default();
        assert!(!config.repair_breadth_gaps);
        assert_eq!(config.centroid, CentroidScope::DirectOnly);

        let config = BuildConfig::new()
            .with_breadth_repair(true)
            .with_centroid_scope(CentroidScope::IncludeSubtree)
            .with_sorted_children(false);
        assert!(config.repair_breadth_gaps);
        assert_eq!(config.centroid, CentroidScope::IncludeSubtree);
        assert!(!config.sort_children);
    }

    #[test]
    fn test_build_edges_links_direct_children_only() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0.0", "gen.0", "gen.0.0.0.1", "gen.0.1"]);
        builder.build_edges(&mut nodes).unwrap();

        let root = nodes.find("gen.0").unwrap();
        assert!(nodes[root].parent().is_none());
        assert_eq!(child_ids(&nodes, root), vec!["gen.0.0", "gen.0.1"]);

        // gen.0.0.0 is missing, so the grandchild stays unattached.
        let deep = nodes.find("gen.0.0.0.1").unwrap();
        assert!(nodes[deep].parent().is_none());
    }

    #[test]
    fn test_build_edges_is_idempotent() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.0", "gen.0.1"]);
        builder.build_edges(&mut nodes).unwrap();
        let first = nodes.clone();
        builder.build_edges(&mut nodes).unwrap();
        assert_eq!(first, nodes);
    }

    #[test]
    fn test_depth_gaps_synthesize_minimal_chain() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.2.4.1"]);
        builder.build_edges(&mut nodes).unwrap();
        let created = builder.fill_depth_gaps(&mut nodes, NodeIdx(0)).unwrap();

        assert_eq!(created, 2);
        let mid = nodes.find("gen.0.2").unwrap();
        let low = nodes.find("gen.0.2.4").unwrap();
        let leaf = nodes.find("gen.0.2.4.1").unwrap();
        assert_eq!(nodes[mid].parent(), Some(NodeIdx(0)));
        assert_eq!(nodes[low].parent(), Some(mid));
        assert_eq!(nodes[leaf].parent(), Some(low));
        assert!(nodes[mid].is_empty());
    }

    #[test]
    fn test_depth_gaps_reuse_synthesized_ancestors() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.1.0.0", "gen.0.1.0.1", "gen.0.1.1"]);
        builder.build_edges(&mut nodes).unwrap();
        let created = builder.fill_depth_gaps(&mut nodes, NodeIdx(0)).unwrap();

        assert_eq!(created, 2);
        assert!(nodes.check_unique_ids().is_ok());
        let shared = nodes.find("gen.0.1").unwrap();
        assert_eq!(child_ids(&nodes, shared), vec!["gen.0.1.0", "gen.0.1.1"]);
    }

    #[test]
    fn test_depth_gaps_reuse_later_real_ancestor() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.3.1.2", "gen.0.3"]);
        builder.build_edges(&mut nodes).unwrap();
        let created = builder.fill_depth_gaps(&mut nodes, NodeIdx(0)).unwrap();

        assert_eq!(created, 1);
        let real = nodes.find("gen.0.3").unwrap();
        let filler = nodes.find("gen.0.3.1").unwrap();
        assert_eq!(nodes[filler].parent(), Some(real));
        assert_eq!(nodes[real].parent(), Some(NodeIdx(0)));
    }

    #[test]
    fn test_depth_gaps_on_complete_tree_create_nothing() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.0", "gen.0.0.0", "gen.0.1"]);
        builder.build_edges(&mut nodes).unwrap();
        assert_eq!(builder.fill_depth_gaps(&mut nodes, NodeIdx(0)).unwrap(), 0);
    }

    #[test]
    fn test_depth_gaps_fail_without_ancestor() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.1.4"]);
        builder.build_edges(&mut nodes).unwrap();
        assert_eq!(
            builder.fill_depth_gaps(&mut nodes, NodeIdx(0)),
            Err(Error::MissingAncestor {
                id: "gen.1.4".into()
            })
        );
    }

    #[test]
    fn test_breadth_gaps_fill_dense_slots() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.2", "gen.0.2.1"]);
        builder.build_edges(&mut nodes).unwrap();
        let created = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap();

        assert_eq!(created, 3);
        let ids: Vec<&str> = nodes[NodeIdx(0)]
            .children()
            .iter()
            .map(|&c| nodes[c].id())
            .collect();
        assert_eq!(ids, vec!["gen.0.0", "gen.0.1", "gen.0.2"]);

        let two = nodes.find("gen.0.2").unwrap();
        assert_eq!(child_ids(&nodes, two), vec!["gen.0.2.0", "gen.0.2.1"]);

        let filler = nodes.find("gen.0.0").unwrap();
        assert_eq!(nodes[filler].parent(), Some(NodeIdx(0)));
        assert!(nodes[filler].is_leaf());
    }

    #[test]
    fn test_breadth_gaps_reject_foreign_child() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.0", "gen.0.1.0"]);
        // Corrupt the tree by hand: gen.0.1.0 is not below gen.0.0.
        nodes.link(NodeIdx(0), NodeIdx(1));
        nodes.link(NodeIdx(1), NodeIdx(2));

        let err = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap_err();
        assert!(matches!(err, Error::NotDescendant { .. }));
    }

    #[test]
    fn test_breadth_gaps_reject_padded_segment() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.03"]);
        builder.build_edges(&mut nodes).unwrap();

        let err = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap_err();
        assert!(matches!(err, Error::NonCanonicalChild { expected: 0, .. }));
    }

    #[test]
    fn test_breadth_error_leaves_node_set_intact() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.1", "gen.0.03"]);
        builder.build_edges(&mut nodes).unwrap();

        let err = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap_err();
        assert!(matches!(err, Error::NonCanonicalChild { expected: 2, .. }));

        assert_eq!(nodes.len(), 3);
        assert_eq!(child_ids(&nodes, NodeIdx(0)), vec!["gen.0.1", "gen.0.03"]);
        let report = validate_tree_structure(&nodes, NodeIdx(0));
        assert!(report.is_healthy(), "{}", report);
    }

    #[test]
    fn test_breadth_error_keeps_fillers_of_finished_levels() {
        let builder = HierarchyBuilder::default();
        let mut nodes = node_set(&["gen.0", "gen.0.1", "gen.0.1.007"]);
        builder.build_edges(&mut nodes).unwrap();

        let err = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap_err();
        assert!(matches!(err, Error::NonCanonicalChild { expected: 0, .. }));

        // gen.0 was completed before gen.0.1 failed; both stay consistent.
        assert_eq!(child_ids(&nodes, NodeIdx(0)), vec!["gen.0.0", "gen.0.1"]);
        let one = nodes.find("gen.0.1").unwrap();
        assert_eq!(child_ids(&nodes, one), vec!["gen.0.1.007"]);
        let root = nodes.sort_by_id(NodeIdx(0));
        let report = validate_tree_structure(&nodes, root);
        assert!(report.is_healthy(), "{}", report);
    }

    #[test]
    fn test_breadth_phase_progress_is_indeterminate() {
        let progress = Progress::new();
        let builder = HierarchyBuilder::default().with_progress(progress.clone());
        let mut nodes = node_set(&["gen.0", "gen.0.4"]);
        builder.build_edges(&mut nodes).unwrap();
        assert_eq!(progress.percent(), 100);

        let _ = builder.fill_breadth_gaps(&mut nodes, NodeIdx(0)).unwrap();
        assert_eq!(progress.status(), PHASE_BREADTH);
        assert!(progress.percent() < 0);
        assert!(progress.is_indeterminate());
    }

    #[test]
    fn test_build_cancelled_during_breadth_phase() {
        // Wide gaps under many nodes keep the breadth phase busy long enough
        // for the watcher to observe it.
        let ids: Vec<String> = (0..1000).map(|i| format!("gen.0.{i}.250")).collect();
        let nodes: NodeSet = ids.iter().map(|id| Node::new(id.as_str())).collect();

        let progress = Progress::new();
        let token = CancellationToken::new();
        let builder = HierarchyBuilder::new(BuildConfig::new().with_breadth_repair(true))
            .with_progress(progress.clone())
            .with_cancellation(token.clone());

        let watcher = std::thread::spawn(move || {
            while progress.status() != PHASE_BREADTH {
                std::thread::yield_now();
            }
            let percent = progress.percent();
            token.cancel();
            percent
        });

        let res = builder.build(nodes, None);
        let seen = watcher.join().unwrap();

        assert_eq!(res.unwrap_err(), Error::Cancelled);
        assert_eq!(seen, INDETERMINATE);
        assert_eq!(builder.progress().status(), PHASE_BREADTH);
    }

    #[test]
    fn test_build_synthesizes_missing_root() {
        let builder = HierarchyBuilder::default();
        let built = builder.build(node_set(&["gen.0.0"]), None).unwrap();

        assert_eq!(built.root, NodeIdx(0));
        assert_eq!(built.nodes[built.root].id(), ROOT_ID);
        assert_eq!(built.synthesized, 1);
        assert_eq!(built.nodes.len(), 2);
    }

    #[test]
    fn test_build_uses_root_found_by_id() {
        let builder = HierarchyBuilder::default();
        let built = builder
            .build(node_set(&["gen.0.0", "gen.0"]), None)
            .unwrap();
        assert_eq!(built.synthesized, 0);
        assert_eq!(built.nodes.len(), 2);
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let builder = HierarchyBuilder::default();
        let res = builder.build(node_set(&["gen.0", "gen.0.1", "gen.0.1"]), None);
        assert_eq!(
            res.unwrap_err(),
            Error::DuplicateId {
                id: "gen.0.1".into()
            }
        );
    }

    #[test]
    fn test_build_rejects_unknown_root_handle() {
        let builder = HierarchyBuilder::default();
        let res = builder.build(node_set(&["gen.0"]), Some(NodeIdx(7)));
        assert_eq!(res.unwrap_err(), Error::UnknownNode { index: 7 });
    }

    #[test]
    fn test_build_honours_cancellation() {
        let token = CancellationToken::new();
        let builder = HierarchyBuilder::default().with_cancellation(token.clone());
        token.cancel();

        let res = builder.build(node_set(&["gen.0", "gen.0.0"]), None);
        assert_eq!(res.unwrap_err(), Error::Cancelled);

        token.reset();
        assert!(builder.build(node_set(&["gen.0", "gen.0.0"]), None).is_ok());
    }

    #[test]
    fn test_build_reports_progress() {
        let progress = Progress::new();
        let builder = HierarchyBuilder::default().with_progress(progress.clone());
        assert_eq!(progress.percent(), 0);
        assert_eq!(progress.status(), "");

        let _ = builder.build(node_set(&["gen.0", "gen.0.3"]), None).unwrap();
        assert_eq!(progress.status(), PHASE_SORT);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_build_recomputes_subtree_centroids() {
        let mut nodes = NodeSet::new();
        let _ = nodes.push(
            Node::with_instances(
                "gen.0",
                vec![
                    Instance::new("gen.0", vec![1.0, 2.0]),
                    Instance::new("gen.0", vec![3.0, 4.0]),
                ],
            )
            .unwrap(),
        );
        let _ = nodes.push(
            Node::with_instances("gen.0.0.0", vec![Instance::new("gen.0.0.0", vec![5.0, 6.0])])
                .unwrap(),
        );

        let builder = HierarchyBuilder::new(
            BuildConfig::new().with_centroid_scope(CentroidScope::IncludeSubtree),
        );
        let built = builder.build(nodes, None).unwrap();

        let root = &built.nodes[built.root];
        assert_eq!(root.representation().features, vec![3.0, 4.0]);

        let filler = built.nodes.find_sorted("gen.0.0").unwrap();
        assert_eq!(built.nodes[filler].representation().features, vec![5.0, 6.0]);
    }

    #[test]
    fn test_canonical_index() {
        assert_eq!(canonical_index("0"), Some(0));
        assert_eq!(canonical_index("12"), Some(12));
        assert_eq!(canonical_index("012"), None);
        assert_eq!(canonical_index("x"), None);
    }
}
