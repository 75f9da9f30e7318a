//! Structural checks on built hierarchies.
//!
//! [`validate_tree_structure`] verifies that a node set is the tree its
//! identifiers describe; [`HealthCheck`] wraps it with a few shape figures.
//!
//! ```rust,ignore
//! use arbor::hierarchy::validate::HealthCheck;
//!
//! let health = hierarchy.health_check();
//! if !health.is_healthy() {
//!     eprintln!("{health}");
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use super::hierarchy::Hierarchy;
use super::node::NodeIdx;
use super::tree::NodeSet;
use crate::id;

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Worth knowing, not a defect.
    Info,
    /// A broken tree invariant.
    Error,
    /// The set cannot be walked as a tree from its root.
    Critical,
}

/// The invariant an issue breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// The designated root handle is outside the arena.
    RootOutOfBounds,
    /// No node is parentless.
    NoRoot,
    /// More than one node is parentless.
    ExtraRoots,
    /// The designated root has a parent.
    RootHasParent,
    /// A parent or child handle points outside the arena.
    DanglingLink,
    /// Parent and child disagree about their link.
    OneSidedLink,
    /// An edge joins identifiers that are not parent and child.
    EdgeAgainstId,
    /// An identifier occurs twice.
    DuplicateId,
    /// The arena is not in identifier order.
    Unsorted,
    /// Following child links from the root revisits a node.
    Cycle,
    /// Stored nodes that the root does not reach.
    Unreachable,
    /// Leaves without instances, such as breadth fillers.
    EmptyLeaves,
}

impl IssueKind {
    /// Severity attached to this kind.
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::EmptyLeaves => Severity::Info,
            IssueKind::RootOutOfBounds | IssueKind::NoRoot | IssueKind::Cycle => {
                Severity::Critical
            }
            _ => Severity::Error,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            IssueKind::RootOutOfBounds => "root handle out of bounds",
            IssueKind::NoRoot => "no parentless node",
            IssueKind::ExtraRoots => "several parentless nodes",
            IssueKind::RootHasParent => "root has a parent",
            IssueKind::DanglingLink => "link to a missing node",
            IssueKind::OneSidedLink => "one-sided parent/child link",
            IssueKind::EdgeAgainstId => "edge contradicts identifiers",
            IssueKind::DuplicateId => "duplicate identifier",
            IssueKind::Unsorted => "nodes out of identifier order",
            IssueKind::Cycle => "cycle below root",
            IssueKind::Unreachable => "nodes unreachable from root",
            IssueKind::EmptyLeaves => "empty leaves",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One broken (or noteworthy) invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// What is wrong.
    pub kind: IssueKind,
    /// The node it was found at, when there is a single one.
    pub node_id: Option<String>,
    /// Free-form specifics.
    pub detail: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind.severity(), self.kind)?;
        if let Some(id) = &self.node_id {
            write!(f, " at {id}")?;
        }
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

/// Every issue found by [`validate_tree_structure`], in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// All issues.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// No issue above [`Severity::Info`].
    pub fn is_healthy(&self) -> bool {
        self.issues
            .iter()
            .all(|i| i.kind.severity() == Severity::Info)
    }

    /// Whether any issue of `kind` was found.
    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    /// Issues of `kind`.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    fn push(&mut self, kind: IssueKind, node_id: Option<&str>, detail: impl Into<String>) {
        self.issues.push(ValidationIssue {
            kind,
            node_id: node_id.map(str::to_string),
            detail: detail.into(),
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "no issues");
        }
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Validation result plus shape figures of a hierarchy.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Structural issues.
    pub validation: ValidationReport,
    /// Nodes stored.
    pub node_count: usize,
    /// Nodes without children.
    pub leaf_count: usize,
    /// Nodes without instances.
    pub empty_count: usize,
    /// Levels below the root (root alone = 0).
    pub max_depth: usize,
}

impl HealthReport {
    /// See [`ValidationReport::is_healthy`].
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} nodes, {} leaves, {} empty, depth {}",
            self.node_count, self.leaf_count, self.empty_count, self.max_depth
        )?;
        write!(f, "{}", self.validation)
    }
}

/// Types that can check their own structure.
pub trait HealthCheck {
    /// Validate and summarize.
    fn health_check(&self) -> HealthReport;
}

impl HealthCheck for Hierarchy {
    fn health_check(&self) -> HealthReport {
        let nodes = self.nodes();
        let root_height = id::height(self.root().id());

        HealthReport {
            validation: validate_tree_structure(nodes, self.root_idx()),
            node_count: nodes.len(),
            leaf_count: nodes.iter().filter(|n| n.is_leaf()).count(),
            empty_count: nodes.iter().filter(|n| n.is_empty()).count(),
            max_depth: nodes
                .iter()
                .map(|n| id::height(n.id()).saturating_sub(root_height))
                .max()
                .unwrap_or(0),
        }
    }
}

/// Check `nodes` against the tree its identifiers describe, with `root` as
/// the designated root.
///
/// Reports every issue found rather than stopping at the first.
pub fn validate_tree_structure(nodes: &NodeSet, root: NodeIdx) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root_node) = nodes.get(root) else {
        report.push(IssueKind::RootOutOfBounds, None, format!("{root} of {}", nodes.len()));
        return report;
    };
    if root_node.parent().is_some() {
        report.push(IssueKind::RootHasParent, Some(root_node.id()), "");
    }

    let parentless: Vec<&str> = nodes
        .iter()
        .filter(|n| n.parent().is_none())
        .map(|n| n.id())
        .collect();
    match parentless.len() {
        0 => report.push(IssueKind::NoRoot, None, ""),
        1 => {}
        n => report.push(IssueKind::ExtraRoots, None, format!("{n}: {}", sample(&parentless))),
    }

    for idx in nodes.indices() {
        let node = &nodes[idx];

        if let Some(parent) = node.parent() {
            match nodes.get(parent) {
                None => report.push(IssueKind::DanglingLink, Some(node.id()), format!("parent {parent}")),
                Some(p) => {
                    if !p.children().contains(&idx) {
                        report.push(
                            IssueKind::OneSidedLink,
                            Some(node.id()),
                            format!("not listed by parent {}", p.id()),
                        );
                    }
                    if !id::is_parent_of(p.id(), node.id()) {
                        report.push(
                            IssueKind::EdgeAgainstId,
                            Some(node.id()),
                            format!("under {}", p.id()),
                        );
                    }
                }
            }
        }

        for &child in node.children() {
            match nodes.get(child) {
                None => report.push(IssueKind::DanglingLink, Some(node.id()), format!("child {child}")),
                Some(c) if c.parent() != Some(idx) => report.push(
                    IssueKind::OneSidedLink,
                    Some(c.id()),
                    format!("listed by {} but parent is elsewhere", node.id()),
                ),
                Some(_) => {}
            }
        }
    }

    let mut seen = HashSet::with_capacity(nodes.len());
    for node in nodes.iter() {
        if !seen.insert(node.id()) {
            report.push(IssueKind::DuplicateId, Some(node.id()), "");
        }
    }
    if !nodes.is_sorted() {
        report.push(IssueKind::Unsorted, None, "");
    }

    let reached = walk_from(nodes, root, &mut report);
    let unreachable: Vec<&str> = nodes
        .indices()
        .filter(|i| !reached.contains(i))
        .map(|i| nodes[i].id())
        .collect();
    if !unreachable.is_empty() {
        report.push(
            IssueKind::Unreachable,
            None,
            format!("{}: {}", unreachable.len(), sample(&unreachable)),
        );
    }

    let empty_leaves = nodes.iter().filter(|n| n.is_leaf() && n.is_empty()).count();
    if empty_leaves > 0 {
        report.push(IssueKind::EmptyLeaves, None, empty_leaves.to_string());
    }

    report
}

/// Nodes reached from `root` through child links. A revisit is reported as
/// a cycle and not followed.
fn walk_from(nodes: &NodeSet, root: NodeIdx, report: &mut ValidationReport) -> HashSet<NodeIdx> {
    let mut reached = HashSet::new();
    let mut stack = vec![root];
    let mut cyclic = false;

    while let Some(idx) = stack.pop() {
        let Some(node) = nodes.get(idx) else { continue };
        if !reached.insert(idx) {
            cyclic = true;
            continue;
        }
        stack.extend(node.children().iter().copied());
    }

    if cyclic {
        report.push(IssueKind::Cycle, Some(nodes[root].id()), "");
    }
    reached
}

fn sample(ids: &[&str]) -> String {
    let shown = ids.iter().take(5).copied().collect::<Vec<_>>().join(", ");
    if ids.len() > 5 {
        format!("{shown}, ...")
    } else {
        shown
    }
}
