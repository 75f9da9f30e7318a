//! Hierarchies whose shape is encoded in node identifiers.
//!
//! # The Core Idea
//!
//! Every node carries a dotted identifier such as `gen.0.3.1`. The identifier
//! alone says where the node sits:
//!
//! ```text
//! Identifier     │ Parent       │ Height
//! ───────────────┼──────────────┼────────
//! gen.0          │ (root)       │ 1
//! gen.0.3        │ gen.0        │ 2
//! gen.0.3.1      │ gen.0.3      │ 3
//! ```
//!
//! So a flat bag of nodes is enough to recover the tree, provided the gaps
//! left by an incomplete bag get filled in.
//!
//! # Building
//!
//! [`HierarchyBuilder::build`] runs these phases in order:
//!
//! 1. **Edges**: link each node to the node whose identifier is its parent's
//! 2. **Depth gaps**: synthesize missing intermediate ancestors so every
//!    non-root node has a parent
//! 3. **Breadth gaps** (opt-in): insert empty siblings so children of every
//!    node are numbered `0..k` with no holes
//! 4. **Centroids**: recompute each node's representation
//! 5. **Sort**: order the arena (and child lists) by identifier
//!
//! Synthesized nodes are called fillers. They own no instances.
//!
//! ```text
//! input:  gen.0, gen.0.0.10, gen.0.0.11.3
//!
//! gen.0
//! └── gen.0.0            (depth filler)
//!     ├── gen.0.0.0..9   (breadth fillers)
//!     ├── gen.0.0.10
//!     └── gen.0.0.11     (depth filler)
//!         ├── gen.0.0.11.0..2 (breadth fillers)
//!         └── gen.0.0.11.3
//! ```
//!
//! # Module Overview
//!
//! - [`node`]: [`Node`], [`Instance`] and the [`NodeIdx`] handle
//! - [`tree`]: [`NodeSet`], the arena owning every node
//! - [`centroid`]: mean feature vectors
//! - [`builder`]: the build pipeline and its configuration
//! - [`hierarchy`]: [`Hierarchy`], a built tree with class statistics
//! - [`validate`]: structural health checks

pub mod builder;
pub mod centroid;
#[allow(clippy::module_inception)]
pub mod hierarchy;
pub mod node;
pub mod tree;
pub mod validate;

pub use builder::{BuildConfig, BuiltTree, HierarchyBuilder};
pub use centroid::CentroidScope;
pub use hierarchy::{Hierarchy, HierarchyStats};
pub use node::{Instance, Node, NodeIdx};
pub use tree::NodeSet;
pub use validate::{
    validate_tree_structure, HealthCheck, HealthReport, IssueKind, Severity, ValidationIssue,
    ValidationReport,
};
