//! # arbor
//!
//! Build and repair hierarchies from identifier-encoded nodes: parent/child edge
//! inference, depth and breadth gap filling, centroid representations.
//!
//! ```rust
//! use arbor::{BuildConfig, Hierarchy, HierarchyBuilder, Node, NodeSet};
//!
//! # fn main() -> arbor::Result<()> {
//! let nodes: NodeSet = ["gen.0", "gen.0.0.10", "gen.0.0.11.3"]
//!     .into_iter()
//!     .map(Node::new)
//!     .collect();
//! let builder = HierarchyBuilder::new(BuildConfig::new().with_breadth_repair(true));
//! let hierarchy = Hierarchy::build(&builder, nodes, None)?;
//!
//! assert!(hierarchy.contains("gen.0.0.11"));
//! assert_eq!(hierarchy.node_count(), 18);
//! println!("{hierarchy}");
//! # Ok(())
//! # }
//! ```

/// Error types used across `arbor`.
pub mod error;
pub mod hierarchy;
pub mod id;
pub mod progress;


pub use error::{Error, Result};
pub use hierarchy::{
    BuildConfig, BuiltTree, CentroidScope, HealthCheck, Hierarchy, HierarchyBuilder, Instance,
    Node, NodeIdx, NodeSet,
};
pub use progress::{CancellationToken, Progress};
