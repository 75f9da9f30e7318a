//! Tree nodes and the data instances they own.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::centroid;
use crate::error::Result;

/// Handle of a node inside a [`NodeSet`](super::NodeSet).
///
/// Parent and child links are stored as handles, never as references, so the
/// node graph has a single owner (the arena) and no reference cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeIdx(pub usize);

impl NodeIdx {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single data record: a feature vector tagged with its owning node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instance {
    /// Optional record name.
    pub name: Option<String>,
    /// Feature values; same length for every instance of one hierarchy.
    pub features: Vec<f64>,
    /// Identifier of the node this instance currently belongs to.
    pub node_id: String,
    /// Ground-truth label, independent of tree position.
    pub true_class: Option<String>,
}

impl Instance {
    /// Create an unnamed, unlabelled instance.
    pub fn new(node_id: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            name: None,
            features,
            node_id: node_id.into(),
            true_class: None,
        }
    }

    /// Set the record name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the ground-truth label.
    pub fn with_true_class(mut self, class: impl Into<String>) -> Self {
        self.true_class = Some(class.into());
        self
    }

    /// Number of features.
    pub fn dimension(&self) -> usize {
        self.features.len()
    }
}

/// A node of the hierarchy.
///
/// The identifier is the primary key; parent and children are handles into
/// the owning arena. `instances` holds only records that belong directly to
/// this node, not to its descendants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    id: String,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
    instances: Vec<Instance>,
    representation: Instance,
}

impl Node {
    /// Create an empty node: no instances, no links.
    ///
    /// This is also how filler nodes are made.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let representation = centroid::empty(&id);
        Self {
            id,
            parent: None,
            children: Vec::new(),
            instances: Vec::new(),
            representation,
        }
    }

    /// Create a node owning `instances`, with its direct centroid computed.
    ///
    /// Each instance is re-tagged with this node's identifier.
    pub fn with_instances(id: impl Into<String>, instances: Vec<Instance>) -> Result<Self> {
        let mut node = Self::new(id);
        for instance in instances {
            node.add_instance(instance);
        }
        node.representation = centroid::mean(&node.id, node.instances.iter())?;
        Ok(node)
    }

    /// Identifier of this node.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parent handle, `None` for the root (or a not yet repaired orphan).
    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    /// Child handles in their current order.
    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    /// Instances owned directly by this node.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Cached representation (centroid).
    pub fn representation(&self) -> &Instance {
        &self.representation
    }

    /// Replace the cached representation.
    pub fn set_representation(&mut self, representation: Instance) {
        self.representation = representation;
    }

    /// Take ownership of `instance`, re-tagging it with this node's identifier.
    ///
    /// The representation is not refreshed; recompute it once all instances
    /// are in place.
    pub fn add_instance(&mut self, mut instance: Instance) {
        instance.node_id.clone_from(&self.id);
        self.instances.push(instance);
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether this node owns no instances directly.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeIdx>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeIdx> {
        &mut self.children
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.instances.len())
    }
}
