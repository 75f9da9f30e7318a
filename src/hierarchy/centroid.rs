//! Centroid representations.
//!
//! A node is summarized by the per-feature mean of either its own instances
//! or every instance in its subtree. An empty set averages to a zero-length
//! vector rather than NaNs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::node::Instance;
use crate::error::{Error, Result};

/// Name carried by every computed representation.
pub const CENTROID_NAME: &str = "centroid";

/// Which instances feed a node's centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CentroidScope {
    /// Only the node's own instances.
    #[default]
    DirectOnly,
    /// The node's instances plus those of every descendant.
    IncludeSubtree,
}

/// Representation of a node with nothing to average.
pub fn empty(node_id: &str) -> Instance {
    Instance::new(node_id, Vec::new()).with_name(CENTROID_NAME)
}

/// Per-feature mean of `instances`, tagged with `node_id`.
///
/// The dimension is taken from the first instance; any other length is an
/// error.
pub fn mean<'a, I>(node_id: &str, instances: I) -> Result<Instance>
where
    I: IntoIterator<Item = &'a Instance>,
{
    let mut sums: Option<Vec<f64>> = None;
    let mut count = 0usize;

    for instance in instances {
        let acc = sums.get_or_insert_with(|| vec![0.0; instance.dimension()]);
        if acc.len() != instance.dimension() {
            return Err(Error::DimensionMismatch {
                expected: acc.len(),
                found: instance.dimension(),
            });
        }
        for (s, v) in acc.iter_mut().zip(&instance.features) {
            *s += v;
        }
        count += 1;
    }

    let mut features = sums.unwrap_or_default();
    if count > 0 {
        let n = count as f64;
        for s in &mut features {
            *s /= n;
        }
    }

    Ok(Instance::new(node_id, features).with_name(CENTROID_NAME))
}
