/// Result alias for `arbor`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by hierarchy construction and repair.
///
/// Every variant aborts a build: no partial hierarchy is handed back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A parentless node has no ancestor anywhere in the node set.
    #[error("could not find nearest ancestor for '{id}'")]
    MissingAncestor {
        /// Identifier of the node that cannot be traced to the root.
        id: String,
    },

    /// A recorded child is not a descendant of its recorded parent.
    #[error("'{parent}' is not an ancestor of '{child}', but '{child}' is a child of '{parent}'")]
    NotDescendant {
        /// Identifier of the recorded parent.
        parent: String,
        /// Identifier of the recorded child.
        child: String,
    },

    /// A child occupies a sibling slot that cannot be made dense.
    #[error("child '{child}' of '{parent}' does not fit sibling slot {expected}")]
    NonCanonicalChild {
        /// Identifier of the parent whose children are being repaired.
        parent: String,
        /// Identifier of the offending child.
        child: String,
        /// Slot index the child was expected to fill.
        expected: usize,
    },

    /// Two nodes share an identifier.
    #[error("duplicate node identifier '{id}'")]
    DuplicateId {
        /// The repeated identifier.
        id: String,
    },

    /// A node handle does not point into the node set.
    #[error("node index {index} is out of bounds")]
    UnknownNode {
        /// The offending handle value.
        index: usize,
    },

    /// Identifier rejected at the reader boundary.
    #[error("malformed identifier '{id}': {reason}")]
    MalformedId {
        /// The rejected identifier.
        id: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Feature vectors of different lengths were mixed.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// The caller's cancellation signal was observed.
    #[error("build cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error reports a broken identifier convention in the input,
    /// as opposed to a caller abort.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::MissingAncestor { .. }
                | Error::NotDescendant { .. }
                | Error::NonCanonicalChild { .. }
                | Error::DuplicateId { .. }
        )
    }
}
