//! Segmented node identifiers.
//!
//! An identifier encodes both identity and tree position: a fixed leading
//! prefix followed by integer segments joined by [`SEPARATOR`].
//!
//! ```text
//! gen.0            root            (height 1)
//! gen.0.0          first child     (height 2)
//! gen.0.0.10       eleventh grandchild
//! ```
//!
//! Everything here is a pure function over `&str`. The separator is a single
//! ASCII byte, which lets ancestry be decided with prefix checks instead of
//! tokenizing both strings.

use core::cmp::Ordering;
use core::fmt;

use crate::error::{Error, Result};

/// Separator between identifier segments.
pub const SEPARATOR: char = '.';

/// Leading segment shared by every identifier.
pub const ROOT_PREFIX: &str = "gen";

/// Identifier given to a synthesized root.
pub const ROOT_ID: &str = "gen.0";

const _: () = assert!(SEPARATOR.is_ascii(), "separator must be a single byte");

const SEP: u8 = SEPARATOR as u8;

/// Number of separators in `id`; the root `gen.0` has height 1.
pub fn height(id: &str) -> usize {
    id.bytes().filter(|&b| b == SEP).count()
}

/// All segments of `id`, prefix included.
pub fn segments(id: &str) -> impl Iterator<Item = &str> {
    id.split(SEPARATOR)
}

/// Final segment of `id` (the whole string if it has no separator).
pub fn last_segment(id: &str) -> &str {
    match id.rsplit_once(SEPARATOR) {
        Some((_, last)) => last,
        None => id,
    }
}

/// Identifier of the direct parent implied by `id`, if any.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once(SEPARATOR).map(|(parent, _)| parent)
}

/// Identifier of the `index`-th child of `parent`.
pub fn child_id(parent: &str, index: usize) -> String {
    format!("{parent}{SEPARATOR}{index}")
}

/// True iff `ancestor` is a strict prefix of `descendant` ending exactly at a
/// separator. A node is never its own ancestor.
pub fn is_ancestor_of(ancestor: &str, descendant: &str) -> bool {
    descendant.len() > ancestor.len()
        && descendant.starts_with(ancestor)
        && descendant.as_bytes()[ancestor.len()] == SEP
}

/// True iff `parent` is an ancestor of `child` exactly one level up.
pub fn is_parent_of(parent: &str, child: &str) -> bool {
    is_ancestor_of(parent, child) && !child.as_bytes()[parent.len() + 1..].contains(&SEP)
}

/// Total order over identifiers consistent with the tree.
///
/// Segments are compared pairwise: numerically when both are digit strings,
/// literally otherwise. An identifier sorts before all of its descendants, and
/// `gen.0.2` sorts before `gen.0.10`. Only identical strings compare equal.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut lhs = a.split(SEPARATOR);
    let mut rhs = b.split(SEPARATOR);
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_segment(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn compare_segment(x: &str, y: &str) -> Ordering {
    if is_numeric(x) && is_numeric(y) {
        // Compare digit strings by magnitude without parsing, so arbitrarily
        // long segments cannot overflow.
        let xs = x.trim_start_matches('0');
        let ys = y.trim_start_matches('0');
        xs.len()
            .cmp(&ys.len())
            .then_with(|| xs.cmp(ys))
            .then_with(|| x.cmp(y))
    } else {
        x.cmp(y)
    }
}

/// Check `id` against the identifier convention.
///
/// Readers call this before handing nodes to the builder: the prefix must be
/// [`ROOT_PREFIX`], at least one segment must follow it, and every following
/// segment must be canonical decimal text (`0`, `7`, `12`; never `07` or `x`).
pub fn validate(id: &str) -> Result<()> {
    let malformed = |reason| Error::MalformedId {
        id: id.to_string(),
        reason,
    };

    let mut parts = id.split(SEPARATOR);
    if parts.next() != Some(ROOT_PREFIX) {
        return Err(malformed("identifier must start with the root prefix"));
    }

    let mut count = 0usize;
    for segment in parts {
        count += 1;
        if !is_numeric(segment) {
            return Err(malformed("segments after the prefix must be decimal digits"));
        }
        if segment.len() > 1 && segment.starts_with('0') {
            return Err(malformed("segments must not carry leading zeros"));
        }
    }
    if count == 0 {
        return Err(malformed("identifier has no segment after the prefix"));
    }
    Ok(())
}

/// Owned identifier ordered by [`compare`], for use as an ordered-map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdKey(pub String);

impl IdKey {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The wrapped identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for IdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.0, &other.0)
    }
}

impl PartialOrd for IdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
