//! List validation errors.

use thiserror::Error;

/// Structural defect found by [`List::check_links`](crate::List::check_links).
///
/// Positions count nodes from the front, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Exactly one of front and back is the sentinel.
    #[error("front and back disagree on emptiness")]
    EndsMismatch,
    /// A node's `prev` does not name the node walked before it.
    #[error("node at position {position} has a broken back link")]
    BrokenBackLink {
        /// Position of the offending node.
        position: usize,
    },
    /// The forward walk ended on a node other than `back`.
    #[error("forward walk ended after {position} nodes without reaching back")]
    BackUnreachable {
        /// Nodes walked before the walk ended.
        position: usize,
    },
    /// A link names an index the storage does not hold.
    #[error("node at position {position} is missing from storage")]
    MissingNode {
        /// Position of the missing node.
        position: usize,
    },
    /// The walk visited more nodes than the storage holds.
    #[error("forward walk exceeded {limit} nodes")]
    Cycle {
        /// Node count of the storage.
        limit: usize,
    },
}
