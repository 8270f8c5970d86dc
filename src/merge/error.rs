//! Error types for merge construction.

use uuid::Uuid;

/// Failures constructing a [`crate::merge::Merger`].
///
/// A merge itself never fails: invariant violations encountered mid-merge
/// are logged and resolved in favor of the first-seen value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The source scope uuid names no group in the source database.
    #[error("unknown source group: {0}")]
    UnknownSourceGroup(Uuid),

    /// The target scope uuid names no group in the target database.
    #[error("unknown target group: {0}")]
    UnknownTargetGroup(Uuid),
}
