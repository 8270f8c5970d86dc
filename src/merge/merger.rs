//! Merge driver: phase ordering, scoping, forced merge mode.

use uuid::Uuid;

use crate::merge::change::ChangeList;
use crate::merge::error::MergeError;
use crate::merge::{deletions, metadata, tree};
use crate::model::{Database, MergeMode};

/// Drives a merge of a source database (or subtree) into a target.
///
/// The merger takes the target mutably for its whole lifetime; a merge is
/// single-threaded, synchronous and deterministic for its inputs. Callers
/// that want a preview run the same merge against a
/// [`Database::deep_clone`] of the target and compare change lists.
pub struct Merger<'a> {
    source: &'a Database,
    target: &'a mut Database,
    source_group: Uuid,
    target_group: Uuid,
    forced_mode: Option<MergeMode>,
}

impl<'a> Merger<'a> {
    /// Whole-database merge, scoped at both roots.
    pub fn new(source: &'a Database, target: &'a mut Database) -> Self {
        let source_group = source.root_uuid();
        let target_group = target.root_uuid();
        Merger {
            source,
            target,
            source_group,
            target_group,
            forced_mode: None,
        }
    }

    /// Merge restricted to a subtree pair. Uuid lookups still consult the
    /// whole target tree, so items moved out of the subtree are found.
    pub fn from_groups(
        source: &'a Database,
        source_group: Uuid,
        target: &'a mut Database,
        target_group: Uuid,
    ) -> Result<Self, MergeError> {
        if source.find_group(source_group).is_none() {
            return Err(MergeError::UnknownSourceGroup(source_group));
        }
        if target.find_group(target_group).is_none() {
            return Err(MergeError::UnknownTargetGroup(target_group));
        }
        Ok(Merger {
            source,
            target,
            source_group,
            target_group,
            forced_mode: None,
        })
    }

    /// Override the per-group merge mode. Forcing [`MergeMode::Default`]
    /// is the same as resetting.
    pub fn set_forced_merge_mode(&mut self, mode: MergeMode) {
        self.forced_mode = (mode != MergeMode::Default).then_some(mode);
    }

    pub fn reset_forced_merge_mode(&mut self) {
        self.forced_mode = None;
    }

    /// Run the merge: tree, then deletions, then metadata.
    ///
    /// The order is mandatory - the tree phase may re-insert an item whose
    /// tombstone would otherwise remove it, and the deletion phase must see
    /// it live to apply the modified-after-deletion test.
    pub fn merge(&mut self) -> ChangeList {
        let mut changes = tree::merge_group(
            self.source,
            self.target,
            self.source_group,
            self.target_group,
            self.forced_mode,
        );
        changes.extend(deletions::merge_deletions(
            self.source,
            self.target,
            self.effective_mode(),
        ));
        changes.extend(metadata::merge_metadata(self.source, self.target));
        if !changes.is_empty() {
            self.target.mark_modified();
        }
        changes
    }

    fn effective_mode(&self) -> MergeMode {
        self.forced_mode
            .unwrap_or_else(|| self.target.effective_merge_mode(self.target_group))
    }
}
