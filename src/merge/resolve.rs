//! Per-item conflict resolution for items present on both sides.

use tracing::warn;
use uuid::Uuid;

use crate::merge::change::{Change, ChangeList, ChangeType};
use crate::merge::history;
use crate::model::clock;
use crate::model::{Database, MergeMode};

/// Decide which side's current revision of an entry wins and reconcile the
/// two history chains.
///
/// A strictly newer source replaces the target's current revision (the old
/// revision survives through the merged history); otherwise the source is
/// folded into the existing target entry in place. Relocation is handled
/// one level up, in the tree walker.
pub(crate) fn resolve_entry_conflict(
    source: &Database,
    target: &mut Database,
    uuid: Uuid,
    merge_mode: MergeMode,
) -> ChangeList {
    let mut changes = ChangeList::new();
    let max_items = target.metadata().history_max_items();
    let Some(source_entry) = source.find_entry(uuid) else {
        return changes;
    };
    let Some(target_entry) = target.find_entry(uuid) else {
        return changes;
    };

    let source_mod = clock::serialized(source_entry.times.last_modification);
    let target_mod = clock::serialized(target_entry.times.last_modification);

    if target_mod < source_mod {
        let former_parent = target_entry.parent();
        changes.push(Change::for_entry(
            ChangeType::Modified,
            target,
            target_entry,
            "Synchronizing from newer source",
        ));
        let mut replacement = source_entry.duplicate();
        history::merge_history(target_entry, &mut replacement, merge_mode, max_items);
        target.erase_entry(uuid);
        let Some(parent) = former_parent else {
            warn!("entry {uuid} had no parent while resolving a conflict");
            return changes;
        };
        if let Err(err) = target.attach_entry(replacement, parent) {
            warn!("could not re-attach merged entry {uuid}: {err}");
        }
    } else {
        let changed = {
            let target_entry = target.find_entry_mut(uuid).expect("checked above");
            history::merge_history(source_entry, target_entry, merge_mode, max_items)
        };
        if changed {
            let target_entry = target.find_entry(uuid).expect("checked above");
            changes.push(Change::for_entry(
                ChangeType::Modified,
                target,
                target_entry,
                "Synchronizing from older source",
            ));
        }
    }
    changes
}

/// Overwrite the target group's mutable properties when the source side is
/// strictly newer.
pub(crate) fn resolve_group_conflict(
    source: &Database,
    target: &mut Database,
    uuid: Uuid,
) -> ChangeList {
    let mut changes = ChangeList::new();
    let Some(source_group) = source.find_group(uuid) else {
        return changes;
    };
    let Some(target_group) = target.find_group(uuid) else {
        return changes;
    };

    let source_mod = clock::serialized(source_group.times.last_modification);
    let target_mod = clock::serialized(target_group.times.last_modification);
    if target_mod < source_mod {
        changes.push(Change::for_group(
            ChangeType::Modified,
            source,
            source_group,
            "Overwriting group properties",
        ));
        let name = source_group.name.clone();
        let notes = source_group.notes.clone();
        let icon = source_group.icon;
        let expiry = source_group.times.expiry;
        let last_modification = source_group.times.last_modification;

        let target_group = target.find_group_mut(uuid).expect("checked above");
        target_group.name = name;
        target_group.notes = notes;
        target_group.icon = icon;
        target_group.times.expiry = expiry;
        target_group.times.last_modification = last_modification;
    }
    changes
}
