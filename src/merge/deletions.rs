//! Tombstone reconciliation and application.
//!
//! Both sides' deletion logs are unioned (earliest deletion time wins per
//! uuid: a live revision must be newer than every known tombstone to
//! survive), partitioned into live entries, live groups and plain
//! tombstones, and applied to the target. Entries go first; groups are
//! processed leaf-first so a group is only judged after all its
//! candidate-for-deletion descendants. The target's deletion log is then
//! rewritten from the union.

use std::collections::{HashMap, VecDeque};

use tracing::warn;
use uuid::Uuid;

use crate::merge::change::{Change, ChangeList, ChangeType};
use crate::model::{Database, DeletedObject, MergeMode};

/// Apply the merged tombstones to the target and rewrite its deletion log.
///
/// Deletions only propagate under [`MergeMode::Synchronize`]; every other
/// mode leaves the target's deletion log untouched.
pub(crate) fn merge_deletions(
    source: &Database,
    target: &mut Database,
    mode: MergeMode,
) -> ChangeList {
    let mut changes = ChangeList::new();
    if mode != MergeMode::Synchronize {
        return changes;
    }

    // Union, first occurrence fixing the order, earliest time winning.
    let mut merged: HashMap<Uuid, DeletedObject> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();
    for object in target
        .deleted_objects()
        .iter()
        .chain(source.deleted_objects())
    {
        match merged.get_mut(&object.uuid) {
            None => {
                merged.insert(object.uuid, *object);
                order.push(object.uuid);
            }
            Some(existing) => {
                if existing.deletion_time > object.deletion_time {
                    *existing = *object;
                }
            }
        }
    }

    let mut deletions: Vec<DeletedObject> = Vec::new();
    let mut entries: Vec<Uuid> = Vec::new();
    let mut groups: VecDeque<Uuid> = VecDeque::new();
    for uuid in order {
        if target.find_entry(uuid).is_some() {
            entries.push(uuid);
        } else if target.find_group(uuid).is_some() {
            groups.push_back(uuid);
        } else {
            // Not live here; the item may exist in another replica.
            deletions.push(merged[&uuid]);
        }
    }

    for uuid in entries {
        let object = merged[&uuid];
        let Some(entry) = target.find_entry(uuid) else {
            continue;
        };
        if entry.times.last_modification > object.deletion_time {
            // Edited after the deletion date; the tombstone loses.
            continue;
        }
        let details = if entry.parent().is_some() {
            "Deleting child"
        } else {
            "Deleting orphan"
        };
        changes.push(Change::for_entry(ChangeType::Deleted, target, entry, details));
        deletions.push(object);
        target.erase_entry(uuid);
    }

    while let Some(uuid) = groups.pop_front() {
        let Some(group) = target.find_group(uuid) else {
            continue;
        };
        if group.groups().iter().any(|child| groups.contains(child)) {
            // A child is still pending; judge this group after it.
            groups.push_back(uuid);
            continue;
        }
        let object = merged[&uuid];
        if group.times.last_modification > object.deletion_time {
            continue;
        }
        if target.group_has_live_content(uuid) {
            // Undeleted content keeps the group; its tombstone is dropped.
            continue;
        }
        if uuid == target.root_uuid() {
            continue;
        }
        let details = if group.parent().is_some() {
            "Deleting child"
        } else {
            "Deleting orphan"
        };
        changes.push(Change::for_group(ChangeType::Deleted, target, group, details));
        deletions.push(object);
        if let Err(err) = target.erase_group(uuid) {
            warn!("could not erase group {uuid}: {err}");
        }
    }

    if deletions != target.deleted_objects() {
        changes.push(Change::summary("Changed deleted objects"));
    }
    target.set_deleted_objects(deletions);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::model::{Entry, Group};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn tombstone(uuid: Uuid, secs: i64) -> DeletedObject {
        DeletedObject {
            uuid,
            deletion_time: ts(secs),
        }
    }

    fn add_entry(db: &mut Database, uuid: Uuid, title: &str, parent: Uuid, mod_secs: i64) {
        let mut entry = Entry::new(uuid, title, ts(1));
        entry.times.last_modification = ts(mod_secs);
        db.attach_entry(entry, parent).unwrap();
    }

    fn add_root_entry(db: &mut Database, uuid: Uuid, title: &str, mod_secs: i64) {
        let root = db.root_uuid();
        add_entry(db, uuid, title, root, mod_secs);
    }

    #[test]
    fn other_modes_leave_the_log_untouched() {
        let source = Database::new(ts(1));
        let mut target = Database::new(ts(1));
        target.set_deleted_objects(vec![tombstone(Uuid::new_v4(), 5)]);
        let before = target.deleted_objects().to_vec();

        let changes = merge_deletions(&source, &mut target, MergeMode::KeepLocal);
        assert!(changes.is_empty());
        assert_eq!(target.deleted_objects(), before);
    }

    #[test]
    fn edited_after_deletion_survives_and_drops_the_tombstone() {
        let uuid = Uuid::new_v4();
        let mut source = Database::new(ts(1));
        source.set_deleted_objects(vec![tombstone(uuid, 10)]);
        let mut target = Database::new(ts(1));
        add_root_entry(&mut target, uuid, "Edited", 20);

        let changes = merge_deletions(&source, &mut target, MergeMode::Synchronize);

        assert!(target.find_entry(uuid).is_some());
        assert!(target.deleted_objects().is_empty());
        assert!(changes.is_empty());
    }

    #[test]
    fn stale_entry_is_erased_and_the_tombstone_kept() {
        let uuid = Uuid::new_v4();
        let mut source = Database::new(ts(1));
        source.set_deleted_objects(vec![tombstone(uuid, 10)]);
        let mut target = Database::new(ts(1));
        add_root_entry(&mut target, uuid, "Stale", 5);

        let changes = merge_deletions(&source, &mut target, MergeMode::Synchronize);

        assert!(target.find_entry(uuid).is_none());
        assert_eq!(target.deleted_objects(), [tombstone(uuid, 10)]);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeType::Deleted);
        assert_eq!(changes[0].details, "Deleting child");
        assert_eq!(changes[1], Change::summary("Changed deleted objects"));
    }

    #[test]
    fn union_keeps_the_earliest_tombstone_per_uuid() {
        let uuid = Uuid::new_v4();
        let mut source = Database::new(ts(1));
        source.set_deleted_objects(vec![tombstone(uuid, 5)]);
        let mut target = Database::new(ts(1));
        target.set_deleted_objects(vec![tombstone(uuid, 9)]);

        merge_deletions(&source, &mut target, MergeMode::Synchronize);
        assert_eq!(target.deleted_objects(), [tombstone(uuid, 5)]);
    }

    #[test]
    fn groups_are_judged_leaf_first() {
        let (outer, inner) = (Uuid::new_v4(), Uuid::new_v4());
        let account = Uuid::new_v4();
        let mut target = Database::new(ts(1));
        target
            .attach_group(Group::new(outer, "Outer", ts(1)), target.root_uuid())
            .unwrap();
        target.attach_group(Group::new(inner, "Inner", ts(1)), outer).unwrap();
        add_entry(&mut target, account, "Old", inner, 2);

        let mut source = Database::new(ts(1));
        // outer enqueued before inner, forcing a re-enqueue rotation
        source.set_deleted_objects(vec![
            tombstone(outer, 10),
            tombstone(inner, 10),
            tombstone(account, 10),
        ]);

        let changes = merge_deletions(&source, &mut target, MergeMode::Synchronize);

        assert!(target.find_group(outer).is_none());
        assert!(target.find_group(inner).is_none());
        assert!(target.find_entry(account).is_none());
        assert_eq!(target.deleted_objects().len(), 3);
        let deleted = changes.iter().filter(|c| c.kind == ChangeType::Deleted).count();
        assert_eq!(deleted, 3);
    }

    #[test]
    fn group_with_surviving_content_is_preserved() {
        let folder = Uuid::new_v4();
        let keeper = Uuid::new_v4();
        let mut target = Database::new(ts(1));
        target
            .attach_group(Group::new(folder, "Folder", ts(1)), target.root_uuid())
            .unwrap();
        add_entry(&mut target, keeper, "Edited", folder, 20);

        let mut source = Database::new(ts(1));
        source.set_deleted_objects(vec![tombstone(folder, 10), tombstone(keeper, 10)]);

        merge_deletions(&source, &mut target, MergeMode::Synchronize);

        // the entry outlived its tombstone, so the folder stays too
        assert!(target.find_group(folder).is_some());
        assert!(target.find_entry(keeper).is_some());
        assert!(target.deleted_objects().is_empty());
    }

    #[test]
    fn unknown_tombstones_are_carried_through() {
        let elsewhere = Uuid::new_v4();
        let mut source = Database::new(ts(1));
        source.set_deleted_objects(vec![tombstone(elsewhere, 3)]);
        let mut target = Database::new(ts(1));

        merge_deletions(&source, &mut target, MergeMode::Synchronize);
        assert_eq!(target.deleted_objects(), [tombstone(elsewhere, 3)]);
    }
}
