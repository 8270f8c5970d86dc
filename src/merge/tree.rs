//! Recursive walk of the source tree into the target tree.
//!
//! At every level, entries are processed before child groups; recursion is
//! depth-first in source order. Missing items are cloned in, moved items
//! are relocated, and items present on both sides are handed to the
//! conflict resolvers. Whole-tree uuid lookups on the target decide
//! presence, so an item moved anywhere in the target is found from any
//! subtree.

use tracing::warn;
use uuid::Uuid;

use crate::merge::change::{Change, ChangeList, ChangeType};
use crate::merge::resolve;
use crate::model::clock;
use crate::model::{Database, MergeMode};

/// Merge the source group's subtree into the target group's subtree.
pub(crate) fn merge_group(
    source: &Database,
    target: &mut Database,
    source_group: Uuid,
    target_group: Uuid,
    forced_mode: Option<MergeMode>,
) -> ChangeList {
    let mut changes = ChangeList::new();
    let Some(src_group) = source.find_group(source_group) else {
        warn!("source group {source_group} vanished during the tree walk");
        return changes;
    };
    let entry_handles: Vec<Uuid> = src_group.entries().to_vec();
    let child_handles: Vec<Uuid> = src_group.groups().to_vec();

    for uuid in entry_handles {
        let Some(source_entry) = source.find_entry(uuid) else {
            warn!("source entry {uuid} vanished during the tree walk");
            continue;
        };
        match target.find_entry(uuid) {
            None => {
                changes.push(Change::for_entry(
                    ChangeType::Added,
                    source,
                    source_entry,
                    "Creating missing",
                ));
                if let Err(err) = target.attach_entry(source_entry.duplicate(), target_group) {
                    warn!("could not create entry {uuid}: {err}");
                }
            }
            Some(target_entry) => {
                let relocated = clock::serialized(target_entry.times.location_changed)
                    < clock::serialized(source_entry.times.location_changed)
                    && target_entry.parent() != Some(target_group);
                if relocated {
                    changes.push(Change::for_entry(
                        ChangeType::Moved,
                        source,
                        source_entry,
                        "Relocating",
                    ));
                    if let Err(err) = target.relocate_entry(uuid, target_group) {
                        warn!("could not relocate entry {uuid}: {err}");
                    }
                }
                let mode = effective_mode(target, target_group, forced_mode);
                changes.extend(resolve::resolve_entry_conflict(source, target, uuid, mode));
            }
        }
    }

    for uuid in child_handles {
        let Some(source_child) = source.find_group(uuid) else {
            warn!("source group {uuid} vanished during the tree walk");
            continue;
        };
        match target.find_group(uuid) {
            None => {
                changes.push(Change::for_group(
                    ChangeType::Added,
                    source,
                    source_child,
                    "Creating missing",
                ));
                // The shell carries the source's times, location stamp
                // included; entries and children follow via recursion.
                if let Err(err) = target.attach_group(source_child.clone_shell(), target_group) {
                    warn!("could not create group {uuid}: {err}");
                    continue;
                }
            }
            Some(target_child) => {
                let relocated = clock::serialized(target_child.times.location_changed)
                    < clock::serialized(source_child.times.location_changed)
                    && target_child.parent() != Some(target_group);
                if relocated {
                    changes.push(Change::for_group(
                        ChangeType::Moved,
                        source,
                        source_child,
                        "Relocating",
                    ));
                    match target.relocate_group(uuid, target_group) {
                        Ok(()) => {
                            target
                                .find_group_mut(uuid)
                                .expect("relocated above")
                                .times
                                .location_changed = source_child.times.location_changed;
                        }
                        Err(err) => warn!("could not relocate group {uuid}: {err}"),
                    }
                }
                changes.extend(resolve::resolve_group_conflict(source, target, uuid));
            }
        }
        changes.extend(merge_group(source, target, uuid, uuid, forced_mode));
    }
    changes
}

fn effective_mode(
    target: &Database,
    target_group: Uuid,
    forced_mode: Option<MergeMode>,
) -> MergeMode {
    forced_mode.unwrap_or_else(|| target.effective_merge_mode(target_group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::model::{Entry, Group};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn add_group(db: &mut Database, uuid: Uuid, name: &str, parent: Uuid) {
        db.attach_group(Group::new(uuid, name, ts(1)), parent).unwrap();
    }

    fn add_root_group(db: &mut Database, uuid: Uuid, name: &str) {
        let root = db.root_uuid();
        add_group(db, uuid, name, root);
    }

    fn add_entry(db: &mut Database, uuid: Uuid, title: &str, parent: Uuid) {
        db.attach_entry(Entry::new(uuid, title, ts(1)), parent).unwrap();
    }

    fn walk(source: &Database, target: &mut Database) -> ChangeList {
        merge_group(source, target, source.root_uuid(), target.root_uuid(), None)
    }

    #[test]
    fn missing_entry_is_created_under_the_paired_group() {
        let mut source = Database::new(ts(1));
        let folder = Uuid::new_v4();
        let account = Uuid::new_v4();
        add_root_group(&mut source, folder, "Mail");
        add_entry(&mut source, account, "Gmail", folder);

        let mut target = Database::new(ts(1));
        add_root_group(&mut target, folder, "Mail");

        let changes = walk(&source, &mut target);

        assert_eq!(target.find_entry(account).unwrap().parent(), Some(folder));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeType::Added);
        assert_eq!(changes[0].title, "Gmail");
        assert_eq!(changes[0].group, "/Root/Mail");
    }

    #[test]
    fn entry_follows_the_newer_location() {
        let (a, b, account) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut source = Database::new(ts(1));
        add_root_group(&mut source, a, "A");
        add_root_group(&mut source, b, "B");
        add_entry(&mut source, account, "VPN", b);
        source.find_entry_mut(account).unwrap().times.location_changed = ts(10);

        let mut target = Database::new(ts(1));
        add_root_group(&mut target, a, "A");
        add_root_group(&mut target, b, "B");
        add_entry(&mut target, account, "VPN", a);
        target.find_entry_mut(account).unwrap().times.location_changed = ts(5);

        let changes = walk(&source, &mut target);

        assert_eq!(target.find_entry(account).unwrap().parent(), Some(b));
        assert!(changes.iter().any(|c| c.kind == ChangeType::Moved));
    }

    #[test]
    fn entry_with_older_source_location_stays_put() {
        let (a, b, account) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut source = Database::new(ts(1));
        add_root_group(&mut source, a, "A");
        add_root_group(&mut source, b, "B");
        add_entry(&mut source, account, "VPN", b);
        source.find_entry_mut(account).unwrap().times.location_changed = ts(5);

        let mut target = Database::new(ts(1));
        add_root_group(&mut target, a, "A");
        add_root_group(&mut target, b, "B");
        add_entry(&mut target, account, "VPN", a);
        target.find_entry_mut(account).unwrap().times.location_changed = ts(10);

        let changes = walk(&source, &mut target);

        assert_eq!(target.find_entry(account).unwrap().parent(), Some(a));
        assert!(changes.iter().all(|c| c.kind != ChangeType::Moved));
    }

    #[test]
    fn missing_group_is_created_as_a_shell_and_filled_by_recursion() {
        let folder = Uuid::new_v4();
        let account = Uuid::new_v4();
        let mut source = Database::new(ts(1));
        add_root_group(&mut source, folder, "Work");
        add_entry(&mut source, account, "Badge", folder);
        source.find_group_mut(folder).unwrap().times.location_changed = ts(7);

        let mut target = Database::new(ts(1));
        let changes = walk(&source, &mut target);

        let created = target.find_group(folder).unwrap();
        assert_eq!(created.name, "Work");
        assert_eq!(created.parent(), Some(target.root_uuid()));
        assert_eq!(created.times.location_changed, ts(7));
        assert_eq!(target.find_entry(account).unwrap().parent(), Some(folder));
        let kinds: Vec<ChangeType> = changes.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [ChangeType::Added, ChangeType::Added]);
    }

    #[test]
    fn moved_group_takes_the_source_location_stamp() {
        let (outer, inner) = (Uuid::new_v4(), Uuid::new_v4());
        let mut source = Database::new(ts(1));
        add_root_group(&mut source, outer, "Outer");
        add_group(&mut source, inner, "Inner", outer);
        source.find_group_mut(inner).unwrap().times.location_changed = ts(20);

        let mut target = Database::new(ts(1));
        add_root_group(&mut target, outer, "Outer");
        add_root_group(&mut target, inner, "Inner");
        target.find_group_mut(inner).unwrap().times.location_changed = ts(2);

        let changes = walk(&source, &mut target);

        let moved = target.find_group(inner).unwrap();
        assert_eq!(moved.parent(), Some(outer));
        assert_eq!(moved.times.location_changed, ts(20));
        assert!(changes.iter().any(|c| c.kind == ChangeType::Moved));
    }
}
