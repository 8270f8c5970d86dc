//! The database: a uuid-addressed arena of groups and entries, plus the
//! metadata block and the deletion log.
//!
//! Parent links and child lists are uuid handles into the arena, so a
//! whole-tree lookup is a map access and reparenting an item never moves
//! the item's data. Structure is only mutated through the methods here,
//! which keeps the arena and the handle lists consistent.
//!
//! Two deletion flavors exist on purpose: [`Database::delete_entry`] /
//! [`Database::delete_group`] record tombstones the way an interactive
//! caller expects, while [`Database::erase_entry`] / [`Database::erase_group`]
//! leave the deletion log untouched so a merge can rebuild it from the
//! merged tombstone union afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entry::Entry;
use crate::model::group::{Group, MergeMode};
use crate::model::metadata::Metadata;

// =============================================================================
// DeletedObject
// =============================================================================

/// Tombstone: proof that the item with this uuid was deleted at a known
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedObject {
    pub uuid: Uuid,
    pub deletion_time: DateTime<Utc>,
}

// =============================================================================
// ModelError
// =============================================================================

/// Structural errors from tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// No group with this uuid is live in the database.
    #[error("unknown group: {0}")]
    UnknownGroup(Uuid),

    /// No entry with this uuid is live in the database.
    #[error("unknown entry: {0}")]
    UnknownEntry(Uuid),

    /// The uuid is already taken by a live group or entry.
    #[error("uuid already present in the tree: {0}")]
    DuplicateUuid(Uuid),

    /// Reparenting the group under its own subtree would detach it from
    /// the root.
    #[error("cannot reparent group {0} under its own subtree")]
    WouldCreateCycle(Uuid),

    /// The root group cannot be moved or erased.
    #[error("the root group cannot be moved or erased")]
    RootIsImmovable,
}

// =============================================================================
// Database
// =============================================================================

/// An in-memory secret-store database.
#[derive(Debug, Clone)]
pub struct Database {
    root: Uuid,
    groups: HashMap<Uuid, Group>,
    entries: HashMap<Uuid, Entry>,
    metadata: Metadata,
    deleted_objects: Vec<DeletedObject>,
    modified: bool,
}

impl Database {
    /// Fresh database with an empty root group stamped at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        let root = Group::new(Uuid::new_v4(), "Root", at);
        let root_uuid = root.uuid;
        let mut groups = HashMap::new();
        groups.insert(root_uuid, root);
        Database {
            root: root_uuid,
            groups,
            entries: HashMap::new(),
            metadata: Metadata::default(),
            deleted_objects: Vec::new(),
            modified: false,
        }
    }

    pub fn root_uuid(&self) -> Uuid {
        self.root
    }

    pub fn root(&self) -> &Group {
        &self.groups[&self.root]
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn deleted_objects(&self) -> &[DeletedObject] {
        &self.deleted_objects
    }

    /// Replace the deletion log wholesale.
    pub fn set_deleted_objects(&mut self, deletions: Vec<DeletedObject>) {
        self.deleted_objects = deletions;
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Deep copy sharing nothing with `self`; the preview flow merges into
    /// one of these and compares change lists.
    pub fn deep_clone(&self) -> Database {
        self.clone()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Whole-tree lookup by uuid.
    pub fn find_group(&self, uuid: Uuid) -> Option<&Group> {
        self.groups.get(&uuid)
    }

    pub fn find_group_mut(&mut self, uuid: Uuid) -> Option<&mut Group> {
        self.groups.get_mut(&uuid)
    }

    /// Whole-tree lookup by uuid.
    pub fn find_entry(&self, uuid: Uuid) -> Option<&Entry> {
        self.entries.get(&uuid)
    }

    pub fn find_entry_mut(&mut self, uuid: Uuid) -> Option<&mut Entry> {
        self.entries.get_mut(&uuid)
    }

    /// All live entries, in arbitrary order.
    pub fn iter_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// All live groups, in arbitrary order.
    pub fn iter_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Full path of a group, `/Root/Sub/Leaf` style. Empty for unknown
    /// uuids.
    pub fn group_path(&self, uuid: Uuid) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(uuid);
        while let Some(current) = cursor {
            let Some(group) = self.groups.get(&current) else {
                return String::new();
            };
            names.push(group.name.as_str());
            cursor = group.parent;
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name);
        }
        path
    }

    /// Resolve a group's merge policy: `Default` defers to the parent
    /// chain, and an unset root synchronizes.
    pub fn effective_merge_mode(&self, group: Uuid) -> MergeMode {
        let mut cursor = Some(group);
        while let Some(current) = cursor {
            let Some(group) = self.groups.get(&current) else {
                break;
            };
            if group.merge_mode != MergeMode::Default {
                return group.merge_mode;
            }
            cursor = group.parent;
        }
        MergeMode::Synchronize
    }

    /// Whether the group still holds any live entry or subgroup. A
    /// non-empty child list implies recursive content.
    pub fn group_has_live_content(&self, uuid: Uuid) -> bool {
        self.groups
            .get(&uuid)
            .is_some_and(|group| !group.entries.is_empty() || !group.groups.is_empty())
    }

    fn is_descendant_of(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        let mut cursor = self.groups.get(&candidate).and_then(|group| group.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.groups.get(&current).and_then(|group| group.parent);
        }
        false
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Attach a detached entry under `parent`. The entry keeps its own
    /// timestamps; attaching stamps nothing.
    pub fn attach_entry(&mut self, mut entry: Entry, parent: Uuid) -> Result<(), ModelError> {
        if !self.groups.contains_key(&parent) {
            return Err(ModelError::UnknownGroup(parent));
        }
        if self.entries.contains_key(&entry.uuid) || self.groups.contains_key(&entry.uuid) {
            return Err(ModelError::DuplicateUuid(entry.uuid));
        }
        entry.parent = Some(parent);
        let uuid = entry.uuid;
        self.entries.insert(uuid, entry);
        self.groups
            .get_mut(&parent)
            .expect("checked above")
            .entries
            .push(uuid);
        Ok(())
    }

    /// Attach a detached group under `parent`. Any handles in the value's
    /// child lists are discarded; children are attached individually.
    pub fn attach_group(&mut self, mut group: Group, parent: Uuid) -> Result<(), ModelError> {
        if !self.groups.contains_key(&parent) {
            return Err(ModelError::UnknownGroup(parent));
        }
        if self.entries.contains_key(&group.uuid) || self.groups.contains_key(&group.uuid) {
            return Err(ModelError::DuplicateUuid(group.uuid));
        }
        group.parent = Some(parent);
        group.groups.clear();
        group.entries.clear();
        let uuid = group.uuid;
        self.groups.insert(uuid, group);
        self.groups
            .get_mut(&parent)
            .expect("checked above")
            .groups
            .push(uuid);
        Ok(())
    }

    /// Reparent an entry. No-op when the parents are identical; stamps
    /// nothing either way.
    pub fn relocate_entry(&mut self, uuid: Uuid, new_parent: Uuid) -> Result<(), ModelError> {
        if !self.groups.contains_key(&new_parent) {
            return Err(ModelError::UnknownGroup(new_parent));
        }
        let old_parent = match self.entries.get(&uuid) {
            Some(entry) => entry.parent,
            None => return Err(ModelError::UnknownEntry(uuid)),
        };
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if let Some(old) = old_parent
            && let Some(group) = self.groups.get_mut(&old)
        {
            group.entries.retain(|handle| *handle != uuid);
        }
        self.groups
            .get_mut(&new_parent)
            .expect("checked above")
            .entries
            .push(uuid);
        self.entries.get_mut(&uuid).expect("checked above").parent = Some(new_parent);
        Ok(())
    }

    /// Reparent a group. No-op when the parents are identical; stamps
    /// nothing either way.
    pub fn relocate_group(&mut self, uuid: Uuid, new_parent: Uuid) -> Result<(), ModelError> {
        if uuid == self.root {
            return Err(ModelError::RootIsImmovable);
        }
        if !self.groups.contains_key(&uuid) {
            return Err(ModelError::UnknownGroup(uuid));
        }
        if !self.groups.contains_key(&new_parent) {
            return Err(ModelError::UnknownGroup(new_parent));
        }
        if new_parent == uuid || self.is_descendant_of(new_parent, uuid) {
            return Err(ModelError::WouldCreateCycle(uuid));
        }
        let old_parent = self.groups[&uuid].parent;
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if let Some(old) = old_parent
            && let Some(group) = self.groups.get_mut(&old)
        {
            group.groups.retain(|handle| *handle != uuid);
        }
        self.groups
            .get_mut(&new_parent)
            .expect("checked above")
            .groups
            .push(uuid);
        self.groups.get_mut(&uuid).expect("checked above").parent = Some(new_parent);
        Ok(())
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove an entry from the tree without recording a tombstone.
    pub fn erase_entry(&mut self, uuid: Uuid) -> Option<Entry> {
        let entry = self.entries.remove(&uuid)?;
        if let Some(parent) = entry.parent
            && let Some(group) = self.groups.get_mut(&parent)
        {
            group.entries.retain(|handle| *handle != uuid);
        }
        Some(entry)
    }

    /// Remove a group and its whole subtree without recording tombstones.
    pub fn erase_group(&mut self, uuid: Uuid) -> Result<(), ModelError> {
        if uuid == self.root {
            return Err(ModelError::RootIsImmovable);
        }
        if !self.groups.contains_key(&uuid) {
            return Err(ModelError::UnknownGroup(uuid));
        }
        for group_uuid in self.subtree_post_order(uuid) {
            let group = self
                .groups
                .remove(&group_uuid)
                .expect("subtree handles are live");
            for entry_uuid in &group.entries {
                self.entries.remove(entry_uuid);
            }
            if group_uuid == uuid
                && let Some(parent) = group.parent
                && let Some(parent_group) = self.groups.get_mut(&parent)
            {
                parent_group.groups.retain(|handle| *handle != uuid);
            }
        }
        Ok(())
    }

    /// Remove an entry and record a tombstone dated `at`.
    pub fn delete_entry(&mut self, uuid: Uuid, at: DateTime<Utc>) -> Result<(), ModelError> {
        match self.erase_entry(uuid) {
            Some(_) => {
                self.deleted_objects.push(DeletedObject {
                    uuid,
                    deletion_time: at,
                });
                Ok(())
            }
            None => Err(ModelError::UnknownEntry(uuid)),
        }
    }

    /// Remove a group subtree and record tombstones dated `at` for every
    /// removed item, deepest first.
    pub fn delete_group(&mut self, uuid: Uuid, at: DateTime<Utc>) -> Result<(), ModelError> {
        if uuid == self.root {
            return Err(ModelError::RootIsImmovable);
        }
        if !self.groups.contains_key(&uuid) {
            return Err(ModelError::UnknownGroup(uuid));
        }
        for group_uuid in self.subtree_post_order(uuid) {
            for entry_uuid in &self.groups[&group_uuid].entries {
                self.deleted_objects.push(DeletedObject {
                    uuid: *entry_uuid,
                    deletion_time: at,
                });
            }
            self.deleted_objects.push(DeletedObject {
                uuid: group_uuid,
                deletion_time: at,
            });
        }
        self.erase_group(uuid)
    }

    /// Subtree group handles, children before parents; `uuid` comes last.
    fn subtree_post_order(&self, uuid: Uuid) -> Vec<Uuid> {
        let mut ordered = Vec::new();
        let mut stack = vec![uuid];
        while let Some(current) = stack.pop() {
            ordered.push(current);
            if let Some(group) = self.groups.get(&current) {
                stack.extend(group.groups.iter().copied());
            }
        }
        ordered.reverse();
        ordered
    }
}
