//! vaultmerge - a three-way-free merger for hierarchical secret stores.
//!
//! Two tree-structured databases (a read-only *source* and a mutable
//! *target*) are reconciled without a common ancestor, using only per-item
//! modification timestamps, per-item location-change timestamps, and a log
//! of tombstones. The merge mutates the target in place and returns a list
//! of [`merge::Change`] records describing what happened.

pub mod merge;
pub mod model;

pub use merge::{Change, ChangeList, ChangeType, MergeError, Merger};
pub use model::{
    CompareOptions, CustomData, Database, DeletedObject, Entry, Group, Icon, MergeMode, Metadata,
    ModelError, TimeInfo,
};
