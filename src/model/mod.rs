//! In-memory model of a hierarchical secret store.
//!
//! A [`Database`] owns one root [`Group`], a [`Metadata`] block, and a log
//! of [`DeletedObject`] tombstones. Groups and entries live in a
//! uuid-addressed arena inside the database; parent links and child lists
//! are uuid handles, which keeps whole-tree lookups O(1) and lets the
//! merger relocate items without touching the items themselves.
//!
//! Tree mutation never stamps timestamps on its own. Callers that want a
//! stamped mutation pass the stamp explicitly; the merger never does,
//! because the timestamps it installs are part of the data being merged.

pub mod clock;

mod compare;
mod custom_data;
mod database;
mod entry;
mod group;
mod metadata;
mod times;

pub use compare::CompareOptions;
pub use custom_data::{CustomData, LAST_MODIFIED};
pub use database::{Database, DeletedObject, ModelError};
pub use entry::Entry;
pub use group::{Group, Icon, MergeMode};
pub use metadata::Metadata;
pub use times::TimeInfo;
