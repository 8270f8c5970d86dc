//! Three-way-free merge of two secret-store databases.
//!
//! The merger reconciles a read-only *source* tree into a mutable *target*
//! tree without a common ancestor, using only per-item timestamps and the
//! tombstone logs of both sides.
//!
//! # Overview
//!
//! A merge runs three phases in a fixed order:
//!
//! 1. Tree phase - walk the source tree; insert missing groups/entries,
//!    relocate moved items, resolve per-item conflicts.
//! 2. Deletion phase - union the tombstones of both sides and apply them
//!    to the target, keeping items that were edited after their deletion.
//! 3. Metadata phase - union custom icons and take the newer custom-data
//!    dictionary.
//!
//! The order is load-bearing: the tree phase may re-insert an item whose
//! tombstone would otherwise remove it, and the deletion phase must see
//! that item live to apply the modified-after-deletion test. Metadata runs
//! last so uuid-referenced icons survive any entry/group churn.
//!
//! # Key types
//!
//! - [`Merger`] - drives a merge and aggregates the change list
//! - [`Change`] / [`ChangeType`] - one row of the merge report
//! - [`MergeError`] - construction-time failures
//!
//! # Example
//!
//! ```ignore
//! use vaultmerge::Merger;
//!
//! let changes = Merger::new(&source, &mut target).merge();
//! for change in &changes {
//!     println!("{change}");
//! }
//! ```

mod change;
mod deletions;
mod error;
mod history;
mod merger;
mod metadata;
mod resolve;
mod tree;

pub use change::{Change, ChangeList, ChangeType};
pub use error::MergeError;
pub use merger::Merger;
