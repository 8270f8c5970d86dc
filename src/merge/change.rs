//! Change records emitted by a merge.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Database, Entry, Group};

/// Kind of change applied to the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Added,
    Modified,
    Moved,
    Deleted,
    #[default]
    Unspecified,
}

impl ChangeType {
    /// Human-readable tag; empty for [`ChangeType::Unspecified`].
    pub fn label(&self) -> &'static str {
        match self {
            ChangeType::Added => "Added",
            ChangeType::Modified => "Modified",
            ChangeType::Moved => "Moved",
            ChangeType::Deleted => "Deleted",
            ChangeType::Unspecified => "",
        }
    }
}

/// One row of the merge report.
///
/// Two changes compare equal iff all five fields match; the preview flow
/// relies on this to detect a target that changed between preview and
/// commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeType,
    /// Full path of the group the change applies to (for entries, the
    /// owning group). Empty for summary changes.
    pub group: String,
    /// Entry title; empty for group and summary changes.
    pub title: String,
    pub uuid: Option<Uuid>,
    /// Human-readable detail string.
    pub details: String,
}

/// All changes of one merge, in emission order.
pub type ChangeList = Vec<Change>;

impl Change {
    /// Change record for an entry; the group path is resolved against the
    /// database the entry lives in.
    pub fn for_entry(
        kind: ChangeType,
        db: &Database,
        entry: &Entry,
        details: impl Into<String>,
    ) -> Self {
        Change {
            kind,
            group: entry
                .parent()
                .map(|parent| db.group_path(parent))
                .unwrap_or_default(),
            title: entry.title.clone(),
            uuid: Some(entry.uuid),
            details: details.into(),
        }
    }

    /// Change record for a group.
    pub fn for_group(
        kind: ChangeType,
        db: &Database,
        group: &Group,
        details: impl Into<String>,
    ) -> Self {
        Change {
            kind,
            group: db.group_path(group.uuid),
            title: String::new(),
            uuid: Some(group.uuid),
            details: details.into(),
        }
    }

    /// Summary change carrying only a detail string.
    pub fn summary(details: impl Into<String>) -> Self {
        Change {
            details: details.into(),
            ..Change::default()
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind != ChangeType::Unspecified {
            write!(f, "{}: ", self.kind.label())?;
        }
        if !self.group.is_empty() {
            write!(f, "'{}'", self.group)?;
        }
        if !self.title.is_empty() {
            write!(f, "/'{}'", self.title)?;
        }
        if let Some(uuid) = self.uuid {
            write!(f, " [{uuid}]")?;
        }
        if !self.details.is_empty() {
            write!(f, " ({})", self.details)?;
        }
        Ok(())
    }
}
