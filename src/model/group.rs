//! Folder nodes of the database tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::times::TimeInfo;

/// Per-group merge policy.
///
/// `Default` defers to the parent group; an unset root resolves to
/// [`MergeMode::Synchronize`]. Only the deletion phase consults the mode
/// today; history-level per-mode policy is reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    #[default]
    Default,
    KeepLocal,
    KeepRemote,
    Synchronize,
    Duplicate,
}

/// Icon reference: either a built-in numeric id or a custom icon stored in
/// the database metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Icon {
    Builtin(u32),
    Custom(Uuid),
}

impl Default for Icon {
    fn default() -> Self {
        Icon::Builtin(0)
    }
}

/// A folder holding entries and sub-groups.
///
/// Child lists hold uuid handles into the owning database's arena, in
/// display order. Structure is mutated through the database so the arena
/// and the handle lists cannot drift apart.
#[derive(Debug, Clone)]
pub struct Group {
    pub uuid: Uuid,
    pub name: String,
    pub notes: String,
    pub icon: Icon,
    pub times: TimeInfo,
    pub merge_mode: MergeMode,
    pub(crate) parent: Option<Uuid>,
    pub(crate) groups: Vec<Uuid>,
    pub(crate) entries: Vec<Uuid>,
}

impl Group {
    pub fn new(uuid: Uuid, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Group {
            uuid,
            name: name.into(),
            notes: String::new(),
            icon: Icon::default(),
            times: TimeInfo::new(at),
            merge_mode: MergeMode::Default,
            parent: None,
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// The parent group's handle; `None` for the root.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// Child group handles, in order.
    pub fn groups(&self) -> &[Uuid] {
        &self.groups
    }

    /// Entry handles, in order.
    pub fn entries(&self) -> &[Uuid] {
        &self.entries
    }

    /// Detached copy without entries and without child groups.
    ///
    /// Times (including `location_changed`) are carried over.
    pub fn clone_shell(&self) -> Group {
        Group {
            parent: None,
            groups: Vec::new(),
            entries: Vec::new(),
            ..self.clone()
        }
    }
}
