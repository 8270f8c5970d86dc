//! Free-form key/value store attached to the database metadata.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};

/// Distinguished key carrying the store's own modification timestamp.
///
/// The value is kept in-band, like any other key, but is managed by the
/// store: the stamped mutators bump it, and the merger installs the winning
/// side's value instead of transferring it as data.
pub const LAST_MODIFIED: &str = "_LAST_MODIFIED";

/// Ordered key/value store with per-key protected markings.
///
/// Protected markings live next to the values, not on them: a key can be
/// marked protected without carrying a value, which shields the other
/// side's value from removal during merges.
#[derive(Debug, Clone, Default)]
pub struct CustomData {
    items: BTreeMap<String, String>,
    protected: BTreeSet<String>,
}

impl CustomData {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn is_protected(&self, key: &str) -> bool {
        self.protected.contains(key)
    }

    /// Mark or unmark a key as protected from removal by merges. The key
    /// does not need to carry a value.
    pub fn set_protected(&mut self, key: &str, protected: bool) {
        if protected {
            self.protected.insert(key.to_owned());
        } else {
            self.protected.remove(key);
        }
    }

    /// Set a key and stamp [`LAST_MODIFIED`] with `at`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, at: DateTime<Utc>) {
        self.set_raw(key, value);
        self.set_last_modified(at);
    }

    /// Remove a key and stamp [`LAST_MODIFIED`] with `at`.
    pub fn remove(&mut self, key: &str, at: DateTime<Utc>) {
        self.remove_raw(key);
        self.set_last_modified(at);
    }

    /// Set a key without stamping.
    pub fn set_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    /// Remove a key's value without stamping. A protected marking
    /// outlives the value.
    pub fn remove_raw(&mut self, key: &str) {
        self.items.remove(key);
    }

    /// The parsed [`LAST_MODIFIED`] value, if present and well-formed.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        let raw = self.value(LAST_MODIFIED)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Install the store's modification timestamp.
    pub fn set_last_modified(&mut self, at: DateTime<Utc>) {
        self.set_raw(LAST_MODIFIED, at.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
}
