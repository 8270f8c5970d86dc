//! Secret records and their revision history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::compare::CompareOptions;
use crate::model::times::TimeInfo;

/// A single secret record.
///
/// An entry owns an ordered chain of prior revisions of itself. History
/// items are plain entries with an empty chain and no parent handle; they
/// are never addressed by the owning database's arena.
#[derive(Debug, Clone)]
pub struct Entry {
    pub uuid: Uuid,
    pub title: String,
    /// Arbitrary key/value payload (user name, password, URL, ...).
    pub fields: BTreeMap<String, String>,
    pub times: TimeInfo,
    pub(crate) parent: Option<Uuid>,
    history: Vec<Entry>,
}

impl Entry {
    pub fn new(uuid: Uuid, title: impl Into<String>, at: DateTime<Utc>) -> Self {
        Entry {
            uuid,
            title: title.into(),
            fields: BTreeMap::new(),
            times: TimeInfo::new(at),
            parent: None,
            history: Vec::new(),
        }
    }

    /// The owning group's handle. `None` only for detached values and
    /// history items.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// Prior revisions, oldest first.
    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    /// Detached copy carrying the full history chain.
    pub fn duplicate(&self) -> Entry {
        Entry {
            parent: None,
            ..self.clone()
        }
    }

    /// Detached copy of the current revision only, suitable as a history
    /// item.
    pub fn snapshot(&self) -> Entry {
        Entry {
            parent: None,
            history: Vec::new(),
            ..self.clone()
        }
    }

    /// Record the current revision as the newest history item.
    pub fn attach_history_snapshot(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    /// Replace the whole history chain in one step.
    ///
    /// Does not touch the entry's own [`TimeInfo`]; installing merged
    /// history must not look like an edit.
    pub fn set_history(&mut self, chain: Vec<Entry>) {
        self.history = chain;
        for item in &mut self.history {
            item.parent = None;
            item.history.clear();
        }
    }

    /// Keep only the newest `max_items` history items.
    pub fn truncate_history(&mut self, max_items: usize) {
        if self.history.len() > max_items {
            self.history.drain(..self.history.len() - max_items);
        }
    }

    /// Equality under the given comparison options.
    pub fn matches(&self, other: &Entry, options: CompareOptions) -> bool {
        if self.uuid != other.uuid || self.title != other.title || self.fields != other.fields {
            return false;
        }
        if !options.ignore_location && self.parent != other.parent {
            return false;
        }
        if !self.times.matches(&other.times, options) {
            return false;
        }
        if options.ignore_history {
            return true;
        }
        self.history.len() == other.history.len()
            && self
                .history
                .iter()
                .zip(&other.history)
                .all(|(a, b)| a.matches(b, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn entry(title: &str, secs: i64) -> Entry {
        Entry::new(Uuid::new_v4(), title, ts(secs))
    }

    #[test]
    fn snapshot_drops_history_and_parent() {
        let mut e = entry("account", 100);
        e.parent = Some(Uuid::new_v4());
        e.attach_history_snapshot();
        let snap = e.snapshot();
        assert!(snap.history().is_empty());
        assert_eq!(snap.parent(), None);
        assert_eq!(snap.title, "account");
    }

    #[test]
    fn truncate_drops_oldest_first() {
        let mut e = entry("account", 100);
        for i in 0..5 {
            e.title = format!("rev{i}");
            e.attach_history_snapshot();
        }
        e.truncate_history(2);
        let titles: Vec<&str> = e.history().iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, ["rev3", "rev4"]);
    }

    #[test]
    fn set_history_preserves_times() {
        let mut e = entry("account", 100);
        let before = e.times;
        e.set_history(vec![entry("old", 50)]);
        assert_eq!(e.times, before);
        assert_eq!(e.history().len(), 1);
    }

    #[test]
    fn matches_ignores_history_when_asked() {
        let mut a = entry("account", 100);
        let mut b = a.clone();
        b.set_history(vec![a.snapshot()]);
        assert!(!a.matches(&b, CompareOptions::EXACT));
        assert!(a.matches(&b, CompareOptions::EXACT.and_ignore_history()));
        a.fields.insert("user".into(), "alice".into());
        assert!(!a.matches(&b, CompareOptions::EXACT.and_ignore_history()));
    }
}
