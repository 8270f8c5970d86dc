//! Per-entry history reconciliation.
//!
//! Both sides' history chains are unioned into one map keyed by
//! second-truncated modification time; items landing on the same key are
//! regarded as the same revision. The side with the newer current revision
//! wins key collisions, the losing side's current revision is preserved as
//! a history item, and the result is installed on the target atomically
//! without perturbing the target's own timestamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::model::clock;
use crate::model::{CompareOptions, Entry, MergeMode};

/// Union `source`'s history into `target`, then install the merged chain
/// capped at `max_items`.
///
/// Returns whether the target's history actually changed. The merge mode
/// is threaded through for future tie-break policies; every mode merges
/// identically today.
pub(crate) fn merge_history(
    source: &Entry,
    target: &mut Entry,
    _merge_mode: MergeMode,
    max_items: usize,
) -> bool {
    let compare = CompareOptions::SECONDS;
    let source_mod = clock::serialized(source.times.last_modification);
    let target_mod = clock::serialized(target.times.last_modification);
    // A strictly newer source wins key collisions; otherwise the target's
    // item stands.
    let prefer_remote = source_mod > target_mod;

    let mut merged: BTreeMap<DateTime<Utc>, Entry> = BTreeMap::new();
    for item in target.history() {
        let key = clock::serialized(item.times.last_modification);
        if let Some(existing) = merged.get(&key)
            && !existing.matches(item, compare)
        {
            warn_conflicting_history("Inconsistent history entry", source, key);
        }
        merged.insert(key, item.snapshot());
    }
    for item in source.history() {
        // Items with the same normalized modification time are regarded as
        // the same revision.
        let key = clock::serialized(item.times.last_modification);
        if let Some(existing) = merged.get(&key)
            && !existing.matches(item, compare)
        {
            warn_conflicting_history("History entry", source, key);
        }
        if prefer_remote {
            merged.insert(key, item.snapshot());
        } else {
            merged.entry(key).or_insert_with(|| item.snapshot());
        }
    }

    if target_mod == source_mod
        && !target.matches(
            source,
            CompareOptions::SECONDS.and_ignore_history().and_ignore_location(),
        )
    {
        warn!(
            "Entry of {}[{}] contains conflicting changes - conflict resolution may lose data!",
            source.title,
            source.uuid.simple()
        );
    }

    // The losing side's current revision joins the chain under its own
    // key. Equal stamps have no losing side: the source's current revision
    // is dropped after the warning above.
    if target_mod < source_mod {
        merged
            .entry(target_mod)
            .or_insert_with(|| target.snapshot());
    } else if target_mod > source_mod {
        merged
            .entry(source_mod)
            .or_insert_with(|| source.snapshot());
    }

    let new_chain: Vec<Entry> = merged.into_values().collect();
    let old_tail = tail(target.history(), max_items);
    let new_tail = tail(&new_chain, max_items);
    let changed = old_tail.len() != new_tail.len()
        || old_tail
            .iter()
            .zip(new_tail)
            .any(|(old, new)| !old.matches(new, compare));
    if !changed {
        return false;
    }

    // Installing merged history must not read as an edit of the entry.
    let stamps = target.times;
    target.set_history(new_chain);
    target.truncate_history(max_items);
    debug_assert_eq!(stamps, target.times);
    true
}

/// The newest `n` items of a chain.
fn tail(items: &[Entry], n: usize) -> &[Entry] {
    &items[items.len().saturating_sub(n)..]
}

fn warn_conflicting_history(prefix: &str, source: &Entry, at: DateTime<Utc>) {
    warn!(
        "{} of {}[{}] at {} contains conflicting changes - conflict resolution may lose data!",
        prefix,
        source.title,
        source.uuid.simple(),
        at.format("%Y-%m-%d %H-%M-%S")
    );
}
