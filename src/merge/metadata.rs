//! Metadata reconciliation: custom icons and the custom-data store.

use crate::merge::change::{Change, ChangeList};
use crate::model::{Database, LAST_MODIFIED};

/// Union the source's custom icons into the target and merge the
/// custom-data dictionary newest-wins at dictionary level.
///
/// Icons are never removed; groups and entries anywhere may still
/// reference them by uuid.
pub(crate) fn merge_metadata(source: &Database, target: &mut Database) -> ChangeList {
    let mut changes = ChangeList::new();

    for icon_uuid in source.metadata().custom_icons_order().to_vec() {
        if !target.metadata().has_custom_icon(icon_uuid) {
            let Some(blob) = source.metadata().custom_icon(icon_uuid) else {
                continue;
            };
            let blob = blob.to_vec();
            target.metadata_mut().add_custom_icon(icon_uuid, blob);
            changes.push(Change::summary(format!(
                "Adding missing icon {}",
                icon_uuid.simple()
            )));
        }
    }

    let target_stamp = target.metadata().custom_data().last_modified();
    let source_stamp = source.metadata().custom_data().last_modified();
    let source_wins = !target.metadata().custom_data().contains(LAST_MODIFIED)
        || matches!((target_stamp, source_stamp), (Some(t), Some(s)) if t < s);
    if !source_wins {
        return changes;
    }

    let source_data = source.metadata().custom_data();
    let target_keys: Vec<String> = target
        .metadata()
        .custom_data()
        .keys()
        .map(str::to_owned)
        .collect();
    let mut dictionary_changed = false;

    // Keys the winning dictionary no longer has are dropped, protected
    // ones excepted.
    for key in target_keys {
        if !source_data.contains(&key) && !source_data.is_protected(&key) {
            let value = target
                .metadata()
                .custom_data()
                .value(&key)
                .unwrap_or_default()
                .to_owned();
            target.metadata_mut().custom_data_mut().remove_raw(&key);
            changes.push(Change::summary(format!("Removed custom data {key} [{value}]")));
            dictionary_changed = true;
        }
    }

    for key in source_data.keys() {
        // Managed by the store itself, never transferred as data.
        if key == LAST_MODIFIED {
            continue;
        }
        let source_value = source_data.value(key).unwrap_or_default();
        if target.metadata().custom_data().value(key) != Some(source_value) {
            let key = key.to_owned();
            let value = source_value.to_owned();
            target
                .metadata_mut()
                .custom_data_mut()
                .set_raw(key.clone(), value.clone());
            changes.push(Change::summary(format!("Adding custom data {key} [{value}]")));
            dictionary_changed = true;
        }
    }

    if dictionary_changed && let Some(stamp) = source_stamp {
        target
            .metadata_mut()
            .custom_data_mut()
            .set_last_modified(stamp);
    }
    changes
}
