//! Database-wide metadata: custom icons and the custom-data store.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::custom_data::CustomData;

/// Default cap on per-entry history chains.
pub const DEFAULT_HISTORY_MAX_ITEMS: usize = 10;

/// Metadata block owned by a database.
#[derive(Debug, Clone)]
pub struct Metadata {
    icon_order: Vec<Uuid>,
    icons: HashMap<Uuid, Vec<u8>>,
    history_max_items: usize,
    custom_data: CustomData,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            icon_order: Vec::new(),
            icons: HashMap::new(),
            history_max_items: DEFAULT_HISTORY_MAX_ITEMS,
            custom_data: CustomData::default(),
        }
    }
}

impl Metadata {
    /// Custom icon uuids in insertion order.
    pub fn custom_icons_order(&self) -> &[Uuid] {
        &self.icon_order
    }

    pub fn has_custom_icon(&self, uuid: Uuid) -> bool {
        self.icons.contains_key(&uuid)
    }

    pub fn custom_icon(&self, uuid: Uuid) -> Option<&[u8]> {
        self.icons.get(&uuid).map(Vec::as_slice)
    }

    /// Insert an icon; an already-present uuid keeps its existing blob.
    pub fn add_custom_icon(&mut self, uuid: Uuid, blob: Vec<u8>) {
        if !self.icons.contains_key(&uuid) {
            self.icons.insert(uuid, blob);
            self.icon_order.push(uuid);
        }
    }

    pub fn history_max_items(&self) -> usize {
        self.history_max_items
    }

    pub fn set_history_max_items(&mut self, max_items: usize) {
        self.history_max_items = max_items;
    }

    pub fn custom_data(&self) -> &CustomData {
        &self.custom_data
    }

    pub fn custom_data_mut(&mut self) -> &mut CustomData {
        &mut self.custom_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_keep_insertion_order() {
        let mut meta = Metadata::default();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        meta.add_custom_icon(b, vec![1]);
        meta.add_custom_icon(a, vec![2]);
        meta.add_custom_icon(c, vec![3]);
        assert_eq!(meta.custom_icons_order(), [b, a, c]);
    }

    #[test]
    fn duplicate_icon_keeps_first_blob() {
        let mut meta = Metadata::default();
        let id = Uuid::new_v4();
        meta.add_custom_icon(id, vec![1]);
        meta.add_custom_icon(id, vec![2]);
        assert_eq!(meta.custom_icons_order().len(), 1);
        assert_eq!(meta.custom_icon(id), Some(&[1u8][..]));
    }
}
