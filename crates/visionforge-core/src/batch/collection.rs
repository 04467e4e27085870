//! Caller-owned working set of image items, indexed by id.

use std::collections::HashMap;

use crate::types::{ImageItem, ImageSource, ItemId, ItemState};

/// Ordered item arena with id lookup.
///
/// Insertion order is the processing order. Ids are never reused, even after
/// removal.
#[derive(Debug, Default)]
pub struct ItemCollection {
    items: Vec<ImageItem>,
    index: HashMap<ItemId, usize>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image as a new idle item and return its id.
    pub fn add(&mut self, image: ImageSource) -> ItemId {
        let mut item = ImageItem::new(image);
        while self.index.contains_key(item.id()) {
            item = ImageItem::new(item.image);
        }
        let id = item.id().clone();
        self.index.insert(id.clone(), self.items.len());
        self.items.push(item);
        id
    }

    /// Remove an item. Later items keep their relative order.
    pub fn remove(&mut self, id: &ItemId) -> Option<ImageItem> {
        let pos = self.index.remove(id)?;
        let item = self.items.remove(pos);
        for later in &self.items[pos..] {
            if let Some(slot) = self.index.get_mut(later.id()) {
                *slot -= 1;
            }
        }
        Some(item)
    }

    pub fn get(&self, id: &ItemId) -> Option<&ImageItem> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Mutable access for caller-side fields (e.g. preserved manifest data).
    /// State changes go through the orchestrator.
    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut ImageItem> {
        let pos = *self.index.get(id)?;
        self.items.get_mut(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of items a run would queue, in collection order.
    pub fn eligible_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.is_eligible())
            .map(|item| item.id().clone())
            .collect()
    }

    pub(crate) fn set_state(&mut self, id: &ItemId, state: ItemState) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.set_state(state);
                true
            }
            None => false,
        }
    }
}

impl<'a> IntoIterator for &'a ItemCollection {
    type Item = &'a ImageItem;
    type IntoIter = std::slice::Iter<'a, ImageItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
