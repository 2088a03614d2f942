use std::sync::Arc;

use super::Handle;

/// Append-only table of shared assets. A slot may be reserved without data,
/// which hands out a stable key for geometry that is produced later.
pub struct AssetCache<T> {
    items: Vec<Option<Arc<T>>>,
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let index = self.items.len();
        self.items.push(Some(Arc::new(item)));
        Handle::new(index)
    }

    pub fn reserve(&mut self) -> Handle<T> {
        let index = self.items.len();
        self.items.push(None);
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&Arc<T>> {
        self.items.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
