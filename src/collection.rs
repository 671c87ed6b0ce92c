//! Session-owned de-duplication state.
//!
//! Neither type here is shared between listings: each listing session owns its
//! own [`SeenIdentitySet`] / [`Accumulated`] and passes them by reference into
//! the loaders.

use std::collections::HashSet;

use crate::models::Identified;

/// Names of members a grouped listing has already attempted. A form whose
/// fetch failed stays here too, so it is never requested twice.
#[derive(Debug, Default, Clone)]
pub struct SeenIdentitySet {
    names: HashSet<String>,
}

impl SeenIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Mark `name` as seen. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Records accumulated by a listing, kept strictly ascending by id and unique
/// by both id and name.
#[derive(Debug, Clone)]
pub struct Accumulated<T> {
    items: Vec<T>,
}

impl<T> Default for Accumulated<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identified> Accumulated<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` at its sorted position.
    ///
    /// Returns `false` without touching the collection when a record with the
    /// same id or the same name is already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.items.iter().any(|i| i.name() == item.name()) {
            return false;
        }
        match self.items.binary_search_by_key(&item.id(), |i| i.id()) {
            Ok(_) => false,
            Err(pos) => {
                self.items.insert(pos, item);
                true
            }
        }
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.items.binary_search_by_key(&id, |i| i.id()).is_ok()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Identified> Extend<T> for Accumulated<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Identified> FromIterator<T> for Accumulated<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut acc = Accumulated::new();
        acc.extend(iter);
        acc
    }
}
