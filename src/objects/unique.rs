//! Ordered list rejecting repeated ids

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::hash::Hash;

/// Item with a stable identity
pub trait Keyed {
    /// Identity type
    type Key: Eq + Hash + Clone + std::fmt::Debug;

    /// Identity of this item
    fn key(&self) -> Self::Key;
}

/// Items in arrival order, at most one per key; the first arrival wins
#[derive(Debug, Clone)]
pub struct UniqueList<T: Keyed> {
    items: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for UniqueList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> UniqueList<T> {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless its key is already present; returns whether it was added
    pub fn insert(&mut self, item: T) -> bool {
        let key = item.key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.items.len());
        self.items.push(item);
        true
    }

    /// Insert every item while the list holds fewer than `limit` entries,
    /// returning how many were added
    pub fn extend_up_to<I>(&mut self, items: I, limit: Option<usize>) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut added = 0;
        for item in items {
            if limit.is_some_and(|limit| self.items.len() >= limit) {
                break;
            }
            if self.insert(item) {
                added += 1;
            }
        }
        added
    }

    /// Item with the given key
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    /// Items in arrival order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate in arrival order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T: Keyed> IntoIterator for &'a UniqueList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Keyed + Serialize> Serialize for UniqueList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}
