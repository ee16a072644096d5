use indexmap::IndexMap;
use indexmap::map::{Values, ValuesMut};
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Objects that carry a lookup key unique within their collection.
pub trait Named {
    /// Key used for uniqueness and lookup.
    fn lookup_key(&self) -> &str;
}

/// Ordered collection of uniquely named objects.
///
/// Insertion order is preserved. Adding an object whose key is already present
/// replaces the existing entry in place, so the original position is kept.
/// Mutable access must not change an object's key.
#[derive(Debug, Clone)]
pub struct NamedObjectList<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for NamedObjectList<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Named> NamedObjectList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an object, returning the entry it replaced, if any.
    pub fn add(&mut self, item: T) -> Option<T> {
        let key = item.lookup_key().to_string();
        self.items.insert(key, item)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    /// Remove the object stored under `key`, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.items.shift_remove(key)
    }

    pub fn iter(&self) -> Values<'_, String, T> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> ValuesMut<'_, String, T> {
        self.items.values_mut()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a NamedObjectList<T> {
    type Item = &'a T;
    type IntoIter = Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl<T: Named> FromIterator<T> for NamedObjectList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.add(item);
        }
        list
    }
}

impl<T: Serialize> Serialize for NamedObjectList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in self.items.values() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
