use std::collections::HashMap;

/// Keyed container that remembers insertion order.
///
/// Used for the per-ticket and per-pull-request maps that feed the digest;
/// iteration follows the order in which keys were first seen.
#[derive(Debug, Clone)]
pub struct Accumulator<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Accumulator<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V> Accumulator<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, or fold it into the existing entry with `merge`.
    ///
    /// Returns `true` when a new entry was created.
    pub fn upsert<F>(&mut self, key: impl Into<String>, value: V, merge: F) -> bool
    where
        F: FnOnce(&mut V, V),
    {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => {
                merge(&mut self.entries[pos].1, value);
                false
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                true
            }
        }
    }

    #[allow(dead_code)]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}
