// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Coordinator-side configuration store

use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Key/value configuration read by a coordinator's lookup layer
///
/// A key may be present with an absent value: writing `None` records that the
/// setting was propagated but the host did not define it.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: RwLock<BTreeMap<String, Option<String>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn put(&self, key: impl Into<String>, value: Option<String>) {
        self.entries.write().insert(key.into(), value);
    }

    /// Value for `key`, `None` when the key is missing or its value is absent
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned().flatten()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Option<String>> {
        self.entries.write().remove(key)
    }

    /// Copy of every entry, in key order
    pub fn snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_overwrites() {
        let store = ConfigStore::new();
        store.put("k", Some("a".to_string()));
        store.put("k", Some("b".to_string()));
        assert_eq!(store.get("k"), Some("b".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_absent_value_is_recorded() {
        let store = ConfigStore::new();
        store.put("k", None);
        assert!(store.contains_key("k"));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.snapshot().get("k"), Some(&None));
    }
}
