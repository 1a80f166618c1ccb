// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory name registry for embedding and testing

use super::environment::NamingEnvironment;
use super::registry::{Binding, NameRegistry};
use super::scope::LookupScope;
use crate::error::ResourceError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// A lookup the registry has served (or refused)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRecord {
    pub scope: LookupScope,
    pub name: String,
}

/// Registry holding bindings per scope in process memory
///
/// Every lookup is recorded, successful or not, so callers can verify which
/// scope a name was resolved from.
pub struct InMemoryNameRegistry {
    bindings: RwLock<HashMap<LookupScope, HashMap<String, Binding>>>,
    required_factory: Option<String>,
    lookups: Mutex<Vec<LookupRecord>>,
}

impl InMemoryNameRegistry {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            required_factory: None,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Refuse sessions whose environment does not name `factory`
    pub fn requiring_factory(mut self, factory: impl Into<String>) -> Self {
        self.required_factory = Some(factory.into());
        self
    }

    pub fn bind(&self, scope: LookupScope, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        log::debug!("Binding '{}' in scope {} to {}", name, scope, binding.kind());
        self.bindings
            .write()
            .entry(scope)
            .or_default()
            .insert(name, binding);
    }

    pub fn bind_global(&self, name: impl Into<String>, binding: Binding) {
        self.bind(LookupScope::Global, name, binding);
    }

    pub fn unbind(&self, scope: &LookupScope, name: &str) -> Option<Binding> {
        self.bindings
            .write()
            .get_mut(scope)
            .and_then(|names| names.remove(name))
    }

    /// Every lookup served so far, oldest first
    pub fn lookups(&self) -> Vec<LookupRecord> {
        self.lookups.lock().clone()
    }

    /// Lookups of `name` that were made from `scope`
    pub fn lookup_count(&self, scope: &LookupScope, name: &str) -> usize {
        self.lookups
            .lock()
            .iter()
            .filter(|record| &record.scope == scope && record.name == name)
            .count()
    }

    pub fn clear_lookups(&self) {
        self.lookups.lock().clear();
    }
}

impl Default for InMemoryNameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NameRegistry for InMemoryNameRegistry {
    fn lookup(
        &self,
        environment: &NamingEnvironment,
        scope: &LookupScope,
        name: &str,
    ) -> Result<Binding, ResourceError> {
        self.lookups.lock().push(LookupRecord {
            scope: scope.clone(),
            name: name.to_string(),
        });

        if let Some(required) = &self.required_factory {
            if environment.initial_context_factory.as_deref() != Some(required.as_str()) {
                return Err(ResourceError::NamingEnvironment(format!(
                    "cannot open a naming session without initial context factory '{}'",
                    required
                )));
            }
        }

        self.bindings
            .read()
            .get(scope)
            .and_then(|names| names.get(name))
            .cloned()
            .ok_or_else(|| ResourceError::NameNotFound {
                name: name.to_string(),
                scope: scope.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::InMemoryXaDataSource;
    use std::sync::Arc;

    fn data_source() -> Binding {
        Binding::DataSource(Arc::new(InMemoryXaDataSource::new()))
    }

    #[test]
    fn test_lookup_is_scope_exact() {
        let registry = InMemoryNameRegistry::new();
        registry.bind_global("jdbc/Sales", data_source());

        let env = NamingEnvironment::default();
        assert!(registry
            .lookup(&env, &LookupScope::Global, "jdbc/Sales")
            .is_ok());

        let err = registry
            .lookup(&env, &LookupScope::application("shop"), "jdbc/Sales")
            .unwrap_err();
        assert!(matches!(err, ResourceError::NameNotFound { .. }));
    }

    #[test]
    fn test_lookups_are_recorded() {
        let registry = InMemoryNameRegistry::new();
        let env = NamingEnvironment::default();
        let _ = registry.lookup(&env, &LookupScope::Global, "jdbc/Missing");

        assert_eq!(registry.lookup_count(&LookupScope::Global, "jdbc/Missing"), 1);
        registry.clear_lookups();
        assert!(registry.lookups().is_empty());
    }

    #[test]
    fn test_required_factory() {
        let registry = InMemoryNameRegistry::new().requiring_factory("X");
        registry.bind_global("jdbc/Sales", data_source());

        let err = registry
            .lookup(&NamingEnvironment::default(), &LookupScope::Global, "jdbc/Sales")
            .unwrap_err();
        assert!(matches!(err, ResourceError::NamingEnvironment(_)));

        let env = NamingEnvironment::new("X", "Y");
        assert!(registry.lookup(&env, &LookupScope::Global, "jdbc/Sales").is_ok());
    }

    #[test]
    fn test_unbind() {
        let registry = InMemoryNameRegistry::new();
        registry.bind_global("jdbc/Sales", data_source());
        assert!(registry.unbind(&LookupScope::Global, "jdbc/Sales").is_some());
        assert!(registry.unbind(&LookupScope::Global, "jdbc/Sales").is_none());
    }
}
