// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Naming environment propagation
//!
//! The coordinator resolves resources with its own naming session, which it
//! opens from its configuration store rather than from the process
//! properties. Before every coordinator-side lookup the host's naming
//! settings are copied across.

use crate::config::PropagationPolicy;
use crate::coordinator::ConfigStore;
use crate::error::{BridgeError, BridgeResult};
use crate::naming::{NamingEnvironment, ProcessProperties};
use std::sync::Arc;

/// Copies the host's naming settings into the coordinator's configuration
pub struct EnvironmentPropagator {
    properties: Arc<ProcessProperties>,
    store: Arc<ConfigStore>,
    policy: PropagationPolicy,
}

impl EnvironmentPropagator {
    pub fn new(
        properties: Arc<ProcessProperties>,
        store: Arc<ConfigStore>,
        policy: PropagationPolicy,
    ) -> Self {
        Self {
            properties,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> PropagationPolicy {
        self.policy
    }

    /// Overwrite the store's naming settings with the current process values.
    ///
    /// Absent values are written as absent. Under the strict policy an
    /// incomplete environment is refused and nothing is written.
    pub fn propagate(&self) -> BridgeResult<()> {
        let environment = NamingEnvironment::from_properties(&self.properties);
        let missing = environment.missing_keys();

        if !missing.is_empty() {
            match self.policy {
                PropagationPolicy::Strict => {
                    return Err(BridgeError::ConfigurationPropagation(format!(
                        "missing naming properties: {}",
                        missing.join(", ")
                    )));
                }
                PropagationPolicy::Lenient => {
                    log::debug!("Propagating without naming properties: {}", missing.join(", "));
                }
            }
        }

        environment.write_to(&self.store);
        Ok(())
    }

    /// What the coordinator currently sees
    pub fn propagated(&self) -> NamingEnvironment {
        NamingEnvironment::from_store(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::environment::{
        INITIAL_CONTEXT_FACTORY, STORE_INITIAL_CONTEXT_FACTORY, STORE_URL_PKG_PREFIXES,
        URL_PKG_PREFIXES,
    };

    fn setup(policy: PropagationPolicy) -> (Arc<ProcessProperties>, Arc<ConfigStore>, EnvironmentPropagator) {
        let properties = Arc::new(ProcessProperties::new());
        let store = Arc::new(ConfigStore::new());
        let propagator = EnvironmentPropagator::new(properties.clone(), store.clone(), policy);
        (properties, store, propagator)
    }

    #[test]
    fn test_copies_present_values() {
        let (properties, store, propagator) = setup(PropagationPolicy::Lenient);
        properties.set(INITIAL_CONTEXT_FACTORY, "X");
        properties.set(URL_PKG_PREFIXES, "Y");

        propagator.propagate().unwrap();
        assert_eq!(store.get(STORE_INITIAL_CONTEXT_FACTORY), Some("X".to_string()));
        assert_eq!(store.get(STORE_URL_PKG_PREFIXES), Some("Y".to_string()));
    }

    #[test]
    fn test_absent_values_overwrite_previous() {
        let (properties, store, propagator) = setup(PropagationPolicy::Lenient);
        properties.set(INITIAL_CONTEXT_FACTORY, "X");
        propagator.propagate().unwrap();

        properties.remove(INITIAL_CONTEXT_FACTORY);
        propagator.propagate().unwrap();

        assert!(store.contains_key(STORE_INITIAL_CONTEXT_FACTORY));
        assert_eq!(store.get(STORE_INITIAL_CONTEXT_FACTORY), None);
        assert_eq!(propagator.propagated(), NamingEnvironment::default());
    }

    #[test]
    fn test_strict_refuses_incomplete_environment() {
        let (properties, store, propagator) = setup(PropagationPolicy::Strict);
        properties.set(INITIAL_CONTEXT_FACTORY, "X");

        let err = propagator.propagate().unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationPropagation(_)));
        assert!(store.is_empty());

        properties.set(URL_PKG_PREFIXES, "Y");
        propagator.propagate().unwrap();
        assert_eq!(propagator.propagated(), NamingEnvironment::new("X", "Y"));
    }
}
