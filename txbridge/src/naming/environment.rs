// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Naming environment and the process-wide properties it is read from

use crate::coordinator::ConfigStore;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process property naming the initial-context factory
pub const INITIAL_CONTEXT_FACTORY: &str = "naming.factory.initial";

/// Process property listing URL package prefixes
pub const URL_PKG_PREFIXES: &str = "naming.factory.url.pkgs";

/// Coordinator configuration key for the initial-context factory
pub const STORE_INITIAL_CONTEXT_FACTORY: &str = "naming.initial_context_factory";

/// Coordinator configuration key for the URL package prefixes
pub const STORE_URL_PKG_PREFIXES: &str = "naming.url_pkg_prefixes";

/// Environment variable backing [`INITIAL_CONTEXT_FACTORY`]
pub const ENV_INITIAL_CONTEXT_FACTORY: &str = "TXBRIDGE_NAMING_FACTORY_INITIAL";

/// Environment variable backing [`URL_PKG_PREFIXES`]
pub const ENV_URL_PKG_PREFIXES: &str = "TXBRIDGE_NAMING_FACTORY_URL_PKGS";

static GLOBAL_PROPERTIES: Lazy<Arc<ProcessProperties>> =
    Lazy::new(|| Arc::new(ProcessProperties::from_env()));

/// Process-wide string properties
///
/// This is where the host publishes its naming configuration. The bridge only
/// ever reads it.
#[derive(Debug, Default)]
pub struct ProcessProperties {
    values: RwLock<HashMap<String, String>>,
}

impl ProcessProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties seeded from the `TXBRIDGE_NAMING_*` environment variables
    pub fn from_env() -> Self {
        let properties = Self::new();
        for (key, var) in [
            (INITIAL_CONTEXT_FACTORY, ENV_INITIAL_CONTEXT_FACTORY),
            (URL_PKG_PREFIXES, ENV_URL_PKG_PREFIXES),
        ] {
            if let Ok(value) = std::env::var(var) {
                properties.set(key, value);
            }
        }
        properties
    }

    /// Shared instance for the whole process, read from the environment on first use
    pub fn global() -> Arc<ProcessProperties> {
        GLOBAL_PROPERTIES.clone()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

/// Settings needed to open a naming session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingEnvironment {
    pub initial_context_factory: Option<String>,
    pub url_pkg_prefixes: Option<String>,
}

impl NamingEnvironment {
    pub fn new(factory: impl Into<String>, prefixes: impl Into<String>) -> Self {
        Self {
            initial_context_factory: Some(factory.into()),
            url_pkg_prefixes: Some(prefixes.into()),
        }
    }

    /// Snapshot of the host's naming configuration
    pub fn from_properties(properties: &ProcessProperties) -> Self {
        Self {
            initial_context_factory: properties.get(INITIAL_CONTEXT_FACTORY),
            url_pkg_prefixes: properties.get(URL_PKG_PREFIXES),
        }
    }

    /// Naming configuration as the coordinator currently sees it
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            initial_context_factory: store.get(STORE_INITIAL_CONTEXT_FACTORY),
            url_pkg_prefixes: store.get(STORE_URL_PKG_PREFIXES),
        }
    }

    /// Overwrite the coordinator's naming configuration, absent values included
    pub fn write_to(&self, store: &ConfigStore) {
        store.put(
            STORE_INITIAL_CONTEXT_FACTORY,
            self.initial_context_factory.clone(),
        );
        store.put(STORE_URL_PKG_PREFIXES, self.url_pkg_prefixes.clone());
    }

    /// Names of the settings that are absent or blank
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.initial_context_factory) {
            missing.push(INITIAL_CONTEXT_FACTORY);
        }
        if blank(&self.url_pkg_prefixes) {
            missing.push(URL_PKG_PREFIXES);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_keys().is_empty()
    }
}
