// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Registry lookup of the transaction coordinator
//!
//! Some integrations do not receive the coordinator by injection and instead
//! find it in the name registry under well-known names.

use crate::config::LookupConfig;
use crate::coordinator::{ConfigStore, TransactionCoordinator};
use crate::error::ResourceError;
use crate::naming::{scope, Binding, NameRegistry, NamingEnvironment};
use std::sync::Arc;

/// Locates the coordinator under the configured names, in the caller's scope
#[derive(Debug, Clone)]
pub struct TransactionManagerLookup {
    config: LookupConfig,
}

impl TransactionManagerLookup {
    pub fn new(config: LookupConfig) -> Self {
        Self { config }
    }

    pub fn transaction_manager_name(&self) -> &str {
        &self.config.transaction_manager_name
    }

    pub fn user_transaction_name(&self) -> &str {
        &self.config.user_transaction_name
    }

    pub fn locate_transaction_manager(
        &self,
        registry: &dyn NameRegistry,
        environment: &NamingEnvironment,
    ) -> Result<Arc<dyn TransactionCoordinator>, ResourceError> {
        self.locate(registry, environment, &self.config.transaction_manager_name)
    }

    /// The handle applications demarcate transactions with
    pub fn locate_user_transaction(
        &self,
        registry: &dyn NameRegistry,
        environment: &NamingEnvironment,
    ) -> Result<Arc<dyn TransactionCoordinator>, ResourceError> {
        self.locate(registry, environment, &self.config.user_transaction_name)
    }

    /// Like [`locate_transaction_manager`](Self::locate_transaction_manager),
    /// opening the session with the naming settings propagated into `store`
    pub fn locate_with_store(
        &self,
        registry: &dyn NameRegistry,
        store: &ConfigStore,
    ) -> Result<Arc<dyn TransactionCoordinator>, ResourceError> {
        self.locate_transaction_manager(registry, &NamingEnvironment::from_store(store))
    }

    fn locate(
        &self,
        registry: &dyn NameRegistry,
        environment: &NamingEnvironment,
        name: &str,
    ) -> Result<Arc<dyn TransactionCoordinator>, ResourceError> {
        match registry.lookup(environment, &scope::current(), name)? {
            Binding::Coordinator(coordinator) => Ok(coordinator),
            Binding::DataSource(_) => Err(ResourceError::WrongBindingType(name.to_string())),
        }
    }
}

impl Default for TransactionManagerLookup {
    fn default() -> Self {
        Self::new(LookupConfig::default())
    }
}
