// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Bridge facade - wires a coordinator into the mediation components

use crate::config::BridgeConfig;
use crate::connector::AmbientConnector;
use crate::coordinator::TransactionCoordinator;
use crate::datasource::XaDataSource;
use crate::error::{BridgeError, BridgeResult};
use crate::lifecycle::{LifecycleState, RecoveryLifecycleController};
use crate::lookup::TransactionManagerLookup;
use crate::mediator::TransactionalDataSource;
use crate::naming::ProcessProperties;
use crate::propagator::EnvironmentPropagator;
use std::sync::Arc;

/// Single entry point for a host embedding the bridge
///
/// Owns one propagator, connector and lifecycle controller, all bound to the
/// same coordinator and process properties.
pub struct TransactionBridge {
    config: BridgeConfig,
    coordinator: Arc<dyn TransactionCoordinator>,
    propagator: Arc<EnvironmentPropagator>,
    connector: Arc<AmbientConnector>,
    controller: RecoveryLifecycleController,
}

impl TransactionBridge {
    pub fn new(
        config: BridgeConfig,
        coordinator: Arc<dyn TransactionCoordinator>,
        properties: Arc<ProcessProperties>,
    ) -> BridgeResult<Self> {
        config.validate()?;
        if let Some(scheme) = coordinator.driver_scheme() {
            if scheme != config.driver_scheme {
                return Err(BridgeError::Config(format!(
                    "coordinator accepts '{}' addresses but the bridge uses '{}'",
                    scheme, config.driver_scheme
                )));
            }
        }

        let propagator = Arc::new(EnvironmentPropagator::new(
            properties,
            coordinator.config_store(),
            config.propagation_policy,
        ));
        let connector = Arc::new(AmbientConnector::new(
            coordinator.clone(),
            propagator.clone(),
            config.driver_scheme.as_str(),
        ));
        let controller = RecoveryLifecycleController::new(coordinator.clone(), propagator.clone());

        log::debug!(
            "Transaction bridge created (scheme '{}', {:?} propagation)",
            config.driver_scheme,
            config.propagation_policy
        );

        Ok(Self {
            config,
            coordinator,
            propagator,
            connector,
            controller,
        })
    }

    /// Bridge reading the naming settings from the process-wide properties
    pub fn with_global_properties(
        config: BridgeConfig,
        coordinator: Arc<dyn TransactionCoordinator>,
    ) -> BridgeResult<Self> {
        Self::new(config, coordinator, ProcessProperties::global())
    }

    /// Publish `resource` under `name` with enlistment-aware connections
    pub fn wrap<D: XaDataSource + 'static>(
        &self,
        name: impl Into<String>,
        resource: Arc<D>,
    ) -> Arc<TransactionalDataSource<D>> {
        Arc::new(TransactionalDataSource::new(
            name,
            resource,
            self.connector.clone(),
        ))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<dyn TransactionCoordinator> {
        &self.coordinator
    }

    pub fn propagator(&self) -> &Arc<EnvironmentPropagator> {
        &self.propagator
    }

    pub fn connector(&self) -> &Arc<AmbientConnector> {
        &self.connector
    }

    pub fn controller(&self) -> &RecoveryLifecycleController {
        &self.controller
    }

    pub fn transaction_manager_lookup(&self) -> TransactionManagerLookup {
        TransactionManagerLookup::new(self.config.lookup.clone())
    }

    pub fn state(&self) -> LifecycleState {
        self.controller.state()
    }

    pub fn on_host_start(&self) -> BridgeResult<()> {
        self.controller.on_host_start()
    }

    pub fn on_host_stop(&self) -> BridgeResult<()> {
        self.controller.on_host_stop()
    }

    pub fn handle_event(&self, event_type: &str) -> BridgeResult<()> {
        self.controller.handle_event(event_type)
    }
}
