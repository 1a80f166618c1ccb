// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Ambient transaction connector

use crate::connection::{Connection, DriverAddress, EnlistmentContext};
use crate::coordinator::TransactionCoordinator;
use crate::credentials::Credentials;
use crate::error::{BridgeError, BridgeResult};
use crate::naming::{scope, ScopeGuard};
use crate::propagator::EnvironmentPropagator;
use std::sync::Arc;
use std::time::Duration;

/// Obtains connections through the coordinator's enlistment-aware driver.
///
/// Resources are bound in the global scope while application code runs in
/// its own, so the coordinator's lookup is performed from the parent of the
/// caller's scope. The switch only affects the calling thread and is undone
/// when the call returns, fails or unwinds.
pub struct AmbientConnector {
    coordinator: Arc<dyn TransactionCoordinator>,
    propagator: Arc<EnvironmentPropagator>,
    driver_scheme: String,
}

impl AmbientConnector {
    pub fn new(
        coordinator: Arc<dyn TransactionCoordinator>,
        propagator: Arc<EnvironmentPropagator>,
        driver_scheme: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            propagator,
            driver_scheme: driver_scheme.into(),
        }
    }

    pub fn coordinator(&self) -> &Arc<dyn TransactionCoordinator> {
        &self.coordinator
    }

    pub fn connect(&self, logical_name: &str, credentials: &Credentials) -> BridgeResult<Connection> {
        self.connect_with_timeout(logical_name, credentials, None)
    }

    /// Like [`connect`](Self::connect), giving up with a timeout once
    /// `timeout` has elapsed before the resource was reached
    pub fn connect_with_timeout(
        &self,
        logical_name: &str,
        credentials: &Credentials,
        timeout: Option<Duration>,
    ) -> BridgeResult<Connection> {
        self.propagator.propagate()?;

        let address = DriverAddress::new(self.driver_scheme.as_str(), logical_name);
        let context =
            EnlistmentContext::new(logical_name, credentials, address).with_timeout(timeout);

        let _scope = ScopeGuard::enter(scope::current().parent());
        log::debug!("Connecting to {} from scope {}", context.address, scope::current());

        self.coordinator
            .connect(&context)
            .map_err(|source| BridgeError::ConnectionAcquisition {
                name: logical_name.to_string(),
                source,
            })
    }
}
