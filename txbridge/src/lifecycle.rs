// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Recovery lifecycle controller
//!
//! Ties the coordinator's recovery worker to the host's start and stop
//! events. The worker must only run once transactional resources are
//! registered, and must be stopped before the host goes away.
//!
//! ```text
//! Stopped --start--> Starting --ok--> Running --stop--> Stopping --> Stopped
//!                       |
//!                       +--failure--> Stopped
//! ```

use crate::coordinator::{RecoveryWorker, TransactionCoordinator};
use crate::error::{BridgeError, BridgeResult};
use crate::propagator::EnvironmentPropagator;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Stopped => "stopped",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Host events the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Start,
    Stop,
}

impl HostEvent {
    /// Map the host's event type; anything other than `start`/`stop` is `None`
    pub fn parse(event_type: &str) -> Option<HostEvent> {
        match event_type {
            "start" => Some(HostEvent::Start),
            "stop" => Some(HostEvent::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Start => f.write_str("start"),
            HostEvent::Stop => f.write_str("stop"),
        }
    }
}

/// Starts the recovery worker on host start and terminates it on host stop
pub struct RecoveryLifecycleController {
    coordinator: Arc<dyn TransactionCoordinator>,
    propagator: Arc<EnvironmentPropagator>,
    // Serializes whole transitions; `state` stays readable meanwhile
    transition: Mutex<()>,
    state: RwLock<LifecycleState>,
    worker: Mutex<Option<Arc<dyn RecoveryWorker>>>,
}

impl RecoveryLifecycleController {
    pub fn new(
        coordinator: Arc<dyn TransactionCoordinator>,
        propagator: Arc<EnvironmentPropagator>,
    ) -> Self {
        Self {
            coordinator,
            propagator,
            transition: Mutex::new(()),
            state: RwLock::new(LifecycleState::Stopped),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Handle held while running
    pub fn worker(&self) -> Option<Arc<dyn RecoveryWorker>> {
        self.worker.lock().clone()
    }

    /// Dispatch a host event by its textual type. Unrelated events are ignored.
    pub fn handle_event(&self, event_type: &str) -> BridgeResult<()> {
        match HostEvent::parse(event_type) {
            Some(HostEvent::Start) => self.on_host_start(),
            Some(HostEvent::Stop) => self.on_host_stop(),
            None => {
                log::trace!("Ignoring host event '{}'", event_type);
                Ok(())
            }
        }
    }

    pub fn on_host_start(&self) -> BridgeResult<()> {
        let _transition = self.transition.lock();
        self.expect_state(LifecycleState::Stopped, HostEvent::Start)?;
        self.set_state(LifecycleState::Starting);

        match self.start_worker() {
            Ok(worker) => {
                *self.worker.lock() = Some(worker);
                self.set_state(LifecycleState::Running);
                log::info!("Transaction recovery started");
                Ok(())
            }
            Err(e) => {
                self.set_state(LifecycleState::Stopped);
                log::error!("Transaction recovery failed to start: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_host_stop(&self) -> BridgeResult<()> {
        let _transition = self.transition.lock();
        self.expect_state(LifecycleState::Running, HostEvent::Stop)?;
        self.set_state(LifecycleState::Stopping);

        let result = match self.worker.lock().take() {
            Some(worker) => worker.terminate(),
            None => Ok(()),
        };
        self.set_state(LifecycleState::Stopped);

        match &result {
            Ok(()) => log::info!("Transaction recovery stopped"),
            Err(e) => log::error!("Recovery worker did not terminate cleanly: {}", e),
        }
        result
    }

    fn start_worker(&self) -> BridgeResult<Arc<dyn RecoveryWorker>> {
        self.coordinator.instantiate_reaper()?;
        self.propagator.propagate()?;
        let worker = self.coordinator.recovery_worker()?;
        worker.start()?;
        Ok(worker)
    }

    fn expect_state(&self, expected: LifecycleState, event: HostEvent) -> BridgeResult<()> {
        let state = self.state();
        if state != expected {
            return Err(BridgeError::InvalidLifecycleTransition { state, event });
        }
        Ok(())
    }

    fn set_state(&self, state: LifecycleState) {
        log::debug!("Recovery lifecycle: {} -> {}", self.state(), state);
        *self.state.write() = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BridgeConfig, PropagationPolicy};
    use crate::coordinator::LocalCoordinator;
    use crate::naming::{InMemoryNameRegistry, ProcessProperties};

    fn controller(policy: PropagationPolicy) -> RecoveryLifecycleController {
        let coordinator: Arc<dyn TransactionCoordinator> = Arc::new(
            LocalCoordinator::new(Arc::new(InMemoryNameRegistry::new()), &BridgeConfig::default())
                .unwrap(),
        );
        let propagator = Arc::new(EnvironmentPropagator::new(
            Arc::new(ProcessProperties::new()),
            coordinator.config_store(),
            policy,
        ));
        RecoveryLifecycleController::new(coordinator, propagator)
    }

    #[test]
    fn test_start_then_stop() {
        let controller = controller(PropagationPolicy::Lenient);
        controller.on_host_start().unwrap();
        assert_eq!(controller.state(), LifecycleState::Running);
        let worker = controller.worker().unwrap();
        assert!(worker.is_running());

        controller.on_host_stop().unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert!(worker.is_terminated());
        assert!(controller.worker().is_none());
    }

    #[test]
    fn test_stop_without_start() {
        let controller = controller(PropagationPolicy::Lenient);
        let err = controller.on_host_stop().unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidLifecycleTransition {
                state: LifecycleState::Stopped,
                event: HostEvent::Stop,
            }
        ));
    }

    #[test]
    fn test_failed_start_reverts_to_stopped() {
        let controller = controller(PropagationPolicy::Strict);
        let err = controller.on_host_start().unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationPropagation(_)));
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert!(controller.worker().is_none());
    }

    #[test]
    fn test_handle_event_ignores_other_events() {
        let controller = controller(PropagationPolicy::Lenient);
        controller.handle_event("before_start").unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);

        controller.handle_event("start").unwrap();
        assert_eq!(controller.state(), LifecycleState::Running);
        controller.handle_event("after_start").unwrap();
        controller.handle_event("stop").unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_event_parse() {
        assert_eq!(HostEvent::parse("start"), Some(HostEvent::Start));
        assert_eq!(HostEvent::parse("stop"), Some(HostEvent::Stop));
        assert_eq!(HostEvent::parse("periodic"), None);
    }
}
