// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction coordinator contract
//!
//! The bridge does not implement a transaction manager. It talks to one
//! through [`TransactionCoordinator`], which exposes:
//! - a configuration store the naming environment is propagated into
//! - the singleton recovery worker
//! - an enlistment-aware connect that binds connections to the caller's
//!   ambient transaction
//!
//! [`LocalCoordinator`] is an in-process implementation that tracks ambient
//! transactions and enlistment without any commit protocol.

pub mod config_store;
pub mod local;
pub mod recovery;

use crate::connection::{Connection, EnlistmentContext};
use crate::error::{BridgeResult, ResourceError};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use config_store::ConfigStore;
pub use local::{LocalCoordinator, TransactionHandle, TransactionStatus};
pub use recovery::{
    LocalRecoveryWorker, RecoveryModule, RecoveryStatistics, XaResourceRecoveryModule,
};

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Handle on the coordinator's background recovery process
pub trait RecoveryWorker: Send + Sync {
    /// Begin background execution
    fn start(&self) -> BridgeResult<()>;

    /// Signal termination and block until the worker has acknowledged it.
    /// A terminated worker cannot be started again.
    fn terminate(&self) -> BridgeResult<()>;

    fn is_running(&self) -> bool;

    fn is_terminated(&self) -> bool;
}

/// Services the bridge consumes from a transaction manager
pub trait TransactionCoordinator: Send + Sync {
    /// Store the coordinator reads its naming environment from
    fn config_store(&self) -> Arc<ConfigStore>;

    /// Create the transaction timeout reaper so it is owned by the calling
    /// context. Repeated calls are no-ops.
    fn instantiate_reaper(&self) -> BridgeResult<()> {
        Ok(())
    }

    /// Address scheme `connect` accepts, when the coordinator has a fixed one
    fn driver_scheme(&self) -> Option<&str> {
        None
    }

    /// Materialize or return the singleton recovery worker
    fn recovery_worker(&self) -> BridgeResult<Arc<dyn RecoveryWorker>>;

    /// Resolve the context's address and return a connection, enlisted in the
    /// calling thread's ambient transaction when there is one
    fn connect(&self, context: &EnlistmentContext<'_>) -> Result<Connection, ResourceError>;

    /// Downcast to the concrete coordinator
    fn as_any(&self) -> &dyn Any;
}
