// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! txbridge - XA resource mediation for embedded transaction managers
//!
//! txbridge sits between connection-providing XA resources and a transaction
//! coordinator, and ties the coordinator's recovery process to the lifecycle
//! of the host it runs in.
//!
//! # Features
//!
//! - **Dual-role resources**: one wrapper hands application code connections
//!   enlisted in its ambient transaction, and hands the coordinator the raw
//!   XA resource
//! - **Scoped lookups**: coordinator-side lookups run from the global naming
//!   scope without leaking the switch to other threads
//! - **Environment propagation**: the host's naming settings are copied into
//!   the coordinator before every lookup
//! - **Recovery lifecycle**: the recovery worker starts with the host and is
//!   terminated, and acknowledged, when the host stops
//!
//! # Usage
//!
//! ```ignore
//! let registry = Arc::new(InMemoryNameRegistry::new());
//! let vendor = Arc::new(InMemoryXaDataSource::new());
//! registry.bind_global("jdbc/Sales", Binding::DataSource(vendor.clone()));
//!
//! let config = BridgeConfig::default().with_recovery_resource("jdbc/Sales");
//! let coordinator = Arc::new(LocalCoordinator::new(registry, &config)?);
//! let bridge = TransactionBridge::with_global_properties(config, coordinator.clone())?;
//! bridge.on_host_start()?;
//!
//! let sales = bridge.wrap("jdbc/Sales", vendor);
//! let txn = coordinator.begin()?;
//! let conn = sales.get_connection()?; // enlisted in `txn`
//! txn.commit()?;
//!
//! bridge.on_host_stop()?;
//! ```

pub mod bridge;
pub mod config;
pub mod connection;
pub mod connector;
pub mod coordinator;
pub mod credentials;
pub mod datasource;
pub mod error;
pub mod lifecycle;
pub mod lookup;
pub mod mediator;
pub mod naming;
pub mod propagator;

pub use bridge::TransactionBridge;
pub use config::{BridgeConfig, LookupConfig, PropagationPolicy, RecoveryConfig};
pub use connection::{Connection, DriverAddress, EnlistmentContext};
pub use connector::AmbientConnector;
pub use coordinator::{
    ConfigStore, LocalCoordinator, RecoveryWorker, TransactionCoordinator, TransactionId,
};
pub use credentials::Credentials;
pub use datasource::{DataSource, XaConnection, XaDataSource, Xid};
pub use error::{BridgeError, BridgeResult, ResourceError};
pub use lifecycle::{HostEvent, LifecycleState, RecoveryLifecycleController};
pub use lookup::TransactionManagerLookup;
pub use mediator::TransactionalDataSource;
pub use naming::{LookupScope, NameRegistry, NamingEnvironment, ProcessProperties, ScopeGuard};
pub use propagator::EnvironmentPropagator;

/// txbridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
