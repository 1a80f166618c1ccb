// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for resource mediation and recovery lifecycle

use crate::lifecycle::{HostEvent, LifecycleState};
use std::time::Duration;
use thiserror::Error;

/// Failures raised by the collaborators behind the bridge: the name registry,
/// the transaction coordinator and the vendor XA resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Name '{name}' is not bound in scope {scope}")]
    NameNotFound { name: String, scope: String },

    #[error("Naming environment rejected: {0}")]
    NamingEnvironment(String),

    #[error("Binding '{0}' is not a data source")]
    WrongBindingType(String),

    #[error("Invalid driver address: {0}")]
    InvalidAddress(String),

    #[error("Authentication failed for user '{0}'")]
    Authentication(String),

    #[error("Resource unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transaction {0} is not active")]
    TransactionInactive(String),
}

/// Errors surfaced by the bridge to its callers
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid lifecycle transition: '{event}' received while {state}")]
    InvalidLifecycleTransition {
        state: LifecycleState,
        event: HostEvent,
    },

    #[error("Failed to acquire connection for '{name}': {source}")]
    ConnectionAcquisition {
        name: String,
        #[source]
        source: ResourceError,
    },

    #[error("Not a wrapper for {0}")]
    UnsupportedCapability(&'static str),

    #[error("Configuration propagation failed: {0}")]
    ConfigurationPropagation(String),

    #[error("Recovery worker error: {0}")]
    Recovery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_acquisition_error_keeps_source() {
        let err = BridgeError::ConnectionAcquisition {
            name: "jdbc/Sales".to_string(),
            source: ResourceError::Authentication("scott".to_string()),
        };
        assert!(err.to_string().contains("jdbc/Sales"));
        let source = err.source().expect("source should be attached");
        assert_eq!(source.to_string(), "Authentication failed for user 'scott'");
    }

    #[test]
    fn test_lifecycle_error_message() {
        let err = BridgeError::InvalidLifecycleTransition {
            state: LifecycleState::Stopped,
            event: HostEvent::Stop,
        };
        assert_eq!(
            err.to_string(),
            "Invalid lifecycle transition: 'stop' received while stopped"
        );
    }
}
