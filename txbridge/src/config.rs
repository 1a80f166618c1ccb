// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Bridge configuration

use crate::connection::DEFAULT_DRIVER_SCHEME;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the propagator treats missing naming settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PropagationPolicy {
    /// Propagate whatever is present, absent values included
    #[default]
    Lenient,
    /// Refuse to propagate an incomplete environment
    Strict,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Prefix of the coordinator's enlistment-aware driver addresses
    pub driver_scheme: String,

    /// Handling of incomplete naming environments
    pub propagation_policy: PropagationPolicy,

    /// Recovery worker settings
    pub recovery: RecoveryConfig,

    /// Names the coordinator is published under
    pub lookup: LookupConfig,

    /// Timeout applied to transactions begun on the local coordinator
    pub default_transaction_timeout: Duration,
}

/// Recovery worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Pause between recovery passes
    pub scan_interval: Duration,

    /// Logical names of the XA resources scanned on every pass
    pub resource_names: Vec<String>,
}

/// Registry names for lookup-based integrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub transaction_manager_name: String,
    pub user_transaction_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            driver_scheme: DEFAULT_DRIVER_SCHEME.to_string(),
            propagation_policy: PropagationPolicy::Lenient,
            recovery: RecoveryConfig::default(),
            lookup: LookupConfig::default(),
            default_transaction_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(120),
            resource_names: Vec::new(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            transaction_manager_name: "comp/env/TransactionManager".to_string(),
            user_transaction_name: "UserTransaction".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Configuration that refuses to run with an incomplete naming environment
    pub fn strict() -> Self {
        Self {
            propagation_policy: PropagationPolicy::Strict,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.driver_scheme.trim().is_empty() {
            return Err(BridgeError::Config(
                "driver_scheme must not be empty".to_string(),
            ));
        }
        if self.recovery.scan_interval.is_zero() {
            return Err(BridgeError::Config(
                "recovery.scan_interval must be greater than zero".to_string(),
            ));
        }
        if self.lookup.transaction_manager_name.is_empty()
            || self.lookup.user_transaction_name.is_empty()
        {
            return Err(BridgeError::Config(
                "lookup names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a resource to the recovery scan list
    pub fn with_recovery_resource(mut self, name: impl Into<String>) -> Self {
        self.recovery.resource_names.push(name.into());
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.recovery.scan_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.driver_scheme, "txbridge:xa:");
        assert_eq!(config.propagation_policy, PropagationPolicy::Lenient);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = BridgeConfig::from_json(
            r#"{ "propagation_policy": "Strict",
                 "recovery": { "resource_names": ["jdbc/Sales"] } }"#,
        )
        .unwrap();
        assert_eq!(config.propagation_policy, PropagationPolicy::Strict);
        assert_eq!(config.recovery.resource_names, vec!["jdbc/Sales".to_string()]);
        assert_eq!(config.recovery.scan_interval, Duration::from_secs(120));
        assert_eq!(config.lookup, LookupConfig::default());
    }

    #[test]
    fn test_from_json_rejects_empty_scheme() {
        let err = BridgeConfig::from_json(r#"{ "driver_scheme": "" }"#).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        assert!(matches!(
            BridgeConfig::from_json("{ not json"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = BridgeConfig::default().with_scan_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
