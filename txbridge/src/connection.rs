// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Connections, driver addresses and the enlistment context of a lookup

use crate::coordinator::TransactionId;
use crate::credentials::Credentials;
use crate::datasource::XaConnection;
use crate::error::ResourceError;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Scheme prefix the coordinator's enlistment-aware driver answers to
pub const DEFAULT_DRIVER_SCHEME: &str = "txbridge:xa:";

/// Address understood by the coordinator's enlistment-aware connect: a fixed
/// scheme followed by the logical resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverAddress {
    scheme: String,
    logical_name: String,
}

impl DriverAddress {
    pub fn new(scheme: impl Into<String>, logical_name: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            logical_name: logical_name.into(),
        }
    }

    /// Split `address` into scheme and name, requiring the given scheme
    pub fn parse(scheme: &str, address: &str) -> Result<Self, ResourceError> {
        match address.strip_prefix(scheme) {
            Some(name) if !name.is_empty() => Ok(Self::new(scheme, name)),
            Some(_) => Err(ResourceError::InvalidAddress(format!(
                "'{}' carries no resource name",
                address
            ))),
            None => Err(ResourceError::InvalidAddress(format!(
                "'{}' does not start with '{}'",
                address, scheme
            ))),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }
}

impl fmt::Display for DriverAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scheme, self.logical_name)
    }
}

/// Everything a coordinator needs for one enlistment-aware connect.
/// Lives only for the duration of the lookup.
#[derive(Debug)]
pub struct EnlistmentContext<'a> {
    pub logical_name: &'a str,
    pub credentials: &'a Credentials,
    pub address: DriverAddress,
    pub timeout: Option<Duration>,
    pub deadline: Option<Instant>,
}

impl<'a> EnlistmentContext<'a> {
    pub fn new(logical_name: &'a str, credentials: &'a Credentials, address: DriverAddress) -> Self {
        Self {
            logical_name,
            credentials,
            address,
            timeout: None,
            deadline: None,
        }
    }

    /// Bound the lookup and connect to `timeout` from now. A timeout too
    /// large to represent as a deadline imposes none.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        self.timeout = self.deadline.and(timeout);
        self
    }

    /// Fail with [`ResourceError::Timeout`] once the deadline has passed
    pub fn check_deadline(&self) -> Result<(), ResourceError> {
        match self.timeout {
            Some(timeout) if self.is_expired() => Err(ResourceError::Timeout(timeout)),
            _ => Ok(()),
        }
    }

    /// True once the deadline, if any, has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Connection returned to application code
///
/// Enlisted connections carry the transaction they joined; plain ones carry
/// none and behave in autocommit fashion. The caller owns the connection and
/// releases it with [`Connection::close`].
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    resource_name: String,
    transaction: Option<TransactionId>,
    xa: Box<dyn XaConnection>,
}

impl Connection {
    pub fn new(
        resource_name: impl Into<String>,
        transaction: Option<TransactionId>,
        xa: Box<dyn XaConnection>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_name: resource_name.into(),
            transaction,
            xa,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Transaction this connection is enlisted in
    pub fn transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    pub fn is_enlisted(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn user(&self) -> Option<&str> {
        self.xa.user()
    }

    /// Underlying physical XA connection
    pub fn xa_connection(&self) -> &dyn XaConnection {
        self.xa.as_ref()
    }

    /// Release the connection back to the underlying resource
    pub fn close(self) -> Result<(), ResourceError> {
        self.xa.close()
    }
}
