// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Resource contracts
//!
//! This module defines the two views a connection-providing resource can
//! offer:
//! - [`DataSource`]: plain connections for application code
//! - [`XaDataSource`]: raw XA connections for the coordinator's enlistment
//!   and recovery logic
//!
//! Vendor drivers implement [`XaDataSource`]. The bridge's mediator
//! implements both.

pub mod memory;

use crate::connection::Connection;
use crate::error::{BridgeResult, ResourceError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub use memory::{InMemoryXaDataSource, MemoryLogSink};

/// Identifier of a transaction branch held by a resource manager
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Xid {
    pub format_id: i32,
    pub global_id: String,
    pub branch: String,
}

impl Xid {
    pub fn new(format_id: i32, global_id: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            format_id,
            global_id: global_id.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.format_id, self.global_id, self.branch)
    }
}

/// Destination for a resource's diagnostic output
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

pub type SharedLogSink = Arc<dyn LogSink>;

/// Forwards resource diagnostics to the `log` facade
pub struct LogFacadeSink {
    target: String,
}

impl LogFacadeSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl LogSink for LogFacadeSink {
    fn write_line(&self, line: &str) {
        log::info!(target: self.target.as_str(), "{}", line);
    }
}

/// A physical connection able to take part in two-phase commit
pub trait XaConnection: Send + Sync + fmt::Debug {
    fn connection_id(&self) -> Uuid;

    /// User the connection was opened for, if any
    fn user(&self) -> Option<&str>;

    /// Branches the resource manager holds in the prepared state
    fn recover(&self) -> Result<Vec<Xid>, ResourceError>;

    fn close(&self) -> Result<(), ResourceError>;

    fn is_closed(&self) -> bool;
}

/// Factory for raw XA connections
pub trait XaDataSource: Send + Sync {
    fn get_xa_connection(&self) -> Result<Box<dyn XaConnection>, ResourceError>;

    fn get_xa_connection_as(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn XaConnection>, ResourceError>;

    fn log_writer(&self) -> Option<SharedLogSink>;

    fn set_log_writer(&self, sink: Option<SharedLogSink>);

    /// Maximum time to wait while connecting; `None` means no limit
    fn login_timeout(&self) -> Option<Duration>;

    fn set_login_timeout(&self, timeout: Option<Duration>);
}

/// Factory for connections bound to the caller's ambient transaction
pub trait DataSource: Send + Sync {
    fn get_connection(&self) -> BridgeResult<Connection>;

    fn get_connection_as(&self, user: &str, password: &str) -> BridgeResult<Connection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_display() {
        assert_eq!(Xid::new(0x4a, "gtrid-1", "b1").to_string(), "74:gtrid-1:b1");
    }
}
