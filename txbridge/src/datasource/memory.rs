// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory XA resource for embedding and testing

use super::{LogSink, SharedLogSink, XaConnection, XaDataSource, Xid};
use crate::error::ResourceError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// XA resource that keeps everything in process memory
///
/// With no registered accounts every user is accepted. Prepared branches can
/// be injected with [`InMemoryXaDataSource::add_in_doubt`] so recovery has
/// something to report.
pub struct InMemoryXaDataSource {
    accounts: RwLock<HashMap<String, String>>,
    in_doubt: Arc<RwLock<Vec<Xid>>>,
    available: AtomicBool,
    opened: AtomicUsize,
    log_sink: RwLock<Option<SharedLogSink>>,
    login_timeout: RwLock<Option<Duration>>,
}

impl InMemoryXaDataSource {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            in_doubt: Arc::new(RwLock::new(Vec::new())),
            available: AtomicBool::new(true),
            opened: AtomicUsize::new(0),
            log_sink: RwLock::new(None),
            login_timeout: RwLock::new(None),
        }
    }

    /// Require a password for `user`; once any account exists, unknown users are refused
    pub fn with_account(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.write().insert(user.into(), password.into());
        self
    }

    /// Simulate the resource manager going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn add_in_doubt(&self, xid: Xid) {
        self.in_doubt.write().push(xid);
    }

    /// Number of XA connections handed out so far
    pub fn opened_connections(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn open(&self, user: Option<&str>) -> Result<Box<dyn XaConnection>, ResourceError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(ResourceError::Unavailable(
                "in-memory resource manager is offline".to_string(),
            ));
        }

        let connection = InMemoryXaConnection {
            id: Uuid::new_v4(),
            user: user.map(str::to_string),
            in_doubt: self.in_doubt.clone(),
            closed: AtomicBool::new(false),
        };
        self.opened.fetch_add(1, Ordering::SeqCst);

        if let Some(sink) = self.log_sink.read().as_ref() {
            sink.write_line(&format!(
                "opened XA connection {} for {}",
                connection.id,
                user.unwrap_or("<default>")
            ));
        }

        Ok(Box::new(connection))
    }
}

impl Default for InMemoryXaDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl XaDataSource for InMemoryXaDataSource {
    fn get_xa_connection(&self) -> Result<Box<dyn XaConnection>, ResourceError> {
        self.open(None)
    }

    fn get_xa_connection_as(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn XaConnection>, ResourceError> {
        {
            let accounts = self.accounts.read();
            if !accounts.is_empty() && accounts.get(user).map(String::as_str) != Some(password) {
                return Err(ResourceError::Authentication(user.to_string()));
            }
        }
        self.open(Some(user))
    }

    fn log_writer(&self) -> Option<SharedLogSink> {
        self.log_sink.read().clone()
    }

    fn set_log_writer(&self, sink: Option<SharedLogSink>) {
        *self.log_sink.write() = sink;
    }

    fn login_timeout(&self) -> Option<Duration> {
        *self.login_timeout.read()
    }

    fn set_login_timeout(&self, timeout: Option<Duration>) {
        *self.login_timeout.write() = timeout;
    }
}

/// Connection handed out by [`InMemoryXaDataSource`]
#[derive(Debug)]
pub struct InMemoryXaConnection {
    id: Uuid,
    user: Option<String>,
    in_doubt: Arc<RwLock<Vec<Xid>>>,
    closed: AtomicBool,
}

impl XaConnection for InMemoryXaConnection {
    fn connection_id(&self) -> Uuid {
        self.id
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn recover(&self) -> Result<Vec<Xid>, ResourceError> {
        if self.is_closed() {
            return Err(ResourceError::Unavailable(format!(
                "XA connection {} is closed",
                self.id
            )));
        }
        Ok(self.in_doubt.read().clone())
    }

    fn close(&self) -> Result<(), ResourceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Log sink that keeps every line it receives
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
