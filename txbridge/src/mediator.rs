// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Transactional resource mediator
//!
//! One wrapper, two views: application code sees a [`DataSource`] whose
//! connections join the ambient transaction, while the coordinator's
//! enlistment and recovery logic sees the wrapped [`XaDataSource`] untouched.

use crate::connection::Connection;
use crate::connector::AmbientConnector;
use crate::credentials::Credentials;
use crate::datasource::{DataSource, SharedLogSink, XaConnection, XaDataSource};
use crate::error::{BridgeError, BridgeResult, ResourceError};
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;

/// Vendor XA resource published under a logical name
pub struct TransactionalDataSource<D: XaDataSource + 'static> {
    name: String,
    inner: Arc<D>,
    connector: Arc<AmbientConnector>,
}

impl<D: XaDataSource + 'static> TransactionalDataSource<D> {
    pub fn new(name: impl Into<String>, inner: Arc<D>, connector: Arc<AmbientConnector>) -> Self {
        Self {
            name: name.into(),
            inner,
            connector,
        }
    }

    /// Logical name the resource is bound under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped vendor resource, for vendor-specific calls
    pub fn unwrapped(&self) -> &Arc<D> {
        &self.inner
    }

    pub fn xa_resource(&self) -> Arc<dyn XaDataSource> {
        self.inner.clone()
    }

    /// True iff the wrapped resource is a `T`
    pub fn supports<T: Any>(&self) -> bool {
        TypeId::of::<T>() == TypeId::of::<D>()
    }

    /// The wrapped resource as `T`, identical to the instance that was wrapped
    pub fn unwrap_as<T: Any + Send + Sync>(&self) -> BridgeResult<Arc<T>> {
        let inner: Arc<dyn Any + Send + Sync> = self.inner.clone();
        inner
            .downcast::<T>()
            .map_err(|_| BridgeError::UnsupportedCapability(std::any::type_name::<T>()))
    }

    fn connect(&self, credentials: &Credentials) -> BridgeResult<Connection> {
        self.connector
            .connect_with_timeout(&self.name, credentials, self.inner.login_timeout())
    }
}

impl<D: XaDataSource + 'static> DataSource for TransactionalDataSource<D> {
    fn get_connection(&self) -> BridgeResult<Connection> {
        self.connect(&Credentials::empty())
    }

    fn get_connection_as(&self, user: &str, password: &str) -> BridgeResult<Connection> {
        self.connect(&Credentials::new(user, password))
    }
}

impl<D: XaDataSource + 'static> XaDataSource for TransactionalDataSource<D> {
    fn get_xa_connection(&self) -> Result<Box<dyn XaConnection>, ResourceError> {
        self.inner.get_xa_connection()
    }

    fn get_xa_connection_as(
        &self,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn XaConnection>, ResourceError> {
        self.inner.get_xa_connection_as(user, password)
    }

    fn log_writer(&self) -> Option<SharedLogSink> {
        self.inner.log_writer()
    }

    fn set_log_writer(&self, sink: Option<SharedLogSink>) {
        self.inner.set_log_writer(sink)
    }

    fn login_timeout(&self) -> Option<Duration> {
        self.inner.login_timeout()
    }

    fn set_login_timeout(&self, timeout: Option<Duration>) {
        self.inner.set_login_timeout(timeout)
    }
}
