// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Name registry contract

use super::environment::NamingEnvironment;
use super::scope::LookupScope;
use crate::coordinator::TransactionCoordinator;
use crate::datasource::XaDataSource;
use crate::error::ResourceError;
use std::fmt;
use std::sync::Arc;

/// Resource handle a registry resolves a name to
#[derive(Clone)]
pub enum Binding {
    /// A resource able to hand out raw XA connections
    DataSource(Arc<dyn XaDataSource>),
    /// A transaction coordinator published for lookup-based integrations
    Coordinator(Arc<dyn TransactionCoordinator>),
}

impl Binding {
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::DataSource(_) => "data source",
            Binding::Coordinator(_) => "transaction coordinator",
        }
    }

    pub fn into_data_source(self, name: &str) -> Result<Arc<dyn XaDataSource>, ResourceError> {
        match self {
            Binding::DataSource(ds) => Ok(ds),
            Binding::Coordinator(_) => Err(ResourceError::WrongBindingType(name.to_string())),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({})", self.kind())
    }
}

/// Hierarchically scoped lookup service
///
/// Implementations resolve `name` in exactly the scope they are given. A
/// session is opened with `environment`; implementations may refuse an
/// environment they cannot work with.
pub trait NameRegistry: Send + Sync {
    fn lookup(
        &self,
        environment: &NamingEnvironment,
        scope: &LookupScope,
        name: &str,
    ) -> Result<Binding, ResourceError>;
}
