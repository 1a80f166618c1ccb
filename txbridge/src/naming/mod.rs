// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Naming: scopes, environment and the registry contract
//!
//! Resources are bound by the host in the global scope. Application code runs
//! under a narrower per-application scope, so lookups performed on its behalf
//! must temporarily switch to the parent scope. The switch is confined to
//! the calling thread (see [`scope`]).
//!
//! # Registries
//!
//! - [`NameRegistry`]: the lookup contract
//! - [`InMemoryNameRegistry`]: process-memory implementation that records
//!   every lookup

pub mod environment;
pub mod memory;
pub mod registry;
pub mod scope;

pub use environment::{NamingEnvironment, ProcessProperties};
pub use memory::{InMemoryNameRegistry, LookupRecord};
pub use registry::{Binding, NameRegistry};
pub use scope::{LookupScope, ScopeGuard};
