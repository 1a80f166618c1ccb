//! Test fixture for txbridge integration tests
//!
//! Every fixture owns its own registry, coordinator and process properties,
//! so tests can run in parallel without sharing state.

use std::sync::Arc;
use txbridge::coordinator::LocalRecoveryWorker;
use txbridge::datasource::InMemoryXaDataSource;
use txbridge::naming::environment::{INITIAL_CONTEXT_FACTORY, URL_PKG_PREFIXES};
use txbridge::naming::{Binding, InMemoryNameRegistry};
use txbridge::{
    BridgeConfig, LocalCoordinator, ProcessProperties, TransactionBridge, TransactionalDataSource,
};

pub const SALES: &str = "jdbc/Sales";

pub struct TestFixture {
    pub registry: Arc<InMemoryNameRegistry>,
    pub vendor: Arc<InMemoryXaDataSource>,
    pub properties: Arc<ProcessProperties>,
    pub coordinator: Arc<LocalCoordinator>,
    pub bridge: TransactionBridge,
}

impl TestFixture {
    /// Fixture with `jdbc/Sales` bound globally and no naming properties set
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self::build(config, InMemoryNameRegistry::new())
    }

    /// Fixture whose registry only accepts sessions opened with factory `X`,
    /// with the process properties naming factory `X` and prefixes `Y`
    pub fn with_naming_environment(config: BridgeConfig) -> Self {
        let fixture = Self::build(config, InMemoryNameRegistry::new().requiring_factory("X"));
        fixture.properties.set(INITIAL_CONTEXT_FACTORY, "X");
        fixture.properties.set(URL_PKG_PREFIXES, "Y");
        fixture
    }

    fn build(config: BridgeConfig, registry: InMemoryNameRegistry) -> Self {
        super::init_logging();

        let registry = Arc::new(registry);
        let vendor = Arc::new(InMemoryXaDataSource::new());
        registry.bind_global(SALES, Binding::DataSource(vendor.clone()));

        let properties = Arc::new(ProcessProperties::new());
        let coordinator = Arc::new(
            LocalCoordinator::new(registry.clone(), &config).expect("Failed to create coordinator"),
        );
        let bridge = TransactionBridge::new(config, coordinator.clone(), properties.clone())
            .expect("Failed to create bridge");

        Self {
            registry,
            vendor,
            properties,
            coordinator,
            bridge,
        }
    }

    pub fn sales(&self) -> Arc<TransactionalDataSource<InMemoryXaDataSource>> {
        self.bridge.wrap(SALES, self.vendor.clone())
    }

    pub fn recovery_worker(&self) -> Option<Arc<LocalRecoveryWorker>> {
        self.coordinator.local_recovery_worker()
    }
}
