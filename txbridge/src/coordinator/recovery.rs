// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Background recovery worker
//!
//! A recovery pass asks every registered [`RecoveryModule`] for transaction
//! branches left in doubt. The worker runs passes on a dedicated thread
//! driving a single-threaded tokio runtime; the first pass happens as soon
//! as the worker starts, later ones every `interval`.

use super::config_store::ConfigStore;
use super::RecoveryWorker;
use crate::datasource::Xid;
use crate::error::{BridgeError, BridgeResult, ResourceError};
use crate::naming::{LookupScope, NameRegistry, NamingEnvironment};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// One unit of recovery work
pub trait RecoveryModule: Send + Sync {
    fn name(&self) -> &str;

    /// Report the branches currently in doubt
    fn scan(&self) -> Result<Vec<Xid>, ResourceError>;
}

/// Scans XA resources bound in the global scope
///
/// Resources are resolved with the naming environment found in the
/// coordinator's configuration store, which is why the environment must be
/// propagated before the worker starts.
pub struct XaResourceRecoveryModule {
    registry: Arc<dyn NameRegistry>,
    config: Arc<ConfigStore>,
    resource_names: Vec<String>,
}

impl XaResourceRecoveryModule {
    pub fn new(
        registry: Arc<dyn NameRegistry>,
        config: Arc<ConfigStore>,
        resource_names: Vec<String>,
    ) -> Self {
        Self {
            registry,
            config,
            resource_names,
        }
    }

    fn scan_resource(
        &self,
        environment: &NamingEnvironment,
        name: &str,
    ) -> Result<Vec<Xid>, ResourceError> {
        let data_source = self
            .registry
            .lookup(environment, &LookupScope::Global, name)?
            .into_data_source(name)?;
        let connection = data_source.get_xa_connection()?;
        let result = connection.recover();
        if let Err(e) = connection.close() {
            log::warn!("Failed to close recovery connection for '{}': {}", name, e);
        }
        result
    }
}

impl RecoveryModule for XaResourceRecoveryModule {
    fn name(&self) -> &str {
        "xa-resources"
    }

    fn scan(&self) -> Result<Vec<Xid>, ResourceError> {
        let environment = NamingEnvironment::from_store(&self.config);
        let mut found = Vec::new();
        let mut last_error = None;
        let mut scanned = 0usize;

        for name in &self.resource_names {
            match self.scan_resource(&environment, name) {
                Ok(xids) => {
                    scanned += 1;
                    for xid in &xids {
                        log::warn!("In-doubt branch {} on '{}'", xid, name);
                    }
                    found.extend(xids);
                }
                Err(e) => {
                    log::warn!("Recovery scan of '{}' failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if scanned == 0 => Err(e),
            _ => Ok(found),
        }
    }
}

/// Shortest pause between passes; shorter intervals are raised to it
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// Counters maintained across recovery passes
#[derive(Debug, Clone, Default)]
pub struct RecoveryStatistics {
    pub passes: u64,
    pub in_doubt_found: u64,
    pub scan_failures: u64,
    pub last_pass: Option<DateTime<Utc>>,
    pub last_in_doubt: Vec<Xid>,
}

enum WorkerState {
    Idle,
    Running {
        shutdown: oneshot::Sender<()>,
        thread: JoinHandle<()>,
    },
    Terminated,
}

/// Recovery worker owned by a [`LocalCoordinator`](super::LocalCoordinator)
pub struct LocalRecoveryWorker {
    id: Uuid,
    modules: Vec<Arc<dyn RecoveryModule>>,
    interval: Duration,
    state: Mutex<WorkerState>,
    stats: Arc<RwLock<RecoveryStatistics>>,
}

impl LocalRecoveryWorker {
    pub fn new(modules: Vec<Arc<dyn RecoveryModule>>, interval: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            modules,
            interval: interval.max(MIN_SCAN_INTERVAL),
            state: Mutex::new(WorkerState::Idle),
            stats: Arc::new(RwLock::new(RecoveryStatistics::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn statistics(&self) -> RecoveryStatistics {
        self.stats.read().clone()
    }

    /// Run one pass on the calling thread
    pub fn scan_now(&self) -> RecoveryStatistics {
        run_pass(&self.modules, &self.stats);
        self.statistics()
    }
}

impl RecoveryWorker for LocalRecoveryWorker {
    fn start(&self) -> BridgeResult<()> {
        let mut state = self.state.lock();
        match *state {
            WorkerState::Idle => {}
            WorkerState::Running { .. } => {
                return Err(BridgeError::Recovery(format!(
                    "recovery worker {} is already running",
                    self.id
                )))
            }
            WorkerState::Terminated => {
                return Err(BridgeError::Recovery(format!(
                    "recovery worker {} has been terminated",
                    self.id
                )))
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| BridgeError::Recovery(format!("Failed to build runtime: {}", e)))?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let modules = self.modules.clone();
        let stats = self.stats.clone();
        let interval = self.interval;

        let thread = std::thread::Builder::new()
            .name("txbridge-recovery".to_string())
            .spawn(move || {
                runtime.block_on(run_recovery_loop(modules, interval, stats, shutdown_rx));
            })
            .map_err(|e| BridgeError::Recovery(format!("Failed to spawn recovery thread: {}", e)))?;

        *state = WorkerState::Running { shutdown, thread };
        log::info!(
            "Recovery worker {} started ({} modules, interval {:?})",
            self.id,
            self.modules.len(),
            self.interval
        );
        Ok(())
    }

    fn terminate(&self) -> BridgeResult<()> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, WorkerState::Terminated) {
            WorkerState::Running { shutdown, thread } => {
                // The loop also exits if the sender is gone, so a failed send is fine
                let _ = shutdown.send(());
                thread.join().map_err(|_| {
                    BridgeError::Recovery(format!("recovery worker {} panicked", self.id))
                })?;
                log::info!("Recovery worker {} terminated", self.id);
                Ok(())
            }
            WorkerState::Idle => {
                log::debug!("Recovery worker {} terminated before it started", self.id);
                Ok(())
            }
            WorkerState::Terminated => Err(BridgeError::Recovery(format!(
                "recovery worker {} was already terminated",
                self.id
            ))),
        }
    }

    fn is_running(&self) -> bool {
        matches!(*self.state.lock(), WorkerState::Running { .. })
    }

    fn is_terminated(&self) -> bool {
        matches!(*self.state.lock(), WorkerState::Terminated)
    }
}

impl Drop for LocalRecoveryWorker {
    fn drop(&mut self) {
        if let WorkerState::Running { shutdown, thread } =
            std::mem::replace(self.state.get_mut(), WorkerState::Terminated)
        {
            let _ = shutdown.send(());
            let _ = thread.join();
        }
    }
}

async fn run_recovery_loop(
    modules: Vec<Arc<dyn RecoveryModule>>,
    interval: Duration,
    stats: Arc<RwLock<RecoveryStatistics>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => run_pass(&modules, &stats),
        }
    }
}

fn run_pass(modules: &[Arc<dyn RecoveryModule>], stats: &RwLock<RecoveryStatistics>) {
    let mut found = Vec::new();
    let mut failures = 0u64;

    for module in modules {
        match module.scan() {
            Ok(xids) => found.extend(xids),
            Err(e) => {
                failures += 1;
                log::warn!("Recovery module '{}' failed: {}", module.name(), e);
            }
        }
    }

    let mut stats = stats.write();
    stats.passes += 1;
    stats.in_doubt_found += found.len() as u64;
    stats.scan_failures += failures;
    stats.last_pass = Some(Utc::now());
    stats.last_in_doubt = found;
    log::debug!(
        "Recovery pass {} complete: {} in doubt, {} failures",
        stats.passes,
        stats.last_in_doubt.len(),
        failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::InMemoryXaDataSource;
    use crate::naming::{Binding, InMemoryNameRegistry};
    use std::time::Instant;

    struct FixedModule(Vec<Xid>);

    impl RecoveryModule for FixedModule {
        fn name(&self) -> &str {
            "fixed"
        }

        fn scan(&self) -> Result<Vec<Xid>, ResourceError> {
            Ok(self.0.clone())
        }
    }

    fn wait_for_pass(worker: &LocalRecoveryWorker) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if worker.statistics().passes > 0 {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_worker_start_and_terminate() {
        let module: Arc<dyn RecoveryModule> = Arc::new(FixedModule(vec![Xid::new(1, "g", "b")]));
        let worker = LocalRecoveryWorker::new(vec![module], Duration::from_secs(3600));

        worker.start().unwrap();
        assert!(worker.is_running());
        assert!(wait_for_pass(&worker), "first pass runs immediately");

        worker.terminate().unwrap();
        assert!(worker.is_terminated());
        assert!(!worker.is_running());
        assert_eq!(worker.statistics().in_doubt_found, 1);
    }

    #[test]
    fn test_zero_interval_is_raised_to_minimum() {
        let worker = LocalRecoveryWorker::new(Vec::new(), Duration::ZERO);
        worker.start().unwrap();
        assert!(wait_for_pass(&worker));
        assert!(worker.is_running());

        worker.terminate().unwrap();
        assert!(worker.statistics().passes >= 1);
    }

    #[test]
    fn test_terminated_worker_cannot_restart() {
        let worker = LocalRecoveryWorker::new(Vec::new(), Duration::from_secs(3600));
        worker.start().unwrap();
        worker.terminate().unwrap();

        assert!(matches!(worker.start(), Err(BridgeError::Recovery(_))));
        assert!(matches!(worker.terminate(), Err(BridgeError::Recovery(_))));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let worker = LocalRecoveryWorker::new(Vec::new(), Duration::from_secs(3600));
        worker.start().unwrap();
        assert!(matches!(worker.start(), Err(BridgeError::Recovery(_))));
        worker.terminate().unwrap();
    }

    #[test]
    fn test_xa_module_uses_propagated_environment() {
        let registry = Arc::new(InMemoryNameRegistry::new().requiring_factory("X"));
        let ds = Arc::new(InMemoryXaDataSource::new());
        ds.add_in_doubt(Xid::new(1, "g1", "b1"));
        registry.bind_global("jdbc/Sales", Binding::DataSource(ds));

        let config = Arc::new(ConfigStore::new());
        let module = XaResourceRecoveryModule::new(
            registry.clone(),
            config.clone(),
            vec!["jdbc/Sales".to_string()],
        );

        assert!(matches!(
            module.scan(),
            Err(ResourceError::NamingEnvironment(_))
        ));

        NamingEnvironment::new("X", "Y").write_to(&config);
        assert_eq!(module.scan().unwrap(), vec![Xid::new(1, "g1", "b1")]);
        assert_eq!(registry.lookup_count(&LookupScope::Global, "jdbc/Sales"), 2);
    }

    #[test]
    fn test_scan_now_counts_failures() {
        let registry = Arc::new(InMemoryNameRegistry::new());
        let module: Arc<dyn RecoveryModule> = Arc::new(XaResourceRecoveryModule::new(
            registry,
            Arc::new(ConfigStore::new()),
            vec!["jdbc/Missing".to_string()],
        ));
        let worker = LocalRecoveryWorker::new(vec![module], Duration::from_secs(3600));

        let stats = worker.scan_now();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.scan_failures, 1);
        assert!(stats.last_pass.is_some());
    }
}
