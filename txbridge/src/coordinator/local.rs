// Copyright (c) 2024-2025 txbridge Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-process transaction coordinator
//!
//! Tracks ambient transactions per thread and enlists the connections it
//! hands out into them. There is no prepare/commit protocol and no
//! transaction log: committing simply closes the books on the transaction.

use super::config_store::ConfigStore;
use super::recovery::{LocalRecoveryWorker, RecoveryModule, XaResourceRecoveryModule};
use super::{RecoveryWorker, TransactionCoordinator, TransactionId};
use crate::config::BridgeConfig;
use crate::connection::{Connection, DriverAddress, EnlistmentContext};
use crate::error::{BridgeResult, ResourceError};
use crate::naming::{scope, LookupScope, NameRegistry, NamingEnvironment};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

thread_local! {
    // (owning coordinator, transaction) active on this thread
    static AMBIENT: RefCell<Option<(Uuid, TransactionId)>> = const { RefCell::new(None) };
}

/// Lifecycle of a local transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
    /// Rolled back by the reaper after its timeout elapsed
    TimedOut,
}

/// Outcomes remembered after a transaction leaves the active set
pub const FINISHED_HISTORY: usize = 1024;

#[derive(Debug)]
struct LocalTransaction {
    // None: never times out
    deadline: Option<Instant>,
    participants: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct TransactionTable {
    active: HashMap<TransactionId, LocalTransaction>,
    finished: VecDeque<(TransactionId, TransactionStatus)>,
}

impl TransactionTable {
    fn status(&self, id: TransactionId) -> Option<TransactionStatus> {
        if self.active.contains_key(&id) {
            return Some(TransactionStatus::Active);
        }
        self.finished
            .iter()
            .rev()
            .find(|(finished, _)| *finished == id)
            .map(|(_, status)| *status)
    }

    /// Move `id` out of the active set, keeping a bounded record of its outcome
    fn retire(
        &mut self,
        id: TransactionId,
        outcome: TransactionStatus,
    ) -> Option<LocalTransaction> {
        let txn = self.active.remove(&id)?;
        self.finished.push_back((id, outcome));
        while self.finished.len() > FINISHED_HISTORY {
            self.finished.pop_front();
        }
        Some(txn)
    }
}

/// Coordinator that keeps all of its state in process memory
pub struct LocalCoordinator {
    id: Uuid,
    registry: Arc<dyn NameRegistry>,
    config: Arc<ConfigStore>,
    driver_scheme: String,
    default_timeout: Duration,
    scan_interval: Duration,
    transactions: Mutex<TransactionTable>,
    reaper_scope: OnceCell<LookupScope>,
    modules: RwLock<Vec<Arc<dyn RecoveryModule>>>,
    worker: Mutex<Option<Arc<LocalRecoveryWorker>>>,
}

impl LocalCoordinator {
    /// Create a coordinator resolving names through `registry`
    ///
    /// The resources listed in `config.recovery.resource_names` are scanned
    /// by the recovery worker. The configuration is validated first.
    pub fn new(registry: Arc<dyn NameRegistry>, config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;

        let store = Arc::new(ConfigStore::new());
        let xa_module: Arc<dyn RecoveryModule> = Arc::new(XaResourceRecoveryModule::new(
            registry.clone(),
            store.clone(),
            config.recovery.resource_names.clone(),
        ));

        Ok(Self {
            id: Uuid::new_v4(),
            registry,
            config: store,
            driver_scheme: config.driver_scheme.clone(),
            default_timeout: config.default_transaction_timeout,
            scan_interval: config.recovery.scan_interval,
            transactions: Mutex::new(TransactionTable::default()),
            reaper_scope: OnceCell::new(),
            modules: RwLock::new(vec![xa_module]),
            worker: Mutex::new(None),
        })
    }

    /// Add a module to every recovery worker materialized from now on
    pub fn register_recovery_module(&self, module: Arc<dyn RecoveryModule>) {
        self.modules.write().push(module);
    }

    /// The current recovery worker, if one has been materialized
    pub fn local_recovery_worker(&self) -> Option<Arc<LocalRecoveryWorker>> {
        self.worker.lock().clone()
    }

    /// Scope the reaper was instantiated in, once it has been
    pub fn reaper_scope(&self) -> Option<LookupScope> {
        self.reaper_scope.get().cloned()
    }

    /// Begin a transaction and make it the calling thread's ambient transaction
    pub fn begin(&self) -> Result<TransactionHandle<'_>, ResourceError> {
        self.begin_with_timeout(self.default_timeout)
    }

    /// Begin with an explicit timeout. A timeout too large to represent
    /// never expires.
    pub fn begin_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<TransactionHandle<'_>, ResourceError> {
        if let Some(current) = self.current_transaction() {
            return Err(ResourceError::Unavailable(format!(
                "nested transactions are not supported ({} is active on this thread)",
                current
            )));
        }

        // Without a host-driven start the reaper lands in the first caller's scope
        self.reaper_scope.get_or_init(scope::current);
        self.reap_expired();

        let id = TransactionId::new();
        self.transactions.lock().active.insert(
            id,
            LocalTransaction {
                deadline: Instant::now().checked_add(timeout),
                participants: Vec::new(),
            },
        );
        AMBIENT.with(|slot| *slot.borrow_mut() = Some((self.id, id)));
        log::debug!("Began {} (timeout {:?})", id, timeout);

        Ok(TransactionHandle {
            coordinator: self,
            id,
            finished: false,
            _not_send: PhantomData,
        })
    }

    /// Ambient transaction of the calling thread, if it belongs to this coordinator
    pub fn current_transaction(&self) -> Option<TransactionId> {
        AMBIENT.with(|slot| match *slot.borrow() {
            Some((owner, id)) if owner == self.id => Some(id),
            _ => None,
        })
    }

    /// Status of an active transaction, or of one among the last
    /// [`FINISHED_HISTORY`] to finish
    pub fn transaction_status(&self, id: TransactionId) -> Option<TransactionStatus> {
        self.transactions.lock().status(id)
    }

    pub fn active_transactions(&self) -> usize {
        self.transactions.lock().active.len()
    }

    /// Transactions held in memory, active and finished
    pub fn tracked_transactions(&self) -> usize {
        let transactions = self.transactions.lock();
        transactions.active.len() + transactions.finished.len()
    }

    /// XA connection ids enlisted in the active transaction `id`
    pub fn participants(&self, id: TransactionId) -> Vec<Uuid> {
        self.transactions
            .lock()
            .active
            .get(&id)
            .map(|txn| txn.participants.clone())
            .unwrap_or_default()
    }

    /// Time out active transactions whose deadline has passed.
    /// Does nothing until the reaper has been instantiated.
    pub fn reap_expired(&self) -> usize {
        if self.reaper_scope.get().is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut transactions = self.transactions.lock();
        let expired: Vec<TransactionId> = transactions
            .active
            .iter()
            .filter(|(_, txn)| txn.deadline.is_some_and(|deadline| deadline <= now))
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            transactions.retire(*id, TransactionStatus::TimedOut);
            log::warn!("Reaper timed out {}", id);
        }
        expired.len()
    }

    fn finish(&self, id: TransactionId, outcome: TransactionStatus) -> Result<(), ResourceError> {
        AMBIENT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if *slot == Some((self.id, id)) {
                *slot = None;
            }
        });

        self.reap_expired();
        let txn = self
            .transactions
            .lock()
            .retire(id, outcome)
            .ok_or_else(|| ResourceError::TransactionInactive(id.to_string()))?;

        log::debug!(
            "{} finished as {:?} with {} participants",
            id,
            outcome,
            txn.participants.len()
        );
        Ok(())
    }

    /// Ambient transaction to enlist into, refusing one that is no longer active
    fn enlistment_target(&self) -> Result<Option<TransactionId>, ResourceError> {
        let Some(id) = self.current_transaction() else {
            return Ok(None);
        };
        self.reap_expired();
        match self.transaction_status(id) {
            Some(TransactionStatus::Active) => Ok(Some(id)),
            _ => Err(ResourceError::TransactionInactive(id.to_string())),
        }
    }
}

impl TransactionCoordinator for LocalCoordinator {
    fn config_store(&self) -> Arc<ConfigStore> {
        self.config.clone()
    }

    fn driver_scheme(&self) -> Option<&str> {
        Some(&self.driver_scheme)
    }

    fn instantiate_reaper(&self) -> BridgeResult<()> {
        let scope = self.reaper_scope.get_or_init(scope::current);
        log::debug!("Transaction reaper owned by scope {}", scope);
        Ok(())
    }

    fn recovery_worker(&self) -> BridgeResult<Arc<dyn RecoveryWorker>> {
        let mut slot = self.worker.lock();
        if let Some(worker) = slot.as_ref() {
            if !worker.is_terminated() {
                return Ok(worker.clone());
            }
        }

        let worker = Arc::new(LocalRecoveryWorker::new(
            self.modules.read().clone(),
            self.scan_interval,
        ));
        log::debug!("Materialized recovery worker {}", worker.id());
        *slot = Some(worker.clone());
        Ok(worker)
    }

    fn connect(&self, context: &EnlistmentContext<'_>) -> Result<Connection, ResourceError> {
        context.check_deadline()?;
        let address = DriverAddress::parse(&self.driver_scheme, &context.address.to_string())?;
        let name = address.logical_name();

        let environment = NamingEnvironment::from_store(&self.config);
        let data_source = self
            .registry
            .lookup(&environment, &scope::current(), name)?
            .into_data_source(name)?;

        let transaction = self.enlistment_target()?;
        context.check_deadline()?;

        let xa = match context.credentials.user() {
            Some(user) => data_source
                .get_xa_connection_as(user, context.credentials.password().unwrap_or_default())?,
            None => data_source.get_xa_connection()?,
        };

        if let Some(id) = transaction {
            let enlisted = match self.transactions.lock().active.get_mut(&id) {
                Some(txn) => {
                    txn.participants.push(xa.connection_id());
                    true
                }
                None => false,
            };
            if !enlisted {
                let _ = xa.close();
                return Err(ResourceError::TransactionInactive(id.to_string()));
            }
            log::debug!("Enlisted {} from '{}' in {}", xa.connection_id(), name, id);
        }

        Ok(Connection::new(name, transaction, xa))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ambient transaction begun on a [`LocalCoordinator`]
///
/// Rolls back when dropped unless committed or rolled back explicitly. The
/// handle is tied to the thread that began the transaction.
pub struct TransactionHandle<'c> {
    coordinator: &'c LocalCoordinator,
    id: TransactionId,
    finished: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'c> TransactionHandle<'c> {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn commit(mut self) -> Result<(), ResourceError> {
        self.finished = true;
        self.coordinator.finish(self.id, TransactionStatus::Committed)
    }

    pub fn rollback(mut self) -> Result<(), ResourceError> {
        self.finished = true;
        self.coordinator.finish(self.id, TransactionStatus::RolledBack)
    }
}

impl Drop for TransactionHandle<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.coordinator.finish(self.id, TransactionStatus::RolledBack) {
            log::debug!("Rollback of {} on drop: {}", self.id, e);
        }
    }
}
