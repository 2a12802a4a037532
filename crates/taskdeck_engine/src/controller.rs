use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::join_all;
use taskdeck_core::{task_rows, LabelMap, PassOutcome, Reconciler, TaskRowView};
use taskdeck_logging::{ts_debug, ts_info, ts_warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Account, AccountHasher, IdentityError, OpStatus, TaskStore};

/// An account left out of the submitted set because it could not be fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedAccount {
    pub index: usize,
    pub email: String,
    pub error: IdentityError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The very same list (by reference) was already seen.
    SameList,
    /// Fingerprints match the last submitted set; no fetch issued.
    Unchanged,
    /// New set submitted and an immediate fetch issued.
    Submitted { accounts: usize, fetch: OpStatus },
    /// A newer account list arrived before this pass finished.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcome: ReconcileOutcome,
    pub rejected: Vec<RejectedAccount>,
}

impl ReconcileReport {
    fn bare(outcome: ReconcileOutcome) -> Self {
        Self {
            outcome,
            rejected: Vec::new(),
        }
    }
}

#[derive(Default)]
struct ControllerState {
    reconciler: Reconciler,
    last_accounts: Option<Arc<[Account]>>,
    in_flight: Option<CancellationToken>,
}

struct ControllerInner {
    store: TaskStore,
    hasher: Arc<dyn AccountHasher>,
    state: Mutex<ControllerState>,
    labels_tx: watch::Sender<LabelMap>,
}

/// Keeps the task store's fingerprint set in step with the account list.
#[derive(Clone)]
pub struct ReconciliationController {
    inner: Arc<ControllerInner>,
}

impl ReconciliationController {
    pub fn new(store: TaskStore, hasher: Arc<dyn AccountHasher>) -> Self {
        let (labels_tx, _) = watch::channel(LabelMap::new());
        Self {
            inner: Arc::new(ControllerInner {
                store,
                hasher,
                state: Mutex::new(ControllerState::default()),
                labels_tx,
            }),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.inner.store
    }

    pub fn labels(&self) -> LabelMap {
        self.inner.labels_tx.borrow().clone()
    }

    pub fn subscribe_labels(&self) -> watch::Receiver<LabelMap> {
        self.inner.labels_tx.subscribe()
    }

    /// Current tasks with owners resolved to account labels.
    pub fn task_rows(&self) -> Vec<TaskRowView> {
        task_rows(&self.inner.store.view(), &self.labels())
    }

    /// Runs one reconciliation pass for a new account list.
    ///
    /// Lists are compared by reference: handing in the same `Arc` again is a
    /// no-op. Starting a pass abandons the one still in flight.
    pub async fn accounts_changed(&self, accounts: Arc<[Account]>) -> ReconcileReport {
        let (pass, token) = {
            let mut state = self.lock();
            if state
                .last_accounts
                .as_ref()
                .is_some_and(|last| Arc::ptr_eq(last, &accounts))
            {
                return ReconcileReport::bare(ReconcileOutcome::SameList);
            }
            state.last_accounts = Some(accounts.clone());
            if let Some(previous) = state.in_flight.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            state.in_flight = Some(token.clone());
            (state.reconciler.begin_pass(), token)
        };

        let hasher = self.inner.hasher.as_ref();
        let hashing = join_all(accounts.iter().map(|account| hasher.fingerprint(account)));
        let results = tokio::select! {
            _ = token.cancelled() => {
                ts_debug!("reconcile pass abandoned while hashing");
                return ReconcileReport::bare(ReconcileOutcome::Superseded);
            }
            results = hashing => results,
        };

        // Pair account i with fingerprint i before anything gets ordered.
        let mut pairs = Vec::with_capacity(accounts.len());
        let mut rejected = Vec::new();
        for (index, (account, result)) in accounts.iter().zip(results).enumerate() {
            match result {
                Ok(fingerprint) => pairs.push((account.email.clone(), fingerprint)),
                Err(error) => {
                    ts_warn!("account #{} ({}) not submitted: {}", index, account.email, error);
                    rejected.push(RejectedAccount {
                        index,
                        email: account.email.clone(),
                        error,
                    });
                }
            }
        }

        let fingerprints = {
            let mut state = self.lock();
            if token.is_cancelled() {
                return ReconcileReport {
                    outcome: ReconcileOutcome::Superseded,
                    rejected,
                };
            }
            match state.reconciler.finish_pass(pass, pairs) {
                PassOutcome::Stale => {
                    return ReconcileReport {
                        outcome: ReconcileOutcome::Superseded,
                        rejected,
                    }
                }
                PassOutcome::Unchanged => {
                    ts_debug!("account list changed but fingerprint set did not");
                    return ReconcileReport {
                        outcome: ReconcileOutcome::Unchanged,
                        rejected,
                    };
                }
                PassOutcome::Changed { fingerprints } => {
                    self.inner
                        .labels_tx
                        .send_replace(state.reconciler.labels().clone());
                    self.inner.store.set_account_hashes(fingerprints.clone());
                    fingerprints
                }
            }
        };

        ts_info!("submitted {} account fingerprints", fingerprints.len());
        // The store settles its own fetches; a newer pass simply issues another.
        let fetch = self.inner.store.fetch_tasks().await;
        ReconcileReport {
            outcome: ReconcileOutcome::Submitted {
                accounts: fingerprints.len(),
                fetch,
            },
            rejected,
        }
    }

    /// Runs a pass for every published account list until the sender is dropped.
    pub fn watch(&self, mut accounts_rx: watch::Receiver<Arc<[Account]>>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut current: JoinHandle<()>;
            loop {
                let accounts = accounts_rx.borrow_and_update().clone();
                let pass = controller.clone();
                // Superseded passes notice cancellation on their own.
                current = tokio::spawn(async move {
                    let report = pass.accounts_changed(accounts).await;
                    ts_debug!("reconcile pass finished: {:?}", report.outcome);
                });
                if accounts_rx.changed().await.is_err() {
                    break;
                }
            }
            let _ = current.await;
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
