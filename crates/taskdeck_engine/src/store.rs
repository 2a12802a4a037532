use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use taskdeck_core::{
    update, AccountFingerprint, DownloadTarget, Effect, Msg, ServiceError, ServiceErrorKind,
    StoreError, TaskAction, TaskId, TaskStoreState, TaskStoreView,
};
use taskdeck_logging::{ts_debug, ts_info, ts_warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{BackendError, TaskBackend};

/// How a store command ended, for callers that want more than the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    Applied,
    /// Refused locally or by the backend; the same error is in the view.
    Rejected(StoreError),
    /// A newer request for the same data won; this result was dropped.
    Superseded,
}

struct Dispatched {
    effects: Vec<Effect>,
    error: Option<StoreError>,
    stale: bool,
}

impl Dispatched {
    fn status(&self) -> OpStatus {
        match (&self.error, self.stale) {
            (Some(err), _) => OpStatus::Rejected(err.clone()),
            (None, true) => OpStatus::Superseded,
            (None, false) => OpStatus::Applied,
        }
    }
}

struct StoreInner {
    state: Mutex<TaskStoreState>,
    backend: Arc<dyn TaskBackend>,
    view_tx: watch::Sender<TaskStoreView>,
    shutdown: CancellationToken,
}

/// Owned, injectable container for the task collection.
///
/// Cloning shares the same store. All mutation goes through
/// [`taskdeck_core::update`] under one lock that is never held across a
/// backend call, so concurrent commands interleave only between messages.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        let state = TaskStoreState::new();
        let (view_tx, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                backend,
                view_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn view(&self) -> TaskStoreView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskStoreView> {
        self.inner.view_tx.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Replaces the fingerprint set tasks are fetched for. No network call.
    pub fn set_account_hashes(&self, fingerprints: Vec<AccountFingerprint>) {
        ts_debug!("task store now tracks {} accounts", fingerprints.len());
        self.dispatch(Msg::AccountHashesSet(fingerprints));
    }

    /// Refreshes the collection; an older response never replaces a newer one.
    pub async fn fetch_tasks(&self) -> OpStatus {
        self.run(Msg::FetchRequested).await
    }

    pub async fn start_download(
        &self,
        owner: AccountFingerprint,
        target: DownloadTarget,
    ) -> OpStatus {
        self.run(Msg::StartRequested { owner, target }).await
    }

    pub async fn pause_download(&self, task_id: TaskId) -> OpStatus {
        self.run(Msg::PauseRequested(task_id)).await
    }

    pub async fn resume_download(&self, task_id: TaskId) -> OpStatus {
        self.run(Msg::ResumeRequested(task_id)).await
    }

    /// Idempotent: unknown or already deleted ids are accepted silently.
    pub async fn delete_download(&self, task_id: TaskId) -> OpStatus {
        self.run(Msg::DeleteRequested(task_id)).await
    }

    /// Cancels in-flight backend calls and refuses later commands.
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        ts_info!("task store shutting down");
        self.dispatch(Msg::ShutdownRequested);
        self.inner.shutdown.cancel();
    }

    async fn run(&self, msg: Msg) -> OpStatus {
        let dispatched = self.dispatch(msg);
        let mut status = dispatched.status();
        for effect in dispatched.effects {
            let completion = self.execute(effect).await;
            status = self.dispatch(completion).status();
        }
        status
    }

    fn dispatch(&self, msg: Msg) -> Dispatched {
        let mut guard = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let errors_before = guard.error_count();
        let stale_before = guard.stale_discarded();

        let state = std::mem::take(&mut *guard);
        let (mut state, effects) = update(state, msg);

        let error = if state.error_count() > errors_before {
            state.last_error().cloned()
        } else {
            None
        };
        let stale = state.stale_discarded() > stale_before;
        if stale {
            ts_debug!("dropped a superseded backend result");
        }
        if state.consume_dirty() {
            self.inner.view_tx.send_replace(state.view());
        }
        *guard = state;

        Dispatched {
            effects,
            error,
            stale,
        }
    }

    async fn execute(&self, effect: Effect) -> Msg {
        let backend = self.inner.backend.as_ref();
        let token = &self.inner.shutdown;
        match effect {
            Effect::FetchTasks {
                request,
                account_hashes,
            } => {
                ts_debug!(
                    "fetch {} for {} accounts",
                    request,
                    account_hashes.len()
                );
                let result = guarded(token, backend.list_tasks(&account_hashes)).await;
                if let Err(err) = &result {
                    ts_warn!("fetch {} failed: {}", request, err);
                }
                Msg::FetchCompleted { request, result }
            }
            Effect::CreateTask {
                request,
                owner,
                target,
            } => {
                ts_info!("start {} item={} owner={}", request, target.item_id, owner.short());
                let result = guarded(token, backend.create_task(&owner, &target)).await;
                if let Err(err) = &result {
                    ts_warn!("start {} failed: {}", request, err);
                }
                Msg::StartCompleted { request, result }
            }
            Effect::ApplyAction {
                request,
                task_id,
                action,
            } => {
                ts_info!("{:?} {} task={}", action, request, task_id);
                let result = match action {
                    TaskAction::Pause => guarded(token, backend.pause_task(&task_id)).await,
                    TaskAction::Resume => guarded(token, backend.resume_task(&task_id)).await,
                    TaskAction::Delete => guarded(token, backend.delete_task(&task_id)).await,
                };
                if let Err(err) = &result {
                    if err.kind != ServiceErrorKind::NotFound {
                        ts_warn!("{:?} {} task={} failed: {}", action, request, task_id, err);
                    }
                }
                Msg::ActionCompleted {
                    request,
                    task_id,
                    action,
                    result,
                }
            }
        }
    }
}

/// Runs a backend call unless the store shuts down first; a call that never
/// completes is reported like any other failure.
async fn guarded<T>(
    token: &CancellationToken,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, ServiceError> {
    tokio::select! {
        _ = token.cancelled() => Err(BackendError::Cancelled.into()),
        result = call => result.map_err(ServiceError::from),
    }
}
