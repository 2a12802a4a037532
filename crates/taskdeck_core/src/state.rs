use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::view_model::TaskStoreView;
use crate::{
    AccountFingerprint, DownloadTask, FingerprintSet, Operation, StoreError,
    StoreErrorKind, TaskId, TaskState,
};

/// Monotonic id attached to every backend request issued by the store.
///
/// Fetches and task commands share one counter, so ids also order a fetch
/// relative to local mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A task removed locally whose delete may not have reached the backend yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tombstone {
    request: RequestId,
    /// First request id issued after the backend confirmed the delete.
    confirmed_from: Option<RequestId>,
    task: DownloadTask,
}

/// Single source of truth for download tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskStoreState {
    account_hashes: FingerprintSet,
    tasks: BTreeMap<TaskId, DownloadTask>,
    /// Request id of the latest local command per task.
    revisions: HashMap<TaskId, RequestId>,
    tombstones: HashMap<TaskId, Tombstone>,
    last_request: RequestId,
    latest_fetch: Option<RequestId>,
    settled_fetch: Option<RequestId>,
    last_error: Option<StoreError>,
    error_count: u64,
    stale_discarded: u64,
    shut_down: bool,
    dirty: bool,
}

impl TaskStoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> TaskStoreView {
        TaskStoreView {
            tasks: self.tasks.values().cloned().collect(),
            account_hashes: self.account_hashes.as_slice().to_vec(),
            loading: self.is_loading(),
            last_error: self.last_error.clone(),
            shut_down: self.shut_down,
        }
    }

    pub fn account_hashes(&self) -> &FingerprintSet {
        &self.account_hashes
    }

    pub fn task(&self, id: &TaskId) -> Option<&DownloadTask> {
        self.tasks.get(id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_loading(&self) -> bool {
        match (self.latest_fetch, self.settled_fetch) {
            (Some(latest), Some(settled)) => latest > settled,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    /// Number of errors recorded so far; lets a caller tell whether its own
    /// message produced one.
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Number of backend results dropped because a newer request superseded them.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn next_request(&mut self) -> RequestId {
        self.last_request = RequestId(self.last_request.0 + 1);
        self.last_request
    }

    pub(crate) fn record_error(&mut self, op: Operation, kind: StoreErrorKind) {
        self.last_error = Some(StoreError::new(op, kind));
        self.error_count += 1;
        self.mark_dirty();
    }

    pub(crate) fn clear_error_for(&mut self, op: Operation) {
        if self.last_error.as_ref().is_some_and(|err| err.op == op) {
            self.last_error = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn discard_stale(&mut self) {
        self.stale_discarded += 1;
    }

    pub(crate) fn shut_down(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            self.latest_fetch = self.settled_fetch;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_account_hashes(&mut self, fingerprints: Vec<AccountFingerprint>) {
        let next = FingerprintSet::new(fingerprints);
        if next.as_slice() != self.account_hashes.as_slice() {
            self.account_hashes = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_fetch(&mut self) -> RequestId {
        let request = self.next_request();
        self.latest_fetch = Some(request);
        self.mark_dirty();
        request
    }

    /// Claims the fetch slot for `request`; false when a newer fetch already settled.
    pub(crate) fn settle_fetch(&mut self, request: RequestId) -> bool {
        if self.settled_fetch.is_some_and(|settled| settled >= request) {
            return false;
        }
        self.settled_fetch = Some(request);
        self.mark_dirty();
        true
    }

    /// Replaces the collection with a fetch response issued as `request`.
    ///
    /// Tasks touched locally after the fetch was issued keep their local
    /// version, and locally deleted tasks stay hidden until a fetch issued
    /// after the backend confirmed the delete.
    pub(crate) fn replace_tasks(&mut self, request: RequestId, fetched: Vec<DownloadTask>) {
        let mut next = BTreeMap::new();
        for mut task in fetched {
            if task.state == TaskState::Deleted || self.is_hidden(&task.id, request) {
                continue;
            }
            if self.is_newer_than(&task.id, request) {
                continue;
            }
            if let Some(previous) = self.tasks.get(&task.id) {
                task.carry_progress_from(previous);
            }
            next.insert(task.id.clone(), task);
        }
        for (id, task) in &self.tasks {
            if self.is_newer_than(id, request) {
                next.insert(id.clone(), task.clone());
            }
        }

        self.tombstones.retain(|_, tombstone| {
            tombstone
                .confirmed_from
                .is_none_or(|confirmed| confirmed > request)
        });
        let tombstones = &self.tombstones;
        self.revisions
            .retain(|id, _| next.contains_key(id) || tombstones.contains_key(id));
        if next != self.tasks {
            self.tasks = next;
            self.mark_dirty();
        }
    }

    fn is_hidden(&self, id: &TaskId, request: RequestId) -> bool {
        self.tombstones.get(id).is_some_and(|tombstone| {
            tombstone
                .confirmed_from
                .is_none_or(|confirmed| confirmed > request)
        })
    }

    fn is_newer_than(&self, id: &TaskId, request: RequestId) -> bool {
        self.revisions
            .get(id)
            .is_some_and(|revision| *revision > request)
    }

    pub(crate) fn is_current_revision(&self, id: &TaskId, request: RequestId) -> bool {
        self.revisions.get(id) == Some(&request)
    }

    pub(crate) fn touch(&mut self, id: &TaskId, request: RequestId) {
        self.revisions.insert(id.clone(), request);
    }

    pub(crate) fn owns(&self, owner: &AccountFingerprint) -> bool {
        self.account_hashes.contains(owner)
    }

    pub(crate) fn merge_created(&mut self, request: RequestId, mut task: DownloadTask) {
        if self.revisions.get(&task.id).is_some_and(|rev| *rev > request) {
            self.discard_stale();
            return;
        }
        if let Some(previous) = self.tasks.get(&task.id) {
            task.carry_progress_from(previous);
        }
        self.revisions.insert(task.id.clone(), request);
        self.tasks.insert(task.id.clone(), task);
        self.mark_dirty();
    }

    pub(crate) fn set_task_state(&mut self, id: &TaskId, state: TaskState) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) if task.state.can_transition_to(&state) => {
                if task.state != state {
                    task.state = state;
                    self.dirty = true;
                }
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_deleted(&self, id: &TaskId) -> bool {
        self.tombstones.contains_key(id)
    }

    pub(crate) fn remove_task(&mut self, id: &TaskId, request: RequestId) {
        let Some(task) = self.tasks.remove(id) else {
            return;
        };
        self.tombstones.insert(
            id.clone(),
            Tombstone {
                request,
                confirmed_from: None,
                task,
            },
        );
        self.revisions.insert(id.clone(), request);
        self.mark_dirty();
    }

    pub(crate) fn confirm_delete(&mut self, id: &TaskId, request: RequestId) {
        let confirmed_from = RequestId(self.last_request.0 + 1);
        if let Some(tombstone) = self.tombstones.get_mut(id) {
            if tombstone.request == request {
                tombstone.confirmed_from = Some(confirmed_from);
            }
        }
    }

    /// Puts a task back after the backend refused to delete it.
    pub(crate) fn restore_deleted(&mut self, id: &TaskId, request: RequestId) {
        let matches = self
            .tombstones
            .get(id)
            .is_some_and(|tombstone| tombstone.request == request);
        if !matches {
            return;
        }
        if let Some(tombstone) = self.tombstones.remove(id) {
            if self.is_current_revision(id, request) {
                self.tasks.insert(id.clone(), tombstone.task);
                self.mark_dirty();
            }
        }
    }
}
