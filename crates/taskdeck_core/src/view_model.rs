use crate::{AccountFingerprint, DownloadTask, StoreError, TaskId, TaskState};

/// What the UI layer observes of the task store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskStoreView {
    pub tasks: Vec<DownloadTask>,
    pub account_hashes: Vec<AccountFingerprint>,
    pub loading: bool,
    pub last_error: Option<StoreError>,
    pub shut_down: bool,
}

impl TaskStoreView {
    pub fn task(&self, id: &TaskId) -> Option<&DownloadTask> {
        self.tasks.iter().find(|task| &task.id == id)
    }
}

/// One task as presented, with its owner resolved to a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub task_id: TaskId,
    pub account_label: String,
    pub owner_known: bool,
    pub title: String,
    pub state: TaskState,
    pub progress: u8,
    pub error: Option<String>,
}
