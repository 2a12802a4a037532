use crate::{AccountFingerprint, DownloadTarget, DownloadTask, RequestId, ServiceError, TaskAction, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Reconciliation submitted a new fingerprint set (order preserved).
    AccountHashesSet(Vec<AccountFingerprint>),
    /// Refresh the task list for the current fingerprint set.
    FetchRequested,
    /// Backend answered a fetch.
    FetchCompleted {
        request: RequestId,
        result: Result<Vec<DownloadTask>, ServiceError>,
    },
    /// User asked for a new download on behalf of `owner`.
    StartRequested {
        owner: AccountFingerprint,
        target: DownloadTarget,
    },
    /// Backend answered a task creation.
    StartCompleted {
        request: RequestId,
        result: Result<DownloadTask, ServiceError>,
    },
    PauseRequested(TaskId),
    ResumeRequested(TaskId),
    DeleteRequested(TaskId),
    /// Backend answered a pause, resume or delete.
    ActionCompleted {
        request: RequestId,
        task_id: TaskId,
        action: TaskAction,
        result: Result<(), ServiceError>,
    },
    /// Store is being torn down; later requests are refused.
    ShutdownRequested,
}
