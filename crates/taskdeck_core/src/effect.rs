use crate::{AccountFingerprint, DownloadTarget, Operation, RequestId, TaskId};

/// Backend work requested by [`crate::update`]. The runner answers each one
/// with the matching completion message carrying the same request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchTasks {
        request: RequestId,
        account_hashes: Vec<AccountFingerprint>,
    },
    CreateTask {
        request: RequestId,
        owner: AccountFingerprint,
        target: DownloadTarget,
    },
    ApplyAction {
        request: RequestId,
        task_id: TaskId,
        action: TaskAction,
    },
}

impl Effect {
    pub fn request(&self) -> RequestId {
        match self {
            Effect::FetchTasks { request, .. }
            | Effect::CreateTask { request, .. }
            | Effect::ApplyAction { request, .. } => *request,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Pause,
    Resume,
    Delete,
}

impl TaskAction {
    pub fn operation(self) -> Operation {
        match self {
            TaskAction::Pause => Operation::Pause,
            TaskAction::Resume => Operation::Resume,
            TaskAction::Delete => Operation::Delete,
        }
    }
}
