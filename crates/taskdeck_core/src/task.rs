use std::fmt;

use crate::AccountFingerprint;

/// Identifier assigned to a task by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What a download is for: one catalogue item, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTarget {
    pub item_id: String,
    pub title: String,
    pub version: Option<String>,
}

impl DownloadTarget {
    pub fn new(item_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed { error: String },
    Deleted,
}

impl TaskState {
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Downloading => "downloading",
            TaskState::Paused => "paused",
            TaskState::Completed => "completed",
            TaskState::Failed { .. } => "failed",
            TaskState::Deleted => "deleted",
        }
    }

    /// States in which progress is still meaningful and must not go backwards.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskState::Queued | TaskState::Downloading | TaskState::Paused
        )
    }

    /// Queued -> Downloading -> {Paused <-> Downloading} -> {Completed | Failed}; any -> Deleted.
    ///
    /// A Failed task is never resumed; it is restarted with a new task.
    pub fn can_transition_to(&self, next: &TaskState) -> bool {
        use TaskState::*;
        if self == next {
            return !matches!(self, Deleted);
        }
        match (self, next) {
            (Deleted, _) => false,
            (_, Deleted) => true,
            (Queued, Downloading | Failed { .. }) => true,
            (Downloading, Paused | Completed | Failed { .. }) => true,
            (Paused, Downloading | Failed { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Failed { error } => write!(f, "failed: {error}"),
            other => f.write_str(other.label()),
        }
    }
}

/// One unit of content being transferred on behalf of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub id: TaskId,
    pub owner: AccountFingerprint,
    pub target: DownloadTarget,
    pub state: TaskState,
    /// Percent complete, 0..=100.
    pub progress: u8,
}

impl DownloadTask {
    pub fn new(id: impl Into<TaskId>, owner: AccountFingerprint, target: DownloadTarget) -> Self {
        Self {
            id: id.into(),
            owner,
            target,
            state: TaskState::Queued,
            progress: 0,
        }
    }

    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            TaskState::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Keeps progress monotonic across refreshes while the task stays active.
    pub(crate) fn carry_progress_from(&mut self, previous: &DownloadTask) {
        if self.state.is_active() && previous.state.is_active() {
            self.progress = self.progress.max(previous.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_and_resume_only_between_downloading_and_paused() {
        assert!(TaskState::Downloading.can_transition_to(&TaskState::Paused));
        assert!(TaskState::Paused.can_transition_to(&TaskState::Downloading));
        assert!(!TaskState::Queued.can_transition_to(&TaskState::Paused));
        assert!(!TaskState::Completed.can_transition_to(&TaskState::Downloading));
    }

    #[test]
    fn failed_cannot_resume_and_deleted_is_final() {
        let failed = TaskState::Failed {
            error: "disk full".into(),
        };
        assert!(!failed.can_transition_to(&TaskState::Downloading));
        assert!(failed.can_transition_to(&TaskState::Deleted));
        assert!(!TaskState::Deleted.can_transition_to(&TaskState::Deleted));
        assert!(!TaskState::Deleted.can_transition_to(&TaskState::Queued));
    }

    #[test]
    fn error_is_only_reported_for_failed_tasks() {
        let owner = AccountFingerprint::new("h1");
        let task = DownloadTask::new("t1", owner, DownloadTarget::new("app.one", "One"));
        assert_eq!(task.error(), None);
        let failed = task.with_state(TaskState::Failed {
            error: "license expired".into(),
        });
        assert_eq!(failed.error(), Some("license expired"));
    }

    #[test]
    fn progress_is_clamped() {
        let owner = AccountFingerprint::new("h1");
        let task = DownloadTask::new("t1", owner, DownloadTarget::new("a", "A")).with_progress(250);
        assert_eq!(task.progress, 100);
    }
}
