//! JSON shapes exchanged with the download service.

use serde::{Deserialize, Serialize};
use taskdeck_core::{AccountFingerprint, DownloadTarget, DownloadTask, TaskState};

use crate::BackendError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskDto {
    pub id: String,
    pub account_hash: String,
    pub item_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TaskListDto {
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskDto<'a> {
    pub account_hash: &'a str,
    pub item_id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
}

impl<'a> CreateTaskDto<'a> {
    pub fn new(owner: &'a AccountFingerprint, target: &'a DownloadTarget) -> Self {
        Self {
            account_hash: owner.as_str(),
            item_id: &target.item_id,
            title: &target.title,
            version: target.version.as_deref(),
        }
    }
}

impl TryFrom<TaskDto> for DownloadTask {
    type Error = BackendError;

    fn try_from(dto: TaskDto) -> Result<Self, Self::Error> {
        let state = match dto.status.as_str() {
            "queued" => TaskState::Queued,
            "downloading" => TaskState::Downloading,
            "paused" => TaskState::Paused,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed {
                error: dto.error.unwrap_or_else(|| "unknown error".to_string()),
            },
            "deleted" => TaskState::Deleted,
            other => {
                return Err(BackendError::InvalidResponse(format!(
                    "task {} has unknown status {other:?}",
                    dto.id
                )))
            }
        };
        let title = if dto.title.is_empty() {
            dto.item_id.clone()
        } else {
            dto.title
        };
        let target = DownloadTarget {
            item_id: dto.item_id,
            title,
            version: dto.version,
        };
        let progress = dto.progress.clamp(0.0, 100.0).floor() as u8;
        Ok(
            DownloadTask::new(dto.id, AccountFingerprint::new(dto.account_hash), target)
                .with_state(state)
                .with_progress(progress),
        )
    }
}
