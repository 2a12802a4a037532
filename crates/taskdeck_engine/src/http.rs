use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use taskdeck_core::{AccountFingerprint, DownloadTarget, DownloadTask, TaskId};
use taskdeck_logging::ts_debug;
use url::Url;

use crate::backend::map_reqwest_error;
use crate::wire::{CreateTaskDto, TaskDto, TaskListDto};
use crate::{BackendError, BackendSettings, TaskBackend};

const TASKS_PATH: &str = "api/tasks";

/// [`TaskBackend`] over the download service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpTaskBackend {
    client: reqwest::Client,
    settings: BackendSettings,
}

impl HttpTaskBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }

    fn tasks_url(&self) -> Result<Url, BackendError> {
        let mut base = self.settings.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(TASKS_PATH)
            .map_err(|err| BackendError::InvalidUrl(err.to_string()))
    }

    fn task_url(&self, task_id: &TaskId, action: Option<&str>) -> Result<Url, BackendError> {
        let mut url = self.tasks_url()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BackendError::InvalidUrl(self.settings.base_url.to_string()))?;
            segments.push(task_id.as_str());
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(response.url().path().to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(map_reqwest_error)
    }

    async fn post_action(&self, task_id: &TaskId, action: &str) -> Result<(), BackendError> {
        let url = self.task_url(task_id, Some(action))?;
        ts_debug!("POST {} task={}", action, task_id);
        self.send(self.client.post(url)).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl TaskBackend for HttpTaskBackend {
    async fn list_tasks(
        &self,
        account_hashes: &[AccountFingerprint],
    ) -> Result<Vec<DownloadTask>, BackendError> {
        let mut url = self.tasks_url()?;
        let joined = account_hashes
            .iter()
            .map(AccountFingerprint::as_str)
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut().append_pair("accountHashes", &joined);

        let list: TaskListDto = self.send_json(self.client.get(url)).await?;
        ts_debug!("list_tasks returned {} tasks", list.tasks.len());
        list.tasks.into_iter().map(DownloadTask::try_from).collect()
    }

    async fn create_task(
        &self,
        owner: &AccountFingerprint,
        target: &DownloadTarget,
    ) -> Result<DownloadTask, BackendError> {
        let url = self.tasks_url()?;
        let body = CreateTaskDto::new(owner, target);
        let created: TaskDto = self.send_json(self.client.post(url).json(&body)).await?;
        DownloadTask::try_from(created)
    }

    async fn pause_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        self.post_action(task_id, "pause").await
    }

    async fn resume_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        self.post_action(task_id, "resume").await
    }

    async fn delete_task(&self, task_id: &TaskId) -> Result<(), BackendError> {
        let url = self.task_url(task_id, None)?;
        self.send(self.client.delete(url)).await.map(|_| ())
    }
}
