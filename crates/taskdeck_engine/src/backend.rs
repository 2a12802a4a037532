use std::time::Duration;

use taskdeck_core::{
    AccountFingerprint, DownloadTarget, DownloadTask, ServiceError, ServiceErrorKind, TaskId,
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http status {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        // The kind already names the failure; keep only the detail.
        let (kind, message) = match err {
            BackendError::InvalidUrl(url) => {
                (ServiceErrorKind::Network, format!("invalid url {url}"))
            }
            BackendError::Network(message) => (ServiceErrorKind::Network, message),
            BackendError::Timeout(message) => (ServiceErrorKind::Timeout, message),
            BackendError::HttpStatus { status, message } => {
                (ServiceErrorKind::HttpStatus(status), message)
            }
            BackendError::NotFound(message) => (ServiceErrorKind::NotFound, message),
            BackendError::InvalidResponse(message) => (ServiceErrorKind::InvalidResponse, message),
            BackendError::Cancelled => (ServiceErrorKind::Cancelled, String::new()),
        };
        ServiceError::new(kind, message)
    }
}

/// Remote download service, keyed by account fingerprint and task id.
#[async_trait::async_trait]
pub trait TaskBackend: Send + Sync {
    async fn list_tasks(
        &self,
        account_hashes: &[AccountFingerprint],
    ) -> Result<Vec<DownloadTask>, BackendError>;

    async fn create_task(
        &self,
        owner: &AccountFingerprint,
        target: &DownloadTarget,
    ) -> Result<DownloadTask, BackendError>;

    async fn pause_task(&self, task_id: &TaskId) -> Result<(), BackendError>;

    async fn resume_task(&self, task_id: &TaskId) -> Result<(), BackendError>;

    /// Cancels and discards a task. An unknown id yields `NotFound`.
    async fn delete_task(&self, task_id: &TaskId) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl BackendSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(6),
            request_timeout: Duration::from_secs(20),
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, BackendError> {
        let url = Url::parse(base_url).map_err(|err| BackendError::InvalidUrl(err.to_string()))?;
        Ok(Self::new(url))
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, BackendError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout(err.to_string());
    }
    if err.is_decode() {
        return BackendError::InvalidResponse(err.to_string());
    }
    BackendError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_names_the_kind_once() {
        let err = ServiceError::from(BackendError::Network("connection reset".into()));
        assert_eq!(err.kind, ServiceErrorKind::Network);
        assert_eq!(err.to_string(), "network error: connection reset");
    }

    #[test]
    fn status_and_body_are_split() {
        let err = ServiceError::from(BackendError::HttpStatus {
            status: 409,
            message: "task is completed".into(),
        });
        assert_eq!(err.kind, ServiceErrorKind::HttpStatus(409));
        assert_eq!(err.to_string(), "http status 409: task is completed");
    }

    #[test]
    fn cancellation_has_no_detail() {
        let err = ServiceError::from(BackendError::Cancelled);
        assert_eq!(err.to_string(), "cancelled");
    }
}
