use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use taskdeck_logging::{ts_info, ts_warn};
use url::Url;

use crate::backend::map_reqwest_error;
use crate::{Account, BackendError, BackendSettings};

/// Strips whitespace and ':' so pasted device ids ("AB:12 34") are accepted.
pub fn normalize_device_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect()
}

/// Credentials for one sign-in attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
    /// Second-factor code, once the service asked for one.
    pub code: Option<String>,
    /// Always normalized.
    pub device_id: String,
}

impl AuthRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        device_id: &str,
    ) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
            code: None,
            device_id: normalize_device_id(device_id),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into().trim().to_string();
        self.code = (!code.is_empty()).then_some(code);
        self
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Result of a sign-in attempt. A challenge is not a failure: the caller
/// asks for the second-factor code and retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(Account),
    ChallengeRequired(String),
    Failure(String),
}

#[async_trait::async_trait]
pub trait AuthClient: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> AuthOutcome;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthBody<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    device_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AuthReply {
    Ok {
        account: Account,
    },
    CodeRequired {
        #[serde(default)]
        message: Option<String>,
    },
    Failed {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// [`AuthClient`] posting credentials to a JSON sign-in endpoint.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAuthClient {
    pub fn new(endpoint: Url, settings: &BackendSettings) -> Result<Self, BackendError> {
        Ok(Self {
            client: settings.build_client()?,
            endpoint,
        })
    }

    async fn post(&self, request: &AuthRequest) -> Result<AuthOutcome, BackendError> {
        let body = AuthBody {
            email: &request.email,
            password: &request.password,
            code: request.code.as_deref(),
            device_id: &request.device_id,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(AuthOutcome::Failure("invalid credentials".to_string()));
        }
        if !status.is_success() {
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let reply: AuthReply = response.json().await.map_err(map_reqwest_error)?;
        Ok(match reply {
            AuthReply::Ok { mut account } => {
                if account.device_id.is_empty() {
                    account.device_id = request.device_id.clone();
                }
                AuthOutcome::Success(account)
            }
            AuthReply::CodeRequired { message } => AuthOutcome::ChallengeRequired(
                message.unwrap_or_else(|| "verification code required".to_string()),
            ),
            AuthReply::Failed { reason } => {
                AuthOutcome::Failure(reason.unwrap_or_else(|| "sign-in failed".to_string()))
            }
        })
    }
}

#[async_trait::async_trait]
impl AuthClient for HttpAuthClient {
    async fn authenticate(&self, request: &AuthRequest) -> AuthOutcome {
        match self.post(request).await {
            Ok(outcome) => {
                if let AuthOutcome::ChallengeRequired(_) = &outcome {
                    ts_info!("sign-in for {} needs a verification code", request.email);
                }
                outcome
            }
            Err(err) => {
                ts_warn!("sign-in request for {} failed: {}", request.email, err);
                AuthOutcome::Failure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_drops_whitespace_and_colons() {
        assert_eq!(normalize_device_id("AB12:34 56"), "AB123456");
        assert_eq!(normalize_device_id(" a:b:c\t"), "abc");
    }

    #[test]
    fn blank_code_is_ignored() {
        let request = AuthRequest::new("a@x.com", "pw", "AB12").with_code("  ");
        assert_eq!(request.code, None);
    }

    #[test]
    fn debug_output_hides_password() {
        let request = AuthRequest::new("a@x.com", "hunter2", "AB12");
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
