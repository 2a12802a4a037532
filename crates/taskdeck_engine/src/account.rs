use std::fmt;

use serde::{Deserialize, Serialize};

/// A linked account as produced by sign-in.
///
/// Only `email` and `dsid` identify the account; the token and device id may
/// change without changing its fingerprint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    /// Directory services id assigned by the account provider.
    pub dsid: String,
    #[serde(default)]
    pub password_token: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Account {
    pub fn new(email: impl Into<String>, dsid: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            dsid: dsid.into(),
            password_token: String::new(),
            device_id: String::new(),
            display_name: None,
        }
    }

    pub fn with_password_token(mut self, token: impl Into<String>) -> Self {
        self.password_token = token.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("dsid", &self.dsid)
            .field("password_token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("display_name", &self.display_name)
            .finish()
    }
}
