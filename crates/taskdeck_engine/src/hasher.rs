use std::collections::BTreeMap;
use std::fmt::Write;

use sha2::{Digest, Sha256};
use taskdeck_core::AccountFingerprint;
use thiserror::Error;

use crate::Account;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("account is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Computes account fingerprints. A suspension point for callers: they
/// await the result before using it.
#[async_trait::async_trait]
pub trait AccountHasher: Send + Sync {
    async fn fingerprint(&self, account: &Account) -> Result<AccountFingerprint, IdentityError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256AccountHasher;

#[async_trait::async_trait]
impl AccountHasher for Sha256AccountHasher {
    async fn fingerprint(&self, account: &Account) -> Result<AccountFingerprint, IdentityError> {
        fingerprint_account(account)
    }
}

/// Fingerprint over the identifying fields of `account` (email, dsid).
pub fn fingerprint_account(account: &Account) -> Result<AccountFingerprint, IdentityError> {
    let mut fields = BTreeMap::new();
    fields.insert("email", required("email", &account.email)?);
    fields.insert("dsid", required("dsid", &account.dsid)?);
    Ok(fingerprint_fields(&fields))
}

/// SHA-256 over `name=value` fields in name order, each part length-prefixed,
/// as 64 lowercase hex characters.
pub fn fingerprint_fields(fields: &BTreeMap<&str, &str>) -> AccountFingerprint {
    let mut hasher = Sha256::new();
    for (name, value) in fields {
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    AccountFingerprint::new(hex)
}

fn required<'a>(name: &'static str, value: &'a str) -> Result<&'a str, IdentityError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(IdentityError::MissingField(name))
    } else {
        Ok(trimmed)
    }
}
