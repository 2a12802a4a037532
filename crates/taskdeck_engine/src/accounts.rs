use std::sync::Arc;

use taskdeck_logging::{ts_info, ts_warn};
use thiserror::Error;
use tokio::sync::watch;

use crate::{fingerprint_account, Account, AuthClient, AuthOutcome, AuthRequest, IdentityError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("sign-in returned an incomplete account: {0}")]
    Incomplete(#[from] IdentityError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    /// Account added, or an existing entry with the same email replaced.
    Added(Account),
    /// Ask the user for the second-factor code and sign in again with it.
    CodeRequired(String),
}

/// Live list of linked accounts.
///
/// Every change publishes a fresh `Arc<[Account]>`; lists are never edited
/// in place, so subscribers can detect changes by reference.
#[derive(Clone)]
pub struct AccountRegistry {
    auth: Arc<dyn AuthClient>,
    accounts_tx: Arc<watch::Sender<Arc<[Account]>>>,
}

impl AccountRegistry {
    pub fn new(auth: Arc<dyn AuthClient>, initial: Vec<Account>) -> Self {
        let (accounts_tx, _) = watch::channel(Arc::from(initial));
        Self {
            auth,
            accounts_tx: Arc::new(accounts_tx),
        }
    }

    pub fn accounts(&self) -> Arc<[Account]> {
        self.accounts_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<[Account]>> {
        self.accounts_tx.subscribe()
    }

    pub async fn sign_in(&self, request: AuthRequest) -> Result<SignInResult, AuthError> {
        match self.auth.authenticate(&request).await {
            AuthOutcome::Success(account) => {
                fingerprint_account(&account)?;
                ts_info!("signed in {}", account.email);
                self.upsert(account.clone());
                Ok(SignInResult::Added(account))
            }
            AuthOutcome::ChallengeRequired(message) => Ok(SignInResult::CodeRequired(message)),
            AuthOutcome::Failure(reason) => {
                ts_warn!("sign-in for {} rejected: {}", request.email, reason);
                Err(AuthError::Rejected(reason))
            }
        }
    }

    /// Removes the account with `email`; false when there was none.
    pub fn remove(&self, email: &str) -> bool {
        self.accounts_tx.send_if_modified(|current| {
            if !current.iter().any(|account| account.email == email) {
                return false;
            }
            let next: Vec<Account> = current
                .iter()
                .filter(|account| account.email != email)
                .cloned()
                .collect();
            *current = Arc::from(next);
            true
        })
    }

    pub fn replace_all(&self, accounts: Vec<Account>) {
        self.accounts_tx.send_replace(Arc::from(accounts));
    }

    /// Runs under the channel's write lock.
    fn upsert(&self, account: Account) {
        self.accounts_tx.send_modify(|current| {
            let mut next: Vec<Account> = current.iter().cloned().collect();
            match next.iter_mut().find(|existing| existing.email == account.email) {
                Some(existing) => *existing = account,
                None => next.push(account),
            }
            *current = Arc::from(next);
        });
    }
}
