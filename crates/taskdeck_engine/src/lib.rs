//! Taskdeck engine: hashing, backend IO and the async containers that drive
//! the core state machine.
mod account;
mod accounts;
mod auth;
mod backend;
mod controller;
mod hasher;
mod http;
mod poll;
mod store;
mod wire;

pub use account::Account;
pub use accounts::{AccountRegistry, AuthError, SignInResult};
pub use auth::{normalize_device_id, AuthClient, AuthOutcome, AuthRequest, HttpAuthClient};
pub use backend::{BackendError, BackendSettings, TaskBackend};
pub use controller::{
    ReconcileOutcome, ReconcileReport, ReconciliationController, RejectedAccount,
};
pub use hasher::{
    fingerprint_account, fingerprint_fields, AccountHasher, IdentityError, Sha256AccountHasher,
};
pub use http::HttpTaskBackend;
pub use poll::spawn_poller;
pub use store::{OpStatus, TaskStore};
