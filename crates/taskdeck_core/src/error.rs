use std::fmt;

use crate::{AccountFingerprint, TaskId};

/// Why a backend call did not succeed. A call that never completed
/// (timeout, cancellation) is a failure like any other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Network,
    Timeout,
    HttpStatus(u16),
    NotFound,
    InvalidResponse,
    Cancelled,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorKind::Network => write!(f, "network error"),
            ServiceErrorKind::Timeout => write!(f, "timeout"),
            ServiceErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ServiceErrorKind::NotFound => write!(f, "not found"),
            ServiceErrorKind::InvalidResponse => write!(f, "invalid response"),
            ServiceErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The five task commands, used to tag errors and completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Start,
    Pause,
    Resume,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Fetch => "fetch",
            Operation::Start => "start",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// User-visible error held in the store state; never thrown across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub op: Operation,
    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(op: Operation, kind: StoreErrorKind) -> Self {
        Self { op, kind }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
    Service(ServiceError),
    UnknownTask(TaskId),
    UnknownAccount(AccountFingerprint),
    InvalidTransition { task_id: TaskId, from: &'static str },
    ShutDown,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::Service(err) => write!(f, "{err}"),
            StoreErrorKind::UnknownTask(id) => write!(f, "no task with id {id}"),
            StoreErrorKind::UnknownAccount(owner) => {
                write!(f, "account {} is not configured", owner.short())
            }
            StoreErrorKind::InvalidTransition { task_id, from } => {
                write!(f, "task {task_id} cannot change state while {from}")
            }
            StoreErrorKind::ShutDown => write!(f, "task store is shut down"),
        }
    }
}
