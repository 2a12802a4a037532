//! Taskdeck core: pure task-store state machine, reconciliation bookkeeping
//! and display helpers.
mod display;
mod effect;
mod error;
mod fingerprint;
mod msg;
mod reconcile;
mod state;
mod task;
mod update;
mod view_model;

pub use display::{account_label, task_rows, LabelMap, UNKNOWN_ACCOUNT_LABEL};
pub use effect::{Effect, TaskAction};
pub use error::{Operation, ServiceError, ServiceErrorKind, StoreError, StoreErrorKind};
pub use fingerprint::{AccountFingerprint, CanonicalKey, FingerprintSet};
pub use msg::Msg;
pub use reconcile::{PassId, PassOutcome, Reconciler};
pub use state::{RequestId, TaskStoreState};
pub use task::{DownloadTarget, DownloadTask, TaskId, TaskState};
pub use update::update;
pub use view_model::{TaskRowView, TaskStoreView};
