use std::collections::HashMap;

use crate::view_model::{TaskRowView, TaskStoreView};
use crate::AccountFingerprint;

/// Shown for tasks whose owning account is no longer configured.
pub const UNKNOWN_ACCOUNT_LABEL: &str = "unknown account";

/// Fingerprint -> human-readable account label (the account email).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelMap {
    labels: HashMap<AccountFingerprint, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from already-paired entries; the first label for a
    /// fingerprint wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, AccountFingerprint)>) -> Self {
        let mut labels = HashMap::new();
        for (label, fingerprint) in pairs {
            labels.entry(fingerprint).or_insert(label);
        }
        Self { labels }
    }

    pub fn get(&self, fingerprint: &AccountFingerprint) -> Option<&str> {
        self.labels.get(fingerprint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountFingerprint, &str)> {
        self.labels.iter().map(|(fp, label)| (fp, label.as_str()))
    }
}

/// Label for a task owner, degrading to [`UNKNOWN_ACCOUNT_LABEL`].
pub fn account_label<'a>(owner: &AccountFingerprint, labels: &'a LabelMap) -> &'a str {
    labels.get(owner).unwrap_or(UNKNOWN_ACCOUNT_LABEL)
}

pub fn task_rows(view: &TaskStoreView, labels: &LabelMap) -> Vec<TaskRowView> {
    view.tasks
        .iter()
        .map(|task| TaskRowView {
            task_id: task.id.clone(),
            account_label: account_label(&task.owner, labels).to_string(),
            owner_known: labels.get(&task.owner).is_some(),
            title: task.target.title.clone(),
            state: task.state.clone(),
            progress: task.progress,
            error: task.error().map(ToOwned::to_owned),
        })
        .collect()
}
