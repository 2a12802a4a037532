use crate::display::LabelMap;
use crate::{AccountFingerprint, CanonicalKey, FingerprintSet};

/// Generation of one reconciliation pass. Only the newest pass may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PassId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// A newer pass started; this result must not be applied.
    Stale,
    /// Same canonical set as last submitted; nothing to do.
    Unchanged,
    /// New set to submit, in account order without duplicates.
    Changed { fingerprints: Vec<AccountFingerprint> },
}

/// Bookkeeping for reconciling the account list with the task store.
///
/// Remembers only the canonical key of the last submitted set, never the
/// raw list.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    generation: PassId,
    last_key: Option<CanonicalKey>,
    labels: LabelMap,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a pass and supersedes every pass started before it.
    pub fn begin_pass(&mut self) -> PassId {
        self.generation = PassId(self.generation.0 + 1);
        self.generation
    }

    pub fn is_current(&self, pass: PassId) -> bool {
        self.generation == pass
    }

    /// Applies the fingerprints computed by `pass`.
    ///
    /// `pairs[i]` must hold the label and fingerprint of account `i`: pairing
    /// happens before anything is sorted, and the comparison key is built from
    /// a sorted copy so the ordered list stays untouched.
    pub fn finish_pass(
        &mut self,
        pass: PassId,
        pairs: Vec<(String, AccountFingerprint)>,
    ) -> PassOutcome {
        if !self.is_current(pass) {
            return PassOutcome::Stale;
        }

        let set = FingerprintSet::new(pairs.iter().map(|(_, fp)| fp.clone()));
        let key = set.canonical_key();
        if self.last_key.as_ref() == Some(&key) {
            return PassOutcome::Unchanged;
        }

        self.last_key = Some(key);
        self.labels = LabelMap::from_pairs(pairs);
        PassOutcome::Changed {
            fingerprints: set.as_slice().to_vec(),
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn last_key(&self) -> Option<&CanonicalKey> {
        self.last_key.as_ref()
    }
}
