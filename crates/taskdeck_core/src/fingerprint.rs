use std::collections::HashSet;
use std::fmt;

/// Opaque, deterministic digest of one account's identifying fields.
///
/// Fingerprints are keys, not secrets: they are logged and sent to the
/// backend in the clear.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountFingerprint(String);

impl AccountFingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for AccountFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountFingerprint {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Order-independent comparison key of a fingerprint set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// De-duplicated fingerprints of all configured accounts.
///
/// Keeps the submission order (first occurrence wins); equality goes
/// through [`FingerprintSet::canonical_key`] so reordering is not a change.
#[derive(Debug, Clone, Default)]
pub struct FingerprintSet {
    ordered: Vec<AccountFingerprint>,
}

impl FingerprintSet {
    pub fn new(fingerprints: impl IntoIterator<Item = AccountFingerprint>) -> Self {
        let mut seen = HashSet::new();
        let ordered = fingerprints
            .into_iter()
            .filter(|fp| seen.insert(fp.clone()))
            .collect();
        Self { ordered }
    }

    pub fn as_slice(&self) -> &[AccountFingerprint] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, fingerprint: &AccountFingerprint) -> bool {
        self.ordered.iter().any(|fp| fp == fingerprint)
    }

    /// Builds the comparison key from a sorted copy; the ordered list is left as is.
    pub fn canonical_key(&self) -> CanonicalKey {
        let mut sorted: Vec<&str> = self.ordered.iter().map(AccountFingerprint::as_str).collect();
        sorted.sort_unstable();
        CanonicalKey(sorted.join(","))
    }
}

impl PartialEq for FingerprintSet {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for FingerprintSet {}
