//! Type admission policy
//!
//! A policy is the allow-list the generic object serializer consults before
//! encoding or decoding a composite type. Built-in serializers and native
//! primitives/collections are never gated.
//!
//! Policies are append-only. Each policy carries a process-unique
//! [`PolicyId`] that, together with the resolution scope, keys the factory
//! cache.

use crate::error::{Result, SerializationError};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_POLICY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique policy identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyId(u64);

impl PolicyId {
    fn next() -> Self {
        PolicyId(NEXT_POLICY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy#{}", self.0)
    }
}

/// Whether a policy checks its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Only listed types are admitted
    Listed,
    /// Every type is admitted; used for checkpoints, which must capture any
    /// in-flight value
    AdmitAll,
}

/// Append-only allow-list of portable type names
#[derive(Debug)]
pub struct AdmissionPolicy {
    id: PolicyId,
    mode: AdmissionMode,
    admitted: RwLock<BTreeSet<String>>,
}

impl AdmissionPolicy {
    /// Empty listed policy
    pub fn new() -> Self {
        AdmissionPolicy {
            id: PolicyId::next(),
            mode: AdmissionMode::Listed,
            admitted: RwLock::new(BTreeSet::new()),
        }
    }

    /// Policy that admits every type
    pub fn admit_all() -> Self {
        AdmissionPolicy {
            mode: AdmissionMode::AdmitAll,
            ..AdmissionPolicy::new()
        }
    }

    /// Identity used for factory caching
    pub fn id(&self) -> PolicyId {
        self.id
    }

    /// Admission mode
    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    /// Admit a batch of types
    ///
    /// All-or-nothing: fails with [`SerializationError::DuplicateAdmission`]
    /// if the batch repeats a name or any name is already admitted, and in
    /// that case nothing is added.
    pub fn admit<I, S>(&self, types: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let batch = unique_batch(types)?;
        let mut admitted = self.admitted.write();
        let clashes: Vec<String> = batch
            .iter()
            .filter(|name| admitted.contains(*name))
            .cloned()
            .collect();
        if !clashes.is_empty() {
            return Err(SerializationError::DuplicateAdmission { types: clashes });
        }
        debug!(policy = %self.id, count = batch.len(), "admitting types");
        admitted.extend(batch);
        Ok(())
    }

    /// Merge a batch, skipping names that are already admitted
    ///
    /// Used when registration runs again against a cached factory. A batch
    /// that repeats a name is still rejected. Returns how many names were new.
    pub fn admit_missing<I, S>(&self, types: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let batch = unique_batch(types)?;
        let mut admitted = self.admitted.write();
        let before = admitted.len();
        admitted.extend(batch);
        Ok(admitted.len() - before)
    }

    /// True if the generic serializer may handle `type_name`
    pub fn is_admitted(&self, type_name: &str) -> bool {
        match self.mode {
            AdmissionMode::AdmitAll => true,
            AdmissionMode::Listed => self.admitted.read().contains(type_name),
        }
    }

    /// Number of listed types
    pub fn len(&self) -> usize {
        self.admitted.read().len()
    }

    /// True if nothing is listed
    pub fn is_empty(&self) -> bool {
        self.admitted.read().is_empty()
    }

    /// Snapshot of the listed names, sorted
    pub fn admitted_types(&self) -> Vec<String> {
        self.admitted.read().iter().cloned().collect()
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_batch<I, S>(types: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let batch: Vec<String> = types.into_iter().map(Into::into).collect();
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for name in &batch {
        if !seen.insert(name.as_str()) {
            repeated.insert(name.clone());
        }
    }
    if repeated.is_empty() {
        Ok(batch)
    } else {
        Err(SerializationError::DuplicateAdmission {
            types: repeated.into_iter().collect(),
        })
    }
}
