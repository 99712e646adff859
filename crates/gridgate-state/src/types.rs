//! Record types persisted by the provisioning backend.

use std::collections::BTreeMap;

use gridgate_core::{ResourceKind, SecretRef};
use serde::{Deserialize, Serialize};

/// A field value as held in the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredValue {
    Plain { value: String },
    /// Resolved on read by substituting the referenced field into `template`.
    Composite { template: String, reference: SecretRef },
}

/// A stored secret with its write grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: String,
    pub fields: BTreeMap<String, StoredValue>,
    /// Actors allowed to set generated fields.
    pub writers: Vec<String>,
}

/// A requested change to one field of a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWrite {
    /// Store `value` only when the field does not exist yet.
    IfAbsent(String),
    /// Store the value unconditionally.
    Overwrite(StoredValue),
}

/// Outcome of merging field writes into a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMergeReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

/// Outcome of synchronizing a listener's rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSyncReport {
    pub added: u32,
    pub replaced: u32,
    pub removed: u32,
    pub unchanged: u32,
}

impl RuleSyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.replaced == 0 && self.removed == 0
    }
}

/// An externally-owned resource the compiler may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResource {
    pub kind: ResourceKind,
    pub id: String,
}

impl ExternalResource {
    pub fn table_key(&self) -> String {
        inventory_key(self.kind, &self.id)
    }
}

pub(crate) fn inventory_key(kind: ResourceKind, id: &str) -> String {
    format!("{}/{}", kind.as_str(), id)
}

pub(crate) fn rule_key(listener: &str, priority: u32) -> String {
    format!("{listener}:{priority:05}")
}
