//! Cross-cutting tags, stamped once at plan assembly.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::plan::ResourceRecord;

pub const PROJECT_TAG: &str = "project";
pub const PROJECT_VALUE: &str = "llmgateway";
pub const STACK_TAG: &str = "stack-id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    /// The tags every resource of `stack` carries.
    pub fn for_stack(stack: &str) -> Self {
        let mut tags = Self::default();
        tags.insert(PROJECT_TAG, PROJECT_VALUE);
        tags.insert(STACK_TAG, stack);
        tags
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Add every tag of `other` not already set here.
    pub fn merge_missing(&mut self, other: &TagSet) {
        for (k, v) in &other.0 {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stamp `tags` onto every resource. Tags already on a resource win.
pub fn apply_tags(resources: &mut [ResourceRecord], tags: &TagSet) {
    for record in resources {
        record.tags.merge_missing(tags);
    }
}
