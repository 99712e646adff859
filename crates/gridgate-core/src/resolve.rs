//! External resource resolution.
//!
//! The VPC, security groups, certificate, repositories and database
//! secrets are owned outside this system. The compiler only references
//! them, so every reference is checked against a `ResourceResolver`
//! before a plan is accepted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};

/// Kind of an externally-owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    SecurityGroup,
    Certificate,
    Repository,
    Secret,
    HostedZone,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Repository => "repository",
            ResourceKind::Secret => "secret",
            ResourceKind::HostedZone => "hosted_zone",
        }
    }

    pub fn parse(s: &str) -> TopologyResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "vpc" => Ok(ResourceKind::Vpc),
            "security_group" | "sg" => Ok(ResourceKind::SecurityGroup),
            "certificate" | "cert" => Ok(ResourceKind::Certificate),
            "repository" | "repo" => Ok(ResourceKind::Repository),
            "secret" => Ok(ResourceKind::Secret),
            "hosted_zone" | "zone" => Ok(ResourceKind::HostedZone),
            other => Err(TopologyError::configuration(format!(
                "unknown resource kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Vpc => "VPC",
            ResourceKind::SecurityGroup => "security group",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Repository => "repository",
            ResourceKind::Secret => "secret",
            ResourceKind::HostedZone => "hosted zone",
        };
        f.write_str(label)
    }
}

/// Looks up externally-owned resources by identifier.
pub trait ResourceResolver {
    /// Whether a resource of `kind` with `id` exists.
    fn contains(&self, kind: ResourceKind, id: &str) -> TopologyResult<bool>;

    /// Fail with `TopologyError::Reference` unless the resource exists.
    fn require(&self, kind: ResourceKind, id: &str) -> TopologyResult<()> {
        if self.contains(kind, id)? {
            Ok(())
        } else {
            Err(TopologyError::reference(kind, id))
        }
    }
}

impl<R: ResourceResolver + ?Sized> ResourceResolver for &R {
    fn contains(&self, kind: ResourceKind, id: &str) -> TopologyResult<bool> {
        (**self).contains(kind, id)
    }
}

/// Fixed in-memory inventory of known resources.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    entries: BTreeSet<(ResourceKind, String)>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ResourceKind, id: impl Into<String>) -> Self {
        self.insert(kind, id);
        self
    }

    pub fn insert(&mut self, kind: ResourceKind, id: impl Into<String>) {
        self.entries.insert((kind, id.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceResolver for StaticInventory {
    fn contains(&self, kind: ResourceKind, id: &str) -> TopologyResult<bool> {
        Ok(self.entries.contains(&(kind, id.to_string())))
    }
}
