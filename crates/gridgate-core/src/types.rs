//! Shared types used across gridgate crates.
//!
//! The descriptor is the single root; everything here is derived from it
//! by one compiler run and has no lifecycle outside that run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{TopologyError, TopologyResult};

// ── Descriptor enums ───────────────────────────────────────────────

/// Deployment platform. Exactly one is active per descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Managed container service: compute, routing and scaling are built here.
    ManagedContainer,
    /// Externally orchestrated cluster: only the shared substrate is exposed.
    ExternalCluster,
}

impl Platform {
    pub fn parse(s: &str) -> TopologyResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecs" | "managed" | "managed_container" => Ok(Platform::ManagedContainer),
            "eks" | "external" | "external_cluster" => Ok(Platform::ExternalCluster),
            "" => Err(TopologyError::configuration("platform is not set")),
            other => Err(TopologyError::configuration(format!(
                "unrecognized platform '{other}' (expected ecs or eks)"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::ManagedContainer => "ecs",
            Platform::ExternalCluster => "eks",
        }
    }
}

/// CPU architecture of the container tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86_64,
    Arm64,
}

impl Architecture {
    pub fn parse(s: &str) -> TopologyResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "x86_64" | "amd64" => Ok(Architecture::X86_64),
            "arm" | "arm64" | "aarch64" | "graviton" => Ok(Architecture::Arm64),
            other => Err(TopologyError::configuration(format!(
                "unsupported architecture '{other}'"
            ))),
        }
    }
}

// ── Routing ────────────────────────────────────────────────────────

/// HTTP request method matched by a route rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn parse(s: &str) -> TopologyResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(TopologyError::configuration(format!(
                "unknown HTTP method '{other}'"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire protocol of a listener, target group or health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

/// Health check bound 1:1 to a target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    pub port: u16,
    pub protocol: Protocol,
    /// Consecutive successes before a target is healthy.
    pub healthy_threshold: u32,
    /// Consecutive failures before a target is unhealthy.
    pub unhealthy_threshold: u32,
    pub timeout_secs: u64,
    pub interval_secs: u64,
}

/// A backend group a listener forwards matched traffic to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
    pub health_check: HealthCheck,
}

/// A compiled listener rule. Lower priority is evaluated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub name: String,
    pub priority: u32,
    pub path_patterns: Vec<String>,
    pub http_methods: BTreeSet<HttpMethod>,
    /// Name of the target group matched traffic is forwarded to.
    pub target_group: String,
}

// ── Network ────────────────────────────────────────────────────────

/// A directed ingress permission: `source_group` may reach `dest_group` on `port`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecurityEdge {
    pub source_group: String,
    pub dest_group: String,
    pub port: u16,
    pub description: String,
}

impl SecurityEdge {
    /// Identity of the permission; the description does not take part.
    pub fn permission_key(&self) -> String {
        format!("{}|{}|{}", self.dest_group, self.source_group, self.port)
    }
}

// ── Credentials ────────────────────────────────────────────────────

/// Pointer to one field of a secret held in the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub secret_id: String,
    pub field: String,
}

/// Placeholder substituted by the referenced secret field in a composite template.
pub const COMPOSITE_PLACEHOLDER: &str = "{secret}";

/// How the value of a credential field is obtained.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialField {
    /// Taken verbatim from the descriptor, possibly empty.
    Supplied(String),
    /// Generated once on first provisioning, never regenerated.
    Generated,
    /// Assembled from `template` by substituting the referenced secret field.
    Composite { template: String, reference: SecretRef },
}

impl CredentialField {
    pub fn is_generated(&self) -> bool {
        matches!(self, CredentialField::Generated)
    }

    fn view(&self) -> FieldView<'_> {
        match self {
            CredentialField::Supplied(value) => FieldView::Supplied {
                present: !value.is_empty(),
                digest: short_digest(value),
            },
            CredentialField::Generated => FieldView::Generated,
            CredentialField::Composite {
                template,
                reference,
            } => FieldView::Composite {
                template,
                reference,
            },
        }
    }
}

/// Serialized form of a credential field. Supplied values never leave the
/// process in plaintext; a digest is kept so plan fingerprints still move
/// when a key rotates.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FieldView<'a> {
    Supplied { present: bool, digest: String },
    Generated,
    Composite {
        template: &'a str,
        reference: &'a SecretRef,
    },
}

impl Serialize for CredentialField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

impl fmt::Debug for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialField::Supplied(value) => f
                .debug_struct("Supplied")
                .field("present", &!value.is_empty())
                .field("digest", &short_digest(value))
                .finish(),
            CredentialField::Generated => f.write_str("Generated"),
            CredentialField::Composite {
                template,
                reference,
            } => f
                .debug_struct("Composite")
                .field("template", template)
                .field("reference", reference)
                .finish(),
        }
    }
}

fn short_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..6])
}

/// A named bundle of secret fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSet {
    /// Secret id in the secret store (`{stack}/{name}`).
    pub name: String,
    pub fields: BTreeMap<String, CredentialField>,
    /// Actors allowed to set generated values.
    pub writers: Vec<String>,
}

impl CredentialSet {
    pub fn reference(&self, field: &str) -> SecretRef {
        SecretRef {
            secret_id: self.name.clone(),
            field: field.to_string(),
        }
    }

    pub fn generated_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.is_generated())
            .map(|(k, _)| k.as_str())
    }
}

// ── Scaling ────────────────────────────────────────────────────────

/// Utilization metric a scaling trigger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMetric {
    Cpu,
    Memory,
}

/// One target-tracking trigger acting on the shared capacity range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingTrigger {
    pub name: String,
    pub metric: ScalingMetric,
    pub target_percent: f64,
}

/// Capacity bounds plus the independent triggers converging on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalingPolicy {
    pub min_capacity: u32,
    pub desired_capacity: u32,
    pub max_capacity: u32,
    pub triggers: Vec<ScalingTrigger>,
}

impl AutoscalingPolicy {
    pub fn clamp(&self, count: u32) -> u32 {
        count.clamp(self.min_capacity, self.max_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parse() {
        assert_eq!(Platform::parse("ECS").unwrap(), Platform::ManagedContainer);
        assert_eq!(Platform::parse("eks").unwrap(), Platform::ExternalCluster);
        assert!(matches!(
            Platform::parse("nomad"),
            Err(TopologyError::Configuration(_))
        ));
        assert!(matches!(
            Platform::parse("  "),
            Err(TopologyError::Configuration(_))
        ));
    }

    #[test]
    fn architecture_parse() {
        assert_eq!(Architecture::parse("x86").unwrap(), Architecture::X86_64);
        assert_eq!(Architecture::parse("arm").unwrap(), Architecture::Arm64);
        assert!(Architecture::parse("sparc").is_err());
    }

    #[test]
    fn supplied_values_are_redacted() {
        let field = CredentialField::Supplied("sk-very-secret".to_string());
        let json = serde_json::to_string(&field).unwrap();
        assert!(!json.contains("sk-very-secret"));
        assert!(json.contains("\"present\":true"));
        assert!(!format!("{field:?}").contains("sk-very-secret"));
    }

    #[test]
    fn supplied_digest_tracks_value() {
        let a = serde_json::to_string(&CredentialField::Supplied("a".into())).unwrap();
        let b = serde_json::to_string(&CredentialField::Supplied("b".into())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn permission_key_ignores_description() {
        let a = SecurityEdge {
            source_group: "sg-a".into(),
            dest_group: "sg-b".into(),
            port: 5432,
            description: "one".into(),
        };
        let mut b = a.clone();
        b.description = "two".into();
        assert_eq!(a.permission_key(), b.permission_key());
    }

    #[test]
    fn policy_clamp() {
        let policy = AutoscalingPolicy {
            min_capacity: 1,
            desired_capacity: 1,
            max_capacity: 3,
            triggers: vec![],
        };
        assert_eq!(policy.clamp(0), 1);
        assert_eq!(policy.clamp(7), 3);
    }
}
