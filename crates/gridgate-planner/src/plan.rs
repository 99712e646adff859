//! Plan data model.
//!
//! A `TopologyPlan` is the fully materialized output of one compile run.
//! The platform branch is a tagged enum, so fields owned by the branch
//! that was not chosen do not exist in the plan at all.

use std::collections::BTreeMap;

use gridgate_core::{
    Architecture, AutoscalingPolicy, CredentialSet, SecretRef, SecurityEdge, TargetGroup,
};
use gridgate_routing::Listener;
use serde::Serialize;

use crate::outputs::PlanOutputs;
use crate::tags::TagSet;

/// The compiled deployment topology.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyPlan {
    pub stack: String,
    pub substrate: SharedSubstrate,
    pub platform: PlatformPlan,
    /// Every resource this plan creates, with the tags stamped on it.
    pub resources: Vec<ResourceRecord>,
    pub outputs: PlanOutputs,
}

impl TopologyPlan {
    pub fn managed(&self) -> Option<&ManagedContainerPlan> {
        match &self.platform {
            PlatformPlan::ManagedContainer(plan) => Some(plan),
            PlatformPlan::ExternalCluster(_) => None,
        }
    }

    pub fn external(&self) -> Option<&ExternalClusterPlan> {
        match &self.platform {
            PlatformPlan::ExternalCluster(plan) => Some(plan),
            PlatformPlan::ManagedContainer(_) => None,
        }
    }
}

/// Platform-specific half of the plan.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformPlan {
    ManagedContainer(ManagedContainerPlan),
    ExternalCluster(ExternalClusterPlan),
}

impl PlatformPlan {
    pub fn label(&self) -> &'static str {
        match self {
            PlatformPlan::ManagedContainer(_) => "ecs",
            PlatformPlan::ExternalCluster(_) => "eks",
        }
    }
}

// ── Shared substrate ───────────────────────────────────────────────

/// Resources and references common to both platforms.
#[derive(Debug, Clone, Serialize)]
pub struct SharedSubstrate {
    pub vpc_id: String,
    pub hosted_zone: HostedZone,
    pub certificate_arn: String,
    pub config_bucket: ConfigBucket,
    pub firewall: FirewallAcl,
    pub gateway_image: ImageRef,
    pub middleware_image: ImageRef,
    pub credentials: Vec<CredentialSet>,
    pub redis_url: String,
    pub service_url: String,
}

impl SharedSubstrate {
    /// Credential set by its short name (`master-and-salt`, ...).
    pub fn credential_set(&self, name: &str) -> Option<&CredentialSet> {
        let suffix = format!("/{name}");
        self.credentials.iter().find(|s| s.name.ends_with(&suffix))
    }
}

/// Hosted zone the service record lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostedZone {
    /// Existing public zone, looked up by name.
    Public { name: String },
    /// Private zone created by the plan and attached to the VPC.
    Private { name: String, vpc_id: String },
}

impl HostedZone {
    pub fn name(&self) -> &str {
        match self {
            HostedZone::Public { name } | HostedZone::Private { name, .. } => name,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, HostedZone::Private { .. })
    }
}

/// Bucket holding the gateway's `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigBucket {
    pub name: String,
    pub object_key: String,
    pub encryption: String,
}

impl ConfigBucket {
    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }
}

/// Regional web firewall attached to the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallAcl {
    pub name: String,
    pub scope: String,
    pub default_action: FirewallAction,
    pub rules: Vec<ManagedRuleGroup>,
}

impl FirewallAcl {
    /// Regional web ACL identifier, resolved to the account and region
    /// the plan is applied in.
    pub fn arn(&self) -> String {
        format!("arn:aws:wafv2:::{}/webacl/{}", self.scope.to_ascii_lowercase(), self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallAction {
    Allow,
    Block,
}

/// A vendor-managed rule group reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedRuleGroup {
    pub name: String,
    pub priority: u32,
    pub vendor: String,
    pub group: String,
    pub excluded_rules: Vec<String>,
}

/// Container image in an externally-owned repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn uri(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

// ── Managed container branch ───────────────────────────────────────

/// Compute, routing and scaling for the managed container service.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedContainerPlan {
    pub cluster: Cluster,
    pub task: TaskDefinition,
    pub service: ServicePlan,
    pub load_balancer: LoadBalancer,
    pub target_groups: Vec<TargetGroup>,
    pub edges: Vec<SecurityEdge>,
    pub scaling: AutoscalingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub name: String,
    pub container_insights: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDefinition {
    pub family: String,
    pub cpu_units: u32,
    pub memory_mib: u32,
    pub architecture: Architecture,
    pub os_family: String,
    pub task_role: Vec<PolicyStatement>,
    pub containers: Vec<ContainerSpec>,
}

impl TaskDefinition {
    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }
}

/// One allow statement on the task role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: ImageRef,
    pub port: u16,
    pub log_stream_prefix: String,
    /// Variables injected from the secret store, by reference.
    pub secrets: BTreeMap<String, SecretRef>,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePlan {
    pub name: String,
    pub cluster: String,
    pub desired_count: u32,
    pub health_check_grace_secs: u64,
    pub security_group: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadBalancer {
    pub name: String,
    pub internet_facing: bool,
    pub domain_name: String,
    pub listener: Listener,
    pub firewall_acl: String,
}

// ── External cluster branch ────────────────────────────────────────

/// References handed to the external orchestrator. Nothing is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalClusterPlan {
    pub database_url_secret: String,
    pub database_middleware_url_secret: String,
    pub master_and_salt_secret: String,
    pub database_security_group: String,
    pub cache_security_group: String,
}

// ── Resource inventory ─────────────────────────────────────────────

/// A resource the plan creates, as seen by the tagging decorator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub kind: String,
    pub name: String,
    pub tags: TagSet,
}

impl ResourceRecord {
    pub fn new(kind: &str, name: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.into(),
            tags: TagSet::default(),
        }
    }
}
