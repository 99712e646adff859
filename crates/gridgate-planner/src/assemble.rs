//! Plan assembly: substrate, platform branch, resource inventory, tags,
//! outputs.

use gridgate_core::{DeploymentDescriptor, ResourceResolver, TopologyError, TopologyResult};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::outputs::collect_outputs;
use crate::plan::{HostedZone, PlatformPlan, ResourceRecord, SharedSubstrate, TopologyPlan};
use crate::selector::select_platform;
use crate::substrate::build_substrate;
use crate::tags::{TagSet, apply_tags};

/// Compile a descriptor into a plan. Nothing is written anywhere.
///
/// Every error except `Provisioning` surfaces here, so a plan that
/// compiles can be handed to `apply_plan`.
pub fn compile<R: ResourceResolver>(
    descriptor: &DeploymentDescriptor,
    resolver: &R,
) -> TopologyResult<TopologyPlan> {
    descriptor.validate()?;
    let stack = descriptor.stack.name.clone();

    let substrate = build_substrate(descriptor, resolver)?;
    let platform = select_platform(descriptor, &substrate, resolver)?;

    let mut resources = owned_resources(&substrate, &platform);
    apply_tags(&mut resources, &TagSet::for_stack(&stack));
    let outputs = collect_outputs(&substrate, &platform);

    info!(
        %stack,
        platform = platform.label(),
        resources = resources.len(),
        "plan compiled"
    );
    Ok(TopologyPlan {
        stack,
        substrate,
        platform,
        resources,
        outputs,
    })
}

/// Everything the plan creates. Referenced resources are not listed.
fn owned_resources(substrate: &SharedSubstrate, platform: &PlatformPlan) -> Vec<ResourceRecord> {
    let mut records = vec![
        ResourceRecord::new("bucket", &substrate.config_bucket.name),
        ResourceRecord::new("web_acl", &substrate.firewall.name),
    ];
    if let HostedZone::Private { name, .. } = &substrate.hosted_zone {
        records.push(ResourceRecord::new("hosted_zone", name));
    }
    for set in &substrate.credentials {
        records.push(ResourceRecord::new("secret", &set.name));
    }

    if let PlatformPlan::ManagedContainer(managed) = platform {
        records.push(ResourceRecord::new("cluster", &managed.cluster.name));
        records.push(ResourceRecord::new("task_definition", &managed.task.family));
        records.push(ResourceRecord::new("security_group", &managed.service.security_group));
        records.push(ResourceRecord::new("service", &managed.service.name));
        records.push(ResourceRecord::new("load_balancer", &managed.load_balancer.name));
        records.push(ResourceRecord::new(
            "listener",
            &managed.load_balancer.listener.name,
        ));
        for group in &managed.target_groups {
            records.push(ResourceRecord::new("target_group", &group.name));
        }
        records.push(ResourceRecord::new("scaling_policy", &managed.service.name));
    }
    records
}

impl TopologyPlan {
    /// Hex sha256 of the plan's JSON form.
    ///
    /// Supplied credentials contribute only their digest, so the
    /// fingerprint moves when a key rotates without exposing it.
    pub fn fingerprint(&self) -> TopologyResult<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| TopologyError::configuration(format!("cannot serialize plan: {e}")))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn to_json_pretty(&self) -> TopologyResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TopologyError::configuration(format!("cannot serialize plan: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::references;
    use gridgate_core::{Platform, StaticInventory};

    fn inventory(d: &DeploymentDescriptor) -> StaticInventory {
        let mut inv = StaticInventory::new();
        for (kind, id) in references(d) {
            inv.insert(kind, id);
        }
        inv
    }

    #[test]
    fn every_owned_resource_is_tagged() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let plan = compile(&d, &inventory(&d)).unwrap();
        assert!(!plan.resources.is_empty());
        for r in &plan.resources {
            assert_eq!(r.tags.get("project"), Some("llmgateway"), "{}", r.name);
            assert_eq!(r.tags.get("stack-id"), Some("gw"), "{}", r.name);
        }
    }

    #[test]
    fn external_inventory_has_no_compute() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ExternalCluster);
        let plan = compile(&d, &inventory(&d)).unwrap();
        let kinds: Vec<&str> = plan.resources.iter().map(|r| r.kind.as_str()).collect();
        for absent in ["cluster", "service", "listener", "target_group", "scaling_policy"] {
            assert!(!kinds.contains(&absent), "{absent}");
        }
        assert!(kinds.contains(&"secret"));
    }

    #[test]
    fn fingerprint_is_stable_and_tracks_supplied_keys() {
        let mut d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let inv = inventory(&d);
        let a = compile(&d, &inv).unwrap().fingerprint().unwrap();
        let b = compile(&d, &inv).unwrap().fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        d.credentials.insert("anthropic".to_string(), "rotated".to_string());
        let c = compile(&d, &inv).unwrap().fingerprint().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn oversized_task_is_rejected_not_panicking() {
        let mut d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        d.stack.vcpus = 3_000_000;
        assert!(matches!(
            compile(&d, &inventory(&d)),
            Err(TopologyError::Configuration(_))
        ));
    }

    #[test]
    fn invalid_descriptor_fails_before_resolution() {
        let mut d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        d.network.vpc_id = String::new();
        assert!(matches!(
            compile(&d, &StaticInventory::new()),
            Err(TopologyError::Configuration(_))
        ));
    }
}
