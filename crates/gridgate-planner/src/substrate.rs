//! Shared substrate: the part of the plan both platforms get.

use gridgate_core::{DeploymentDescriptor, ResourceKind, ResourceResolver, TopologyResult};
use gridgate_secrets::provision;
use tracing::debug;

use crate::plan::{
    ConfigBucket, FirewallAcl, FirewallAction, HostedZone, ImageRef, ManagedRuleGroup,
    SharedSubstrate,
};

pub const CONFIG_OBJECT_KEY: &str = "config.yaml";

/// Every externally-owned resource a descriptor references.
///
/// The public hosted zone is only referenced for public deployments; a
/// private deployment creates its own zone.
pub fn references(descriptor: &DeploymentDescriptor) -> Vec<(ResourceKind, String)> {
    let mut refs = vec![
        (ResourceKind::Vpc, descriptor.network.vpc_id.clone()),
        (ResourceKind::Certificate, descriptor.stack.certificate_arn.clone()),
        (ResourceKind::Repository, descriptor.images.gateway_repository.clone()),
        (ResourceKind::Repository, descriptor.images.middleware_repository.clone()),
    ];
    if descriptor.stack.public {
        refs.push((ResourceKind::HostedZone, descriptor.stack.hosted_zone_name.clone()));
    }
    for (_, tier) in descriptor.databases.tiers() {
        refs.push((ResourceKind::Secret, tier.secret_arn.clone()));
        refs.push((ResourceKind::SecurityGroup, tier.security_group_id.clone()));
    }
    refs.push((
        ResourceKind::SecurityGroup,
        descriptor.cache.security_group_id.clone(),
    ));

    let mut unique = Vec::with_capacity(refs.len());
    for r in refs {
        if !unique.contains(&r) {
            unique.push(r);
        }
    }
    unique
}

/// Lowercase, dash-separated resource name derived from the stack name.
pub fn resource_name(stack: &str, suffix: &str) -> String {
    let base: String = stack
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{}-{suffix}", base.trim_matches('-'))
}

fn common_rule_set() -> ManagedRuleGroup {
    ManagedRuleGroup {
        name: "AWS-AWSManagedRulesCommonRuleSet".to_string(),
        priority: 1,
        vendor: "AWS".to_string(),
        group: "AWSManagedRulesCommonRuleSet".to_string(),
        excluded_rules: vec![
            "NoUserAgent_HEADER".to_string(),
            "SizeRestrictions_BODY".to_string(),
        ],
    }
}

/// Resolve the shared references and derive the substrate.
///
/// Security groups are not checked here; whichever branch uses them
/// resolves them.
pub fn build_substrate<R: ResourceResolver>(
    descriptor: &DeploymentDescriptor,
    resolver: &R,
) -> TopologyResult<SharedSubstrate> {
    for (kind, id) in references(descriptor) {
        if kind != ResourceKind::SecurityGroup {
            resolver.require(kind, &id)?;
        }
    }

    let stack = &descriptor.stack;
    let hosted_zone = if stack.public {
        HostedZone::Public {
            name: stack.hosted_zone_name.clone(),
        }
    } else {
        HostedZone::Private {
            name: stack.hosted_zone_name.clone(),
            vpc_id: descriptor.network.vpc_id.clone(),
        }
    };

    let substrate = SharedSubstrate {
        vpc_id: descriptor.network.vpc_id.clone(),
        hosted_zone,
        certificate_arn: stack.certificate_arn.clone(),
        config_bucket: ConfigBucket {
            name: resource_name(&stack.name, "config"),
            object_key: CONFIG_OBJECT_KEY.to_string(),
            encryption: "S3_MANAGED".to_string(),
        },
        firewall: FirewallAcl {
            name: resource_name(&stack.name, "waf"),
            scope: "REGIONAL".to_string(),
            default_action: FirewallAction::Allow,
            rules: vec![common_rule_set()],
        },
        gateway_image: ImageRef {
            repository: descriptor.images.gateway_repository.clone(),
            tag: descriptor.images.gateway_version.clone(),
        },
        middleware_image: ImageRef {
            repository: descriptor.images.middleware_repository.clone(),
            tag: descriptor.images.middleware_version.clone(),
        },
        credentials: provision(descriptor),
        redis_url: descriptor.redis_url(),
        service_url: descriptor.service_url(),
    };
    debug!(
        stack = %stack.name,
        private_zone = substrate.hosted_zone.is_private(),
        "shared substrate built"
    );
    Ok(substrate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridgate_core::{Platform, StaticInventory, TopologyError};

    fn inventory(d: &DeploymentDescriptor) -> StaticInventory {
        let mut inv = StaticInventory::new();
        for (kind, id) in references(d) {
            inv.insert(kind, id);
        }
        inv
    }

    #[test]
    fn private_deployment_creates_zone_in_vpc() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let s = build_substrate(&d, &inventory(&d)).unwrap();
        assert_eq!(
            s.hosted_zone,
            HostedZone::Private {
                name: "example.com".to_string(),
                vpc_id: "vpc-00000000".to_string(),
            }
        );
        assert!(!references(&d).iter().any(|(k, _)| *k == ResourceKind::HostedZone));
    }

    #[test]
    fn public_deployment_requires_existing_zone() {
        let mut d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        d.stack.public = true;
        let mut inv = inventory(&d);
        let s = build_substrate(&d, &inv).unwrap();
        assert!(!s.hosted_zone.is_private());

        inv = StaticInventory::new();
        for (kind, id) in references(&d) {
            if kind != ResourceKind::HostedZone {
                inv.insert(kind, id);
            }
        }
        let err = build_substrate(&d, &inv).unwrap_err();
        assert_eq!(
            err,
            TopologyError::Reference {
                kind: ResourceKind::HostedZone,
                id: "example.com".to_string()
            }
        );
    }

    #[test]
    fn missing_vpc_is_reference_error() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let err = build_substrate(&d, &StaticInventory::new()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Reference {
                kind: ResourceKind::Vpc,
                ..
            }
        ));
    }

    #[test]
    fn firewall_excludes_two_common_rules() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ExternalCluster);
        let s = build_substrate(&d, &inventory(&d)).unwrap();
        assert_eq!(s.firewall.scope, "REGIONAL");
        assert_eq!(s.firewall.default_action, FirewallAction::Allow);
        assert_eq!(s.firewall.rules.len(), 1);
        assert_eq!(s.firewall.rules[0].priority, 1);
        assert_eq!(
            s.firewall.rules[0].excluded_rules,
            vec!["NoUserAgent_HEADER", "SizeRestrictions_BODY"]
        );
    }

    #[test]
    fn shared_groups_listed_once() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let groups: Vec<_> = references(&d)
            .into_iter()
            .filter(|(k, _)| *k == ResourceKind::SecurityGroup)
            .collect();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn resource_names_are_normalized() {
        assert_eq!(resource_name("My Stack_1", "config"), "my-stack-1-config");
        assert_eq!(resource_name("gw", "waf"), "gw-waf");
    }
}
