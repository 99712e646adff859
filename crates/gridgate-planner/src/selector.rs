//! Platform selection.

use gridgate_core::{
    DeploymentDescriptor, Platform, ResourceKind, ResourceResolver, TopologyResult,
};
use gridgate_secrets::provisioner::{DATABASE_MIDDLEWARE_URL, DATABASE_URL, MASTER_AND_SALT};
use gridgate_secrets::secret_id;
use tracing::info;

use crate::compute::build_managed;
use crate::plan::{ExternalClusterPlan, PlatformPlan, SharedSubstrate};

/// Build the sub-plan of the platform the descriptor selects.
///
/// An unset or unrecognized platform is a configuration error. The
/// external cluster branch only exposes references; nothing is placed.
pub fn select_platform<R: ResourceResolver>(
    descriptor: &DeploymentDescriptor,
    substrate: &SharedSubstrate,
    resolver: &R,
) -> TopologyResult<PlatformPlan> {
    let platform = descriptor.platform()?;
    info!(stack = %descriptor.stack.name, platform = platform.label(), "platform selected");

    match platform {
        Platform::ManagedContainer => Ok(PlatformPlan::ManagedContainer(build_managed(
            descriptor, substrate, resolver,
        )?)),
        Platform::ExternalCluster => {
            let database_security_group = descriptor.databases.gateway.security_group_id.clone();
            let cache_security_group = descriptor.cache.security_group_id.clone();
            resolver.require(ResourceKind::SecurityGroup, &database_security_group)?;
            resolver.require(ResourceKind::SecurityGroup, &cache_security_group)?;

            let stack = &descriptor.stack.name;
            Ok(PlatformPlan::ExternalCluster(ExternalClusterPlan {
                database_url_secret: secret_id(stack, DATABASE_URL),
                database_middleware_url_secret: secret_id(stack, DATABASE_MIDDLEWARE_URL),
                master_and_salt_secret: secret_id(stack, MASTER_AND_SALT),
                database_security_group,
                cache_security_group,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{build_substrate, references};
    use gridgate_core::{StaticInventory, TopologyError};

    fn inventory(d: &DeploymentDescriptor) -> StaticInventory {
        let mut inv = StaticInventory::new();
        for (kind, id) in references(d) {
            inv.insert(kind, id);
        }
        inv
    }

    #[test]
    fn unset_platform_is_configuration_error() {
        let mut d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let inv = inventory(&d);
        let substrate = build_substrate(&d, &inv).unwrap();
        d.stack.platform = None;
        assert!(matches!(
            select_platform(&d, &substrate, &inv),
            Err(TopologyError::Configuration(_))
        ));
        d.stack.platform = Some("nomad".to_string());
        assert!(matches!(
            select_platform(&d, &substrate, &inv),
            Err(TopologyError::Configuration(_))
        ));
    }

    #[test]
    fn external_branch_exposes_references_only() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ExternalCluster);
        let inv = inventory(&d);
        let substrate = build_substrate(&d, &inv).unwrap();
        let plan = select_platform(&d, &substrate, &inv).unwrap();

        let PlatformPlan::ExternalCluster(ext) = plan else {
            panic!("expected external cluster plan");
        };
        assert_eq!(ext.master_and_salt_secret, "gw/master-and-salt");
        assert_eq!(ext.database_security_group, "sg-database");
        assert_eq!(ext.cache_security_group, "sg-cache");
    }

    #[test]
    fn managed_branch_selected() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ManagedContainer);
        let inv = inventory(&d);
        let substrate = build_substrate(&d, &inv).unwrap();
        let plan = select_platform(&d, &substrate, &inv).unwrap();
        assert_eq!(plan.label(), "ecs");
    }
}
