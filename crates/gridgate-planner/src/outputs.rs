//! Named plan outputs, in the order they are reported.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::plan::{PlatformPlan, SharedSubstrate};

/// Ordered `name → value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutputs(Vec<(String, String)>);

impl PlanOutputs {
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PlanOutputs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outputs of a plan: branch-specific first, then the shared ones.
pub fn collect_outputs(substrate: &SharedSubstrate, platform: &PlatformPlan) -> PlanOutputs {
    let mut outputs = PlanOutputs::default();
    match platform {
        PlatformPlan::ExternalCluster(ext) => {
            outputs.push("ConfigBucketName", &substrate.config_bucket.name);
            outputs.push("ConfigBucketArn", substrate.config_bucket.arn());
            outputs.push("WafAclArn", substrate.firewall.arn());
            outputs.push("LiteLLMRepositoryUrl", &substrate.gateway_image.repository);
            outputs.push("MiddlewareRepositoryUrl", &substrate.middleware_image.repository);
            outputs.push("DatabaseUrlSecretArn", &ext.database_url_secret);
            outputs.push(
                "DatabaseMiddlewareUrlSecretArn",
                &ext.database_middleware_url_secret,
            );
            outputs.push("RedisUrl", &substrate.redis_url);
            outputs.push("LitellmMasterAndSaltKeySecretArn", &ext.master_and_salt_secret);
            outputs.push("DbSecurityGroupId", &ext.database_security_group);
            outputs.push("RedisSecurityGroupId", &ext.cache_security_group);
        }
        PlatformPlan::ManagedContainer(managed) => {
            outputs.push("LitellmEcsCluster", &managed.cluster.name);
            outputs.push("LitellmEcsTask", &managed.service.name);
        }
    }
    outputs.push("VpcId", &substrate.vpc_id);
    outputs.push("ServiceURL", &substrate.service_url);
    outputs
}
