//! gridgate.toml descriptor parser.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::provider::{PROVIDERS, env_var_for};
use crate::types::{Architecture, Platform};

/// Declarative description of one gateway deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub stack: StackConfig,
    pub network: NetworkConfig,
    pub images: ImagesConfig,
    pub databases: DatabasesConfig,
    pub cache: CacheConfig,
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub buckets: BucketsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Provider id → API key. Missing and empty keys are both provisioned as empty.
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    /// Explicit listener rules. The built-in rule set is used when absent.
    #[serde(default)]
    pub routes: Option<Vec<RouteConfig>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    pub name: String,
    /// "ecs" or "eks".
    pub platform: Option<String>,
    #[serde(default)]
    pub public: bool,
    pub domain_name: String,
    pub hosted_zone_name: String,
    pub certificate_arn: String,
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default = "default_vcpus")]
    pub vcpus: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub vpc_id: String,
    #[serde(default)]
    pub disable_outbound_network_access: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub gateway_repository: String,
    pub middleware_repository: String,
    #[serde(default = "default_tag")]
    pub gateway_version: String,
    #[serde(default = "default_tag")]
    pub middleware_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabasesConfig {
    pub gateway: DatabaseTier,
    pub middleware: DatabaseTier,
}

impl DatabasesConfig {
    /// Both tiers, in a fixed order.
    pub fn tiers(&self) -> [(&'static str, &DatabaseTier); 2] {
        [("gateway", &self.gateway), ("middleware", &self.middleware)]
    }
}

/// An externally-owned Postgres tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTier {
    pub hostname: String,
    /// Secret holding the tier's generated `password` field.
    pub secret_arn: String,
    pub security_group_id: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    pub user: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub hostname: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    pub security_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub min: u32,
    pub max: u32,
    pub desired: u32,
    pub cpu_target_percent: f64,
    pub memory_target_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketsConfig {
    pub log_bucket_arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub langsmith_project: Option<String>,
    pub langsmith_default_run_name: Option<String>,
}

/// One listener rule as written in the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub priority: u32,
    pub paths: Vec<String>,
    pub methods: Vec<String>,
    /// Target group name ("gateway" or "middleware").
    pub target: String,
}

fn default_architecture() -> String {
    "x86".to_string()
}

/// Largest task size the managed container service accepts.
pub const MAX_VCPUS: u32 = 16;

fn default_vcpus() -> u32 {
    1
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_redis_port() -> u16 {
    6379
}

impl DeploymentDescriptor {
    pub fn from_file(path: &Path) -> TopologyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TopologyError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let descriptor = Self::from_toml_str(&content)?;
        debug!(?path, stack = %descriptor.stack.name, "descriptor loaded");
        Ok(descriptor)
    }

    pub fn from_toml_str(content: &str) -> TopologyResult<Self> {
        toml::from_str(content)
            .map_err(|e| TopologyError::configuration(format!("invalid descriptor: {e}")))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Override provider keys from the environment.
    ///
    /// Every catalogued provider and every provider already present in the
    /// descriptor is looked up by its variable name; variables that are set
    /// (even to the empty string) win over the file.
    pub fn with_env_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in self.provider_ids() {
            let var = env_var_for(&id);
            if let Some(value) = lookup(&var) {
                debug!(provider = %id, %var, "provider key taken from environment");
                self.credentials.insert(id, value);
            }
        }
        self
    }

    /// Catalogued provider ids followed by any extra ids from the descriptor.
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = PROVIDERS.iter().map(|p| p.id.to_string()).collect();
        for id in self.credentials.keys() {
            if !ids.iter().any(|known| known == id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    /// Provider key, empty when not supplied.
    pub fn credential(&self, id: &str) -> &str {
        self.credentials.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn platform(&self) -> TopologyResult<Platform> {
        match self.stack.platform.as_deref() {
            Some(p) => Platform::parse(p),
            None => Err(TopologyError::configuration("platform is not set")),
        }
    }

    pub fn architecture(&self) -> TopologyResult<Architecture> {
        Architecture::parse(&self.stack.architecture)
    }

    /// Check that required identifiers are present.
    pub fn validate(&self) -> TopologyResult<()> {
        let required = [
            ("stack.name", &self.stack.name),
            ("stack.domain_name", &self.stack.domain_name),
            ("stack.hosted_zone_name", &self.stack.hosted_zone_name),
            ("stack.certificate_arn", &self.stack.certificate_arn),
            ("network.vpc_id", &self.network.vpc_id),
            ("images.gateway_repository", &self.images.gateway_repository),
            ("images.middleware_repository", &self.images.middleware_repository),
            ("cache.hostname", &self.cache.hostname),
            ("cache.security_group_id", &self.cache.security_group_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(TopologyError::configuration(format!("{field} is empty")));
            }
        }
        for (tier, db) in self.databases.tiers() {
            if db.hostname.trim().is_empty() || db.security_group_id.trim().is_empty() {
                return Err(TopologyError::configuration(format!(
                    "databases.{tier} needs a hostname and a security_group_id"
                )));
            }
        }
        if self.stack.vcpus == 0 || self.stack.vcpus > MAX_VCPUS {
            return Err(TopologyError::configuration(format!(
                "stack.vcpus must be in 1..={MAX_VCPUS}, got {}",
                self.stack.vcpus
            )));
        }
        self.platform()?;
        self.architecture()?;
        Ok(())
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.cache.hostname, self.cache.port)
    }

    pub fn service_url(&self) -> String {
        format!("https://{}", self.stack.domain_name)
    }

    /// Scaffold a descriptor with placeholder identifiers.
    pub fn scaffold(name: &str, platform: Platform) -> Self {
        DeploymentDescriptor {
            stack: StackConfig {
                name: name.to_string(),
                platform: Some(platform.label().to_string()),
                public: false,
                domain_name: format!("{name}.example.com"),
                hosted_zone_name: "example.com".to_string(),
                certificate_arn: "arn:aws:acm:us-east-1:000000000000:certificate/placeholder"
                    .to_string(),
                architecture: default_architecture(),
                vcpus: default_vcpus(),
            },
            network: NetworkConfig {
                vpc_id: "vpc-00000000".to_string(),
                disable_outbound_network_access: false,
            },
            images: ImagesConfig {
                gateway_repository: "litellm".to_string(),
                middleware_repository: "middleware".to_string(),
                gateway_version: default_tag(),
                middleware_version: default_tag(),
            },
            databases: DatabasesConfig {
                gateway: DatabaseTier {
                    hostname: "gateway-db.internal".to_string(),
                    secret_arn: "arn:aws:secretsmanager:us-east-1:000000000000:secret:gateway-db"
                        .to_string(),
                    security_group_id: "sg-database".to_string(),
                    port: default_postgres_port(),
                    user: "llmproxy".to_string(),
                    database: "litellm".to_string(),
                },
                middleware: DatabaseTier {
                    hostname: "middleware-db.internal".to_string(),
                    secret_arn:
                        "arn:aws:secretsmanager:us-east-1:000000000000:secret:middleware-db"
                            .to_string(),
                    security_group_id: "sg-database".to_string(),
                    port: default_postgres_port(),
                    user: "middleware".to_string(),
                    database: "middleware".to_string(),
                },
            },
            cache: CacheConfig {
                hostname: "cache.internal".to_string(),
                port: default_redis_port(),
                security_group_id: "sg-cache".to_string(),
            },
            capacity: CapacityConfig {
                min: 1,
                max: 3,
                desired: 1,
                cpu_target_percent: 50.0,
                memory_target_percent: 50.0,
            },
            identity: IdentityConfig::default(),
            buckets: BucketsConfig::default(),
            observability: ObservabilityConfig::default(),
            credentials: BTreeMap::new(),
            routes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[stack]
name = "gw"
platform = "ecs"
domain_name = "gw.example.com"
hosted_zone_name = "example.com"
certificate_arn = "arn:cert"

[network]
vpc_id = "vpc-1"

[images]
gateway_repository = "litellm"
middleware_repository = "middleware"

[databases.gateway]
hostname = "db1"
secret_arn = "arn:db1"
security_group_id = "sg-db"
user = "llmproxy"
database = "litellm"

[databases.middleware]
hostname = "db2"
secret_arn = "arn:db2"
security_group_id = "sg-db"
user = "middleware"
database = "middleware"

[cache]
hostname = "redis"
security_group_id = "sg-redis"

[capacity]
min = 1
max = 3
desired = 1
cpu_target_percent = 50
memory_target_percent = 60

[credentials]
openai = "sk-openai"
anthropic = ""
"#;

    #[test]
    fn test_parse_minimal() {
        let d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        assert_eq!(d.stack.name, "gw");
        assert_eq!(d.platform().unwrap(), Platform::ManagedContainer);
        assert_eq!(d.cache.port, 6379);
        assert_eq!(d.databases.gateway.port, 5432);
        assert_eq!(d.images.gateway_version, "latest");
        assert!(!d.stack.public);
        assert!(d.routes.is_none());
        d.validate().unwrap();
    }

    #[test]
    fn test_unset_platform_is_configuration_error() {
        let mut d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        d.stack.platform = None;
        assert!(matches!(d.platform(), Err(TopologyError::Configuration(_))));
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_configuration_error() {
        let err = DeploymentDescriptor::from_toml_str("[stack\nname=").unwrap_err();
        assert!(matches!(err, TopologyError::Configuration(_)));
    }

    #[test]
    fn test_credentials_default_to_empty() {
        let d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        assert_eq!(d.credential("openai"), "sk-openai");
        assert_eq!(d.credential("anthropic"), "");
        assert_eq!(d.credential("mistral"), "");
    }

    #[test]
    fn test_env_overrides_credentials() {
        let d = DeploymentDescriptor::from_toml_str(MINIMAL)
            .unwrap()
            .with_env_credentials(|var| match var {
                "OPENAI_API_KEY" => Some("sk-from-env".to_string()),
                "GROQ_API_KEY" => Some(String::new()),
                _ => None,
            });
        assert_eq!(d.credential("openai"), "sk-from-env");
        assert!(d.credentials.contains_key("groq"));
        assert!(!d.credentials.contains_key("mistral"));
    }

    #[test]
    fn test_extra_providers_are_data() {
        let mut d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        d.credentials.insert("together".to_string(), "tk".to_string());
        let ids = d.provider_ids();
        assert_eq!(ids.len(), PROVIDERS.len() + 1);
        assert_eq!(ids.last().map(String::as_str), Some("together"));
    }

    #[test]
    fn test_validate_rejects_empty_vpc() {
        let mut d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        d.network.vpc_id = " ".to_string();
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("network.vpc_id"));
    }

    #[test]
    fn test_scaffold_round_trips_through_toml() {
        let d = DeploymentDescriptor::scaffold("gw", Platform::ExternalCluster);
        let text = d.to_toml_string().unwrap();
        assert!(text.contains("platform = \"eks\""));
        let parsed = DeploymentDescriptor::from_toml_str(&text).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn test_validate_bounds_vcpus() {
        let mut d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        d.stack.vcpus = MAX_VCPUS;
        d.validate().unwrap();

        for bad in [0, MAX_VCPUS + 1, 3_000_000] {
            d.stack.vcpus = bad;
            let err = d.validate().unwrap_err();
            assert!(matches!(err, TopologyError::Configuration(_)), "{bad}");
            assert!(err.to_string().contains("stack.vcpus"));
        }
    }

    #[test]
    fn test_urls() {
        let d = DeploymentDescriptor::from_toml_str(MINIMAL).unwrap();
        assert_eq!(d.redis_url(), "redis://redis:6379");
        assert_eq!(d.service_url(), "https://gw.example.com");
    }
}
