//! Backend target groups and their health checks.
//!
//! One group per backend process type. Health checks are bound to the
//! group, not to any routing rule.

use std::collections::HashSet;

use gridgate_core::{HealthCheck, Protocol, TargetGroup, TopologyError, TopologyResult};

pub const GATEWAY: &str = "gateway";
pub const MIDDLEWARE: &str = "middleware";

pub const GATEWAY_PORT: u16 = 4000;
pub const MIDDLEWARE_PORT: u16 = 3000;

const HEALTHY_THRESHOLD: u32 = 2;
const UNHEALTHY_THRESHOLD: u32 = 3;
const TIMEOUT_SECS: u64 = 10;
const INTERVAL_SECS: u64 = 30;

fn http_check(path: &str, port: u16) -> HealthCheck {
    HealthCheck {
        path: path.to_string(),
        port,
        protocol: Protocol::Http,
        healthy_threshold: HEALTHY_THRESHOLD,
        unhealthy_threshold: UNHEALTHY_THRESHOLD,
        timeout_secs: TIMEOUT_SECS,
        interval_secs: INTERVAL_SECS,
    }
}

/// The LLM gateway process.
pub fn gateway_target_group() -> TargetGroup {
    TargetGroup {
        name: GATEWAY.to_string(),
        port: GATEWAY_PORT,
        protocol: Protocol::Http,
        health_check: http_check("/health/liveliness", GATEWAY_PORT),
    }
}

/// The middleware process in front of the bedrock and history endpoints.
pub fn middleware_target_group() -> TargetGroup {
    TargetGroup {
        name: MIDDLEWARE.to_string(),
        port: MIDDLEWARE_PORT,
        protocol: Protocol::Http,
        health_check: http_check("/bedrock/health/liveliness", MIDDLEWARE_PORT),
    }
}

pub fn default_target_groups() -> Vec<TargetGroup> {
    vec![gateway_target_group(), middleware_target_group()]
}

/// Check that group names are unique and health checks are sane.
pub fn validate_target_groups(groups: &[TargetGroup]) -> TopologyResult<()> {
    let mut names = HashSet::new();
    for group in groups {
        if !names.insert(group.name.as_str()) {
            return Err(TopologyError::configuration(format!(
                "target group '{}' declared twice",
                group.name
            )));
        }
        let check = &group.health_check;
        if !check.path.starts_with('/') {
            return Err(TopologyError::configuration(format!(
                "health check path of '{}' must start with '/'",
                group.name
            )));
        }
        if check.timeout_secs >= check.interval_secs {
            return Err(TopologyError::configuration(format!(
                "health check timeout of '{}' must be shorter than its interval",
                group.name
            )));
        }
        if check.healthy_threshold == 0 || check.unhealthy_threshold == 0 {
            return Err(TopologyError::configuration(format!(
                "health check thresholds of '{}' must be positive",
                group.name
            )));
        }
    }
    Ok(())
}
