//! Policy construction from the descriptor.

use gridgate_core::{
    AutoscalingPolicy, DeploymentDescriptor, ScalingMetric, ScalingTrigger, TopologyError,
    TopologyResult,
};
use gridgate_state::StateStore;
use tracing::{debug, info};

pub const CPU_TRIGGER: &str = "CpuScaling";
pub const MEMORY_TRIGGER: &str = "Memory";

fn check_target(name: &str, value: f64) -> TopologyResult<f64> {
    if value.is_finite() && value > 0.0 && value <= 100.0 {
        Ok(value)
    } else {
        Err(TopologyError::configuration(format!(
            "{name} must be in (0, 100], got {value}"
        )))
    }
}

/// Build the scaling policy: a shared capacity range with one CPU and
/// one memory trigger.
pub fn build_policy(descriptor: &DeploymentDescriptor) -> TopologyResult<AutoscalingPolicy> {
    let capacity = &descriptor.capacity;
    if !(capacity.min <= capacity.desired && capacity.desired <= capacity.max) {
        return Err(TopologyError::CapacityRange {
            min: capacity.min,
            desired: capacity.desired,
            max: capacity.max,
        });
    }
    if capacity.max == 0 {
        return Err(TopologyError::configuration(
            "capacity.max must allow at least one task",
        ));
    }

    let cpu = check_target("capacity.cpu_target_percent", capacity.cpu_target_percent)?;
    let memory = check_target(
        "capacity.memory_target_percent",
        capacity.memory_target_percent,
    )?;

    let policy = AutoscalingPolicy {
        min_capacity: capacity.min,
        desired_capacity: capacity.desired,
        max_capacity: capacity.max,
        triggers: vec![
            ScalingTrigger {
                name: CPU_TRIGGER.to_string(),
                metric: ScalingMetric::Cpu,
                target_percent: cpu,
            },
            ScalingTrigger {
                name: MEMORY_TRIGGER.to_string(),
                metric: ScalingMetric::Memory,
                target_percent: memory,
            },
        ],
    };
    debug!(
        min = policy.min_capacity,
        desired = policy.desired_capacity,
        max = policy.max_capacity,
        "scaling policy built"
    );
    Ok(policy)
}

/// Store the policy for `service`. Returns true if it changed.
pub fn apply_policy(
    service: &str,
    policy: &AutoscalingPolicy,
    store: &StateStore,
) -> TopologyResult<bool> {
    let changed = store.put_scaling_policy(service, policy)?;
    if changed {
        info!(%service, "scaling policy registered");
    }
    Ok(changed)
}
