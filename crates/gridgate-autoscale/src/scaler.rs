//! Autoscaler — target tracking over the policy's triggers.
//!
//! Evaluation is pure given a timestamp; `evaluate` stamps the current
//! wall clock, `evaluate_at` takes it explicitly.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gridgate_core::{AutoscalingPolicy, ScalingMetric};
use tracing::{debug, warn};

/// A scaling decision for a single service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Scale to the specified task count.
    ScaleTo(u32),
    /// No change needed.
    NoChange,
}

/// Average utilization across the service's tasks, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl UtilizationSample {
    fn value(&self, metric: ScalingMetric) -> f64 {
        match metric {
            ScalingMetric::Cpu => self.cpu_percent,
            ScalingMetric::Memory => self.memory_percent,
        }
    }
}

/// Per-service cooldown tracking.
#[derive(Default)]
struct ScaleState {
    last_scale_out: Option<u64>,
    last_scale_in: Option<u64>,
}

fn cooled(last: Option<u64>, now: u64, cooldown: u64) -> bool {
    last.is_none_or(|t| now.saturating_sub(t) >= cooldown)
}

/// Evaluates scaling policies and remembers when each service last moved.
pub struct Autoscaler {
    scale_out_cooldown: u64,
    scale_in_cooldown: u64,
    states: HashMap<String, ScaleState>,
}

impl Autoscaler {
    pub fn new() -> Self {
        Self {
            scale_out_cooldown: 60,
            scale_in_cooldown: 300,
            states: HashMap::new(),
        }
    }

    pub fn with_cooldowns(mut self, scale_out: Duration, scale_in: Duration) -> Self {
        self.scale_out_cooldown = scale_out.as_secs();
        self.scale_in_cooldown = scale_in.as_secs();
        self
    }

    /// Largest per-trigger proposal, before clamping. `None` when no
    /// trigger had a usable reading.
    fn proposal(policy: &AutoscalingPolicy, sample: &UtilizationSample, current: u32) -> Option<u32> {
        let base = current.max(1) as f64;
        policy
            .triggers
            .iter()
            .filter_map(|trigger| {
                let observed = sample.value(trigger.metric);
                if !observed.is_finite() || observed < 0.0 {
                    warn!(trigger = %trigger.name, observed, "ignoring unusable utilization reading");
                    return None;
                }
                let wanted = (base * observed / trigger.target_percent).ceil();
                Some(wanted.min(u32::MAX as f64) as u32)
            })
            .max()
    }

    pub fn evaluate(
        &mut self,
        service: &str,
        policy: &AutoscalingPolicy,
        sample: &UtilizationSample,
        current: u32,
    ) -> ScaleDecision {
        self.evaluate_at(service, policy, sample, current, epoch_secs())
    }

    /// Evaluate `policy` for `service` running `current` tasks at time `now`
    /// (seconds since the epoch).
    pub fn evaluate_at(
        &mut self,
        service: &str,
        policy: &AutoscalingPolicy,
        sample: &UtilizationSample,
        current: u32,
        now: u64,
    ) -> ScaleDecision {
        let state = self.states.entry(service.to_string()).or_default();

        // Outside the range: correct immediately, cooldowns do not apply.
        let bounded = policy.clamp(current);
        if bounded != current {
            debug!(%service, from = current, to = bounded, "count outside capacity range");
            if bounded > current {
                state.last_scale_out = Some(now);
            } else {
                state.last_scale_in = Some(now);
            }
            return ScaleDecision::ScaleTo(bounded);
        }

        let Some(raw) = Self::proposal(policy, sample, current) else {
            return ScaleDecision::NoChange;
        };
        let desired = policy.clamp(raw);

        if desired > current && cooled(state.last_scale_out, now, self.scale_out_cooldown) {
            state.last_scale_out = Some(now);
            debug!(%service, from = current, to = desired, "scaling out");
            return ScaleDecision::ScaleTo(desired);
        }
        if desired < current && cooled(state.last_scale_in, now, self.scale_in_cooldown) {
            state.last_scale_in = Some(now);
            debug!(%service, from = current, to = desired, "scaling in");
            return ScaleDecision::ScaleTo(desired);
        }
        ScaleDecision::NoChange
    }
}

impl Default for Autoscaler {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
