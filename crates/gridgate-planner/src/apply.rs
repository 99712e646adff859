//! Validate-then-apply against the provisioning backend.
//!
//! ```text
//!   compile(descriptor, store) ──► TopologyPlan   (no writes; all
//!                                    │              non-provisioning
//!                                    ▼              errors surface here)
//!   apply_plan(plan, store)
//!     1. credential sets     create-if-absent / pass-through
//!     2. ingress edges       append-only          (managed only)
//!     3. routing             create + sync        (managed only)
//!     4. scaling policy      put-if-changed       (managed only)
//!     5. applied fingerprint
//! ```
//!
//! Every step is idempotent, so a run interrupted by a provisioning
//! error converges when re-run with the same descriptor.

use gridgate_autoscale::apply_policy;
use gridgate_core::{DeploymentDescriptor, TopologyResult};
use gridgate_network::{EdgeReport, apply_edges};
use gridgate_routing::{RoutingReport, apply_routing};
use gridgate_secrets::{ProvisionReport, SecretProvisioner};
use gridgate_state::StateStore;
use tracing::{info, warn};

use crate::assemble::compile;
use crate::plan::{PlatformPlan, TopologyPlan};

/// What an apply run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub fingerprint: String,
    pub previous_fingerprint: Option<String>,
    pub secrets: ProvisionReport,
    pub edges: Option<EdgeReport>,
    pub routing: Option<RoutingReport>,
    pub scaling_changed: bool,
}

impl ApplyReport {
    /// True when the backend already matched the plan.
    pub fn is_noop(&self) -> bool {
        self.secrets.is_noop()
            && self.edges.as_ref().is_none_or(|e| e.added == 0)
            && self.routing.as_ref().is_none_or(RoutingReport::is_noop)
            && !self.scaling_changed
    }

    pub fn plan_changed(&self) -> bool {
        self.previous_fingerprint.as_deref() != Some(self.fingerprint.as_str())
    }
}

/// Apply a compiled plan.
pub fn apply_plan(
    plan: &TopologyPlan,
    store: &StateStore,
    provisioner: &SecretProvisioner,
) -> TopologyResult<ApplyReport> {
    let fingerprint = plan.fingerprint()?;
    let previous_fingerprint = store.get_applied_fingerprint(&plan.stack)?;

    let mut report = ApplyReport {
        fingerprint,
        previous_fingerprint,
        secrets: provisioner.apply(&plan.substrate.credentials, store)?,
        ..ApplyReport::default()
    };

    if let PlatformPlan::ManagedContainer(managed) = &plan.platform {
        report.edges = Some(apply_edges(&managed.edges, store)?);
        report.routing = Some(apply_routing(
            &plan.stack,
            &managed.load_balancer.listener,
            &managed.target_groups,
            store,
        )?);
        let service = format!("{}/{}", plan.stack, managed.service.name);
        report.scaling_changed = apply_policy(&service, &managed.scaling, store)?;
    }

    store.put_applied_fingerprint(&plan.stack, &report.fingerprint)?;
    if report.is_noop() {
        info!(stack = %plan.stack, "backend already up to date");
    } else {
        info!(
            stack = %plan.stack,
            secrets_created = report.secrets.created.len(),
            secrets_updated = report.secrets.updated.len(),
            "plan applied"
        );
    }
    Ok(report)
}

/// Compile against the backend's inventory, then apply.
///
/// A descriptor that fails to compile leaves the backend untouched.
pub fn deploy(
    descriptor: &DeploymentDescriptor,
    store: &StateStore,
) -> TopologyResult<(TopologyPlan, ApplyReport)> {
    let plan = compile(descriptor, store).inspect_err(|e| {
        warn!(stack = %descriptor.stack.name, error = %e, "plan rejected before apply");
    })?;
    let report = apply_plan(&plan, store, &SecretProvisioner::default())?;
    Ok((plan, report))
}
