//! Human-readable plan and apply reports.

use crate::apply::ApplyReport;
use crate::plan::{PlatformPlan, TopologyPlan};

pub fn format_plan(plan: &TopologyPlan) -> String {
    let mut out = String::new();

    out.push_str("\n╔══════════════════════════════════════════╗\n");
    out.push_str("║  gridgate topology plan                  ║\n");
    out.push_str("╠══════════════════════════════════════════╣\n");
    out.push_str(&format!("║  Stack:    {:<30}║\n", plan.stack));
    out.push_str(&format!("║  Platform: {:<30}║\n", plan.platform.label()));
    let zone = if plan.substrate.hosted_zone.is_private() {
        "private"
    } else {
        "public"
    };
    out.push_str(&format!("║  Zone:     {:<30}║\n", zone));
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    out.push_str(&format!("Resources ({} created):\n", plan.resources.len()));
    for r in &plan.resources {
        out.push_str(&format!("  + {:<16} {}\n", r.kind, r.name));
    }
    out.push('\n');

    out.push_str("Credentials:\n");
    for set in &plan.substrate.credentials {
        let generated = set.generated_fields().count();
        out.push_str(&format!(
            "  • {} ({} fields, {} generated)\n",
            set.name,
            set.fields.len(),
            generated
        ));
    }
    out.push('\n');

    if let PlatformPlan::ManagedContainer(managed) = &plan.platform {
        let listener = &managed.load_balancer.listener;
        out.push_str(&format!(
            "Listener {} (:{}, {}):\n",
            listener.name,
            listener.port,
            if listener.internet_facing {
                "internet-facing"
            } else {
                "internal"
            }
        ));
        for rule in &listener.rules {
            let methods: Vec<&str> = rule.http_methods.iter().map(|m| m.as_str()).collect();
            out.push_str(&format!(
                "  {:>5}  {:<28} {:<16} → {}\n",
                rule.priority,
                rule.path_patterns.join(","),
                methods.join(","),
                rule.target_group
            ));
        }
        out.push_str(&format!("  default → {}\n\n", listener.default_target));

        out.push_str("Target groups:\n");
        for g in &managed.target_groups {
            out.push_str(&format!(
                "  • {} :{}  health {} :{} every {}s\n",
                g.name, g.port, g.health_check.path, g.health_check.port, g.health_check.interval_secs
            ));
        }
        out.push('\n');

        out.push_str("Ingress edges:\n");
        for e in &managed.edges {
            out.push_str(&format!(
                "  • {} → {} :{}\n",
                e.source_group, e.dest_group, e.port
            ));
        }
        out.push('\n');

        let s = &managed.scaling;
        out.push_str(&format!(
            "Scaling: {} ≤ {} ≤ {}\n",
            s.min_capacity, s.desired_capacity, s.max_capacity
        ));
        for t in &s.triggers {
            out.push_str(&format!("  • {} at {}%\n", t.name, t.target_percent));
        }
        out.push('\n');
    }

    out.push_str(&format_outputs(plan));
    out
}

pub fn format_outputs(plan: &TopologyPlan) -> String {
    let mut out = String::from("Outputs:\n");
    for (name, value) in plan.outputs.iter() {
        out.push_str(&format!("  {name:<34} {value}\n"));
    }
    out
}

pub fn format_apply(report: &ApplyReport) -> String {
    if report.is_noop() {
        return format!("✓ Up to date ({})\n", &report.fingerprint[..12.min(report.fingerprint.len())]);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "✓ Applied plan {}\n",
        &report.fingerprint[..12.min(report.fingerprint.len())]
    ));
    out.push_str(&format!(
        "  secrets:  {} created, {} updated, {} unchanged\n",
        report.secrets.created.len(),
        report.secrets.updated.len(),
        report.secrets.unchanged.len()
    ));
    if let Some(edges) = &report.edges {
        out.push_str(&format!(
            "  ingress:  {} added, {} existing\n",
            edges.added, edges.existing
        ));
    }
    if let Some(routing) = &report.routing {
        out.push_str(&format!(
            "  routing:  {} groups created, {} rules added, {} replaced, {} removed\n",
            routing.groups_created, routing.rules.added, routing.rules.replaced, routing.rules.removed
        ));
    }
    if report.scaling_changed {
        out.push_str("  scaling:  policy updated\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::compile;
    use crate::substrate::references;
    use gridgate_core::{DeploymentDescriptor, Platform, StaticInventory};

    fn plan(platform: Platform) -> TopologyPlan {
        let d = DeploymentDescriptor::scaffold("gw", platform);
        let mut inv = StaticInventory::new();
        for (kind, id) in references(&d) {
            inv.insert(kind, id);
        }
        compile(&d, &inv).unwrap()
    }

    #[test]
    fn managed_report_lists_routes() {
        let text = format_plan(&plan(Platform::ManagedContainer));
        assert!(text.contains("Listener Listener-Private"));
        assert!(text.contains("/bedrock/model/*"));
        assert!(text.contains("default → gateway"));
        assert!(text.contains("LitellmEcsCluster"));
    }

    #[test]
    fn external_report_has_no_listener() {
        let text = format_plan(&plan(Platform::ExternalCluster));
        assert!(!text.contains("Listener"));
        assert!(text.contains("RedisSecurityGroupId"));
    }

    #[test]
    fn noop_apply_is_one_line() {
        let report = ApplyReport {
            fingerprint: "0123456789abcdef".to_string(),
            previous_fingerprint: Some("0123456789abcdef".to_string()),
            ..ApplyReport::default()
        };
        assert_eq!(format_apply(&report), "✓ Up to date (0123456789ab)\n");
    }
}
