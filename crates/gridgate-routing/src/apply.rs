//! Applying a compiled listener and its target groups to the backend.

use gridgate_core::{TargetGroup, TopologyResult};
use gridgate_state::{RuleSyncReport, StateStore};
use tracing::info;

use crate::listener::Listener;

/// Outcome of applying the routing table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingReport {
    pub groups_created: u32,
    pub rules: RuleSyncReport,
}

impl RoutingReport {
    pub fn is_noop(&self) -> bool {
        self.groups_created == 0 && self.rules.is_noop()
    }
}

/// Create missing target groups, then make the listener's stored rules
/// equal its compiled rules.
pub fn apply_routing(
    stack: &str,
    listener: &Listener,
    groups: &[TargetGroup],
    store: &StateStore,
) -> TopologyResult<RoutingReport> {
    let mut report = RoutingReport::default();
    for group in groups {
        if store.create_target_group(stack, group)? {
            report.groups_created += 1;
        }
    }
    let key = format!("{stack}/{}", listener.name);
    report.rules = store.sync_listener_rules(&key, &listener.rules)?;

    info!(
        listener = %key,
        groups_created = report.groups_created,
        rules_added = report.rules.added,
        rules_replaced = report.rules.replaced,
        rules_removed = report.rules.removed,
        "routing applied"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{RuleSpec, compile_routes, default_rules};
    use crate::target_group::{GATEWAY, default_target_groups};
    use gridgate_core::{HttpMethod, TopologyError};

    fn listener(specs: &[RuleSpec]) -> Listener {
        let rules = compile_routes(specs, &default_target_groups()).unwrap();
        Listener::https("Listener-Private", "arn:cert", false, rules, GATEWAY).unwrap()
    }

    #[test]
    fn reapplying_is_noop() {
        let store = StateStore::open_in_memory().unwrap();
        let l = listener(&default_rules());
        let groups = default_target_groups();

        let first = apply_routing("gw", &l, &groups, &store).unwrap();
        assert_eq!(first.groups_created, 2);
        assert_eq!(first.rules.added, 9);

        let second = apply_routing("gw", &l, &groups, &store).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.rules.unchanged, 9);

        let stored = store.list_listener_rules("gw/Listener-Private").unwrap();
        assert_eq!(stored, l.rules);
    }

    #[test]
    fn dropped_rule_is_removed() {
        let store = StateStore::open_in_memory().unwrap();
        let groups = default_target_groups();
        apply_routing("gw", &listener(&default_rules()), &groups, &store).unwrap();

        let mut fewer = default_rules();
        fewer.retain(|r| r.name != "UserNew");
        let report = apply_routing("gw", &listener(&fewer), &groups, &store).unwrap();
        assert_eq!(report.rules.removed, 1);
        assert_eq!(
            store.list_listener_rules("gw/Listener-Private").unwrap().len(),
            8
        );
    }

    #[test]
    fn changed_group_definition_fails() {
        let store = StateStore::open_in_memory().unwrap();
        let l = listener(&[RuleSpec::new("A", 1, &["/a"], &[HttpMethod::Get], GATEWAY)]);
        let mut groups = default_target_groups();
        apply_routing("gw", &l, &groups, &store).unwrap();

        groups[0].health_check.interval_secs = 60;
        let err = apply_routing("gw", &l, &groups, &store).unwrap_err();
        assert!(matches!(err, TopologyError::Provisioning(_)));
    }
}
