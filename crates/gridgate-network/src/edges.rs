//! Ingress edge derivation and append-only application.

use gridgate_core::{
    DeploymentDescriptor, ResourceKind, ResourceResolver, SecurityEdge, TopologyResult,
};
use gridgate_state::StateStore;
use tracing::{debug, info};

/// Derive the ingress edges from `compute_group` to the data tiers.
///
/// One edge to the cache group on the cache port, one edge to each
/// database tier's group on its port. Edges that name the same
/// `(source, dest, port)` collapse into the first one. Every destination
/// group must resolve, otherwise the build fails with a reference error
/// before anything is applied.
pub fn build_edges<R: ResourceResolver>(
    descriptor: &DeploymentDescriptor,
    compute_group: &str,
    resolver: &R,
) -> TopologyResult<Vec<SecurityEdge>> {
    let mut candidates = vec![SecurityEdge {
        source_group: compute_group.to_string(),
        dest_group: descriptor.cache.security_group_id.clone(),
        port: descriptor.cache.port,
        description: "Allow compute tasks to connect to the cache".to_string(),
    }];
    for (tier, db) in descriptor.databases.tiers() {
        candidates.push(SecurityEdge {
            source_group: compute_group.to_string(),
            dest_group: db.security_group_id.clone(),
            port: db.port,
            description: format!("Allow compute tasks to connect to the {tier} database"),
        });
    }

    let mut edges: Vec<SecurityEdge> = Vec::with_capacity(candidates.len());
    for edge in candidates {
        resolver.require(ResourceKind::SecurityGroup, &edge.dest_group)?;
        if edges.iter().any(|e| e.permission_key() == edge.permission_key()) {
            debug!(key = %edge.permission_key(), "duplicate ingress edge collapsed");
            continue;
        }
        edges.push(edge);
    }
    Ok(edges)
}

/// Outcome of applying edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeReport {
    pub added: u32,
    pub existing: u32,
}

/// Append edges to the backend; permissions already present are skipped.
pub fn apply_edges(edges: &[SecurityEdge], store: &StateStore) -> TopologyResult<EdgeReport> {
    let mut report = EdgeReport::default();
    for edge in edges {
        if store.add_ingress_if_absent(edge)? {
            report.added += 1;
        } else {
            report.existing += 1;
        }
    }
    info!(added = report.added, existing = report.existing, "ingress edges applied");
    Ok(report)
}
