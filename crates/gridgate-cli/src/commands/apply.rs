use gridgate_core::ResourceKind;
use gridgate_planner::report::format_apply;
use gridgate_planner::{ApplyReport, deploy, references};
use gridgate_state::StateStore;
use tracing::info;

use super::{load_descriptor, open_store};

pub fn apply(path: &str, data_dir: &str) -> anyhow::Result<()> {
    let descriptor = load_descriptor(path)?;
    let store = open_store(data_dir)?;
    let report = apply_descriptor(&descriptor, &store)?;
    print!("{}", format_apply(&report));
    Ok(())
}

fn apply_descriptor(
    descriptor: &gridgate_core::DeploymentDescriptor,
    store: &StateStore,
) -> anyhow::Result<ApplyReport> {
    let (plan, report) = deploy(descriptor, store)?;
    info!(stack = %plan.stack, fingerprint = %report.fingerprint, "apply finished");
    Ok(report)
}

pub fn import(kind: &str, id: &str, data_dir: &str) -> anyhow::Result<()> {
    let kind = ResourceKind::parse(kind)?;
    let store = open_store(data_dir)?;
    if store.register_external(kind, id)? {
        println!("✓ Imported {kind} {id}");
    } else {
        println!("  {kind} {id} already imported");
    }
    Ok(())
}

pub fn import_descriptor(path: &str, data_dir: &str) -> anyhow::Result<()> {
    let descriptor = load_descriptor(path)?;
    let store = open_store(data_dir)?;
    let added = import_references(&descriptor, &store)?;
    println!("✓ Imported {added} new references from {path}");
    Ok(())
}

fn import_references(
    descriptor: &gridgate_core::DeploymentDescriptor,
    store: &StateStore,
) -> anyhow::Result<usize> {
    let mut added = 0;
    for (kind, id) in references(descriptor) {
        if store.register_external(kind, &id)? {
            added += 1;
        }
    }
    Ok(added)
}
