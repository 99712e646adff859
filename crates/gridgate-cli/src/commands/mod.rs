pub mod apply;
pub mod init;
pub mod plan;

use std::path::Path;

use anyhow::Context;
use gridgate_core::{DeploymentDescriptor, StaticInventory};
use gridgate_planner::{TopologyPlan, compile, references};
use gridgate_state::StateStore;
use tracing::warn;

const STATE_FILE: &str = "state.redb";

/// Load a descriptor; provider keys set in the environment win over the file.
pub fn load_descriptor(path: &str) -> anyhow::Result<DeploymentDescriptor> {
    let descriptor = DeploymentDescriptor::from_file(Path::new(path))?
        .with_env_credentials(|var| std::env::var(var).ok());
    Ok(descriptor)
}

pub fn open_store(data_dir: &str) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create data directory {data_dir}"))?;
    let store = StateStore::open(&Path::new(data_dir).join(STATE_FILE))?;
    Ok(store)
}

/// Compile against the backend inventory when a data directory is given,
/// otherwise against an inventory that holds every referenced resource.
pub fn compile_with(
    descriptor: &DeploymentDescriptor,
    data_dir: Option<&str>,
) -> anyhow::Result<TopologyPlan> {
    let plan = match data_dir {
        Some(dir) => compile(descriptor, &open_store(dir)?)?,
        None => {
            warn!("no data directory given, external references are not checked");
            let mut inventory = StaticInventory::new();
            for (kind, id) in references(descriptor) {
                inventory.insert(kind, id);
            }
            compile(descriptor, &inventory)?
        }
    };
    Ok(plan)
}
