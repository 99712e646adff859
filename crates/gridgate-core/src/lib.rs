//! gridgate-core — shared vocabulary for the deployment-topology compiler.
//!
//! Everything the component crates exchange lives here: the
//! `DeploymentDescriptor` read from `gridgate.toml`, the derived topology
//! entities (route rules, target groups, security edges, credential sets,
//! scaling policies), the provider credential catalog, and the
//! `TopologyError` taxonomy every stage reports through.

pub mod config;
pub mod error;
pub mod provider;
pub mod resolve;
pub mod types;

pub use config::DeploymentDescriptor;
pub use error::{TopologyError, TopologyResult};
pub use resolve::{ResourceKind, ResourceResolver, StaticInventory};
pub use types::*;
