//! gridgate-planner — turns a deployment descriptor into a topology plan.
//!
//! # Architecture
//!
//! ```text
//!   DeploymentDescriptor
//!          │
//!          ▼
//!   build_substrate ── VPC, zone, certificate, config bucket, firewall,
//!          │           images, credential sets
//!          ▼
//!   select_platform ──┬── ManagedContainer: edges → routes → scaling → task
//!                     └── ExternalCluster:  references only
//!          │
//!          ▼
//!   resource inventory ── tags stamped ── outputs
//!          │
//!          ▼
//!   TopologyPlan ── apply_plan ──► StateStore
//! ```

pub mod apply;
pub mod assemble;
pub mod compute;
pub mod outputs;
pub mod plan;
pub mod report;
pub mod selector;
pub mod substrate;
pub mod tags;

pub use apply::{ApplyReport, apply_plan, deploy};
pub use assemble::compile;
pub use outputs::PlanOutputs;
pub use plan::{
    ExternalClusterPlan, HostedZone, ManagedContainerPlan, PlatformPlan, ResourceRecord,
    SharedSubstrate, TopologyPlan,
};
pub use selector::select_platform;
pub use substrate::references;
pub use tags::TagSet;
