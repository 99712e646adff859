//! gridgate-network — security-group reachability for the compute tier.
//!
//! Computes the ingress edges that let the compute group reach the cache
//! tier and each database tier, and applies them append-only. The target
//! security groups are owned elsewhere; this crate never removes or
//! rewrites a rule it did not add.

pub mod edges;

pub use edges::{EdgeReport, apply_edges, build_edges};
