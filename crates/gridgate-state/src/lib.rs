//! gridgate-state — the provisioning backend.
//!
//! Backed by [redb](https://docs.rs/redb), records what a provisioning pass
//! has applied: secret values, ingress permissions on externally-owned
//! security groups, listener rules, target groups, scaling policies, and
//! the inventory of external resources plans may reference.
//!
//! # Mutation semantics
//!
//! Every write is shaped so that re-applying the same plan is a no-op:
//!
//! - generated secret fields are create-if-absent, guarded by write grants
//! - ingress permissions are append-only and keyed by `(dest, source, port)`
//! - listener rules are synchronized per listener, keyed by priority
//! - target groups are immutable once created
//!
//! All values are JSON-serialized into `&[u8]` columns. The `StateStore` is
//! `Clone` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
