//! gridgate-routing — the HTTPS listener's routing table.
//!
//! # Components
//!
//! - **`target_group`**: gateway (4000) and middleware (3000) backend
//!   groups, each with its own health check
//! - **`compiler`**: validates rule specs and orders them priority-ascending
//! - **`matcher`**: path glob matching (`*`, `?`)
//! - **`listener`**: evaluates compiled rules in order, falling through to
//!   the default forward target
//! - **`apply`**: creates target groups and syncs stored listener rules
//!
//! Priorities are explicit input. The compiler checks them; it never
//! reorders rules by path specificity.

pub mod apply;
pub mod compiler;
pub mod listener;
pub mod matcher;
pub mod target_group;

pub use apply::{RoutingReport, apply_routing};
pub use compiler::{RuleSpec, compile_routes, default_rules};
pub use listener::Listener;
pub use matcher::PathGlob;
pub use target_group::{
    GATEWAY, GATEWAY_PORT, MIDDLEWARE, MIDDLEWARE_PORT, default_target_groups,
    gateway_target_group, middleware_target_group,
};
