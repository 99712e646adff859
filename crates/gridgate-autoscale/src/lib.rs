//! gridgate-autoscale — capacity range and utilization triggers.
//!
//! `build_policy` turns the descriptor's capacity block into an
//! `AutoscalingPolicy`; `Autoscaler` evaluates that policy against a
//! utilization sample the way the managed scaling service does.
//!
//! # Target Tracking
//!
//! ```text
//! for each trigger:
//!     proposal = ceil(current * observed / target)
//!
//! desired = clamp(max(proposals), min, max)
//!
//! desired > current  → ScaleTo(desired)   unless in scale-out cooldown
//! desired < current  → ScaleTo(desired)   unless in scale-in cooldown
//! current outside [min, max] → ScaleTo(clamped) immediately
//! ```
//!
//! Triggers are independent; the largest proposal wins so neither
//! resource is starved.

pub mod policy;
pub mod scaler;

pub use policy::{CPU_TRIGGER, MEMORY_TRIGGER, apply_policy, build_policy};
pub use scaler::{Autoscaler, ScaleDecision, UtilizationSample};
