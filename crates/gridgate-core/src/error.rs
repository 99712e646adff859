//! Error taxonomy shared by every compiler stage.

use thiserror::Error;

use crate::resolve::ResourceKind;

/// Result type alias for compiler and provisioning operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors raised while compiling or applying a deployment topology.
///
/// Everything except `Provisioning` is raised during plan validation,
/// before any external mutation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unresolved {kind} reference: {id}")]
    Reference { kind: ResourceKind, id: String },

    #[error("priority conflict: rules '{first}' and '{second}' both use priority {priority}")]
    PriorityConflict {
        priority: u32,
        first: String,
        second: String,
    },

    #[error("invalid capacity range: min={min} desired={desired} max={max}")]
    CapacityRange { min: u32, desired: u32, max: u32 },

    #[error("provisioning error: {0}")]
    Provisioning(String),
}

impl TopologyError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn reference(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::Reference {
            kind,
            id: id.into(),
        }
    }

    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    /// Whether this error can only surface after external state was touched.
    pub fn is_post_apply(&self) -> bool {
        matches!(self, TopologyError::Provisioning(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = TopologyError::PriorityConflict {
            priority: 9,
            first: "ChatHistory".to_string(),
            second: "BedrockChatHistory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ChatHistory"));
        assert!(msg.contains('9'));

        let err = TopologyError::reference(ResourceKind::SecurityGroup, "sg-123");
        assert_eq!(err.to_string(), "unresolved security group reference: sg-123");
    }

    #[test]
    fn only_provisioning_is_post_apply() {
        assert!(TopologyError::provisioning("boom").is_post_apply());
        assert!(!TopologyError::configuration("bad").is_post_apply());
        assert!(
            !TopologyError::CapacityRange {
                min: 3,
                desired: 1,
                max: 2
            }
            .is_post_apply()
        );
    }
}
