//! Route compilation: rule specs → priority-ordered listener rules.

use std::collections::{BTreeSet, HashSet};

use gridgate_core::config::RouteConfig;
use gridgate_core::{HttpMethod, RouteRule, TargetGroup, TopologyError, TopologyResult};
use tracing::debug;

use crate::matcher::PathGlob;
use crate::target_group::{MIDDLEWARE, validate_target_groups};

/// Highest priority a listener accepts.
pub const MAX_PRIORITY: u32 = 50_000;

/// A rule before validation and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: String,
    pub priority: u32,
    pub path_patterns: Vec<String>,
    pub http_methods: Vec<HttpMethod>,
    pub target_group: String,
}

impl RuleSpec {
    pub fn new(
        name: &str,
        priority: u32,
        paths: &[&str],
        methods: &[HttpMethod],
        target_group: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            priority,
            path_patterns: paths.iter().map(|p| p.to_string()).collect(),
            http_methods: methods.to_vec(),
            target_group: target_group.to_string(),
        }
    }

    /// Build from a descriptor route entry; method names are parsed here.
    pub fn from_config(route: &RouteConfig) -> TopologyResult<Self> {
        let http_methods = route
            .methods
            .iter()
            .map(|m| HttpMethod::parse(m))
            .collect::<TopologyResult<Vec<_>>>()?;
        Ok(Self {
            name: route.name.clone(),
            priority: route.priority,
            path_patterns: route.paths.clone(),
            http_methods,
            target_group: route.target.clone(),
        })
    }
}

const METHODS: &[HttpMethod] = &[HttpMethod::Post, HttpMethod::Get, HttpMethod::Put];

/// The stock rule set: every explicit path goes to the middleware,
/// everything else falls through to the gateway default.
pub fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new("ChatHistory", 8, &["/chat-history"], METHODS, MIDDLEWARE),
        RuleSpec::new(
            "BedrockChatHistory",
            9,
            &["/bedrock/chat-history"],
            METHODS,
            MIDDLEWARE,
        ),
        RuleSpec::new(
            "BedrockLiveliness",
            10,
            &["/bedrock/health/liveliness"],
            METHODS,
            MIDDLEWARE,
        ),
        RuleSpec::new("SessionIds", 11, &["/session-ids"], METHODS, MIDDLEWARE),
        RuleSpec::new("KeyGenerate", 12, &["/key/generate"], METHODS, MIDDLEWARE),
        RuleSpec::new("UserNew", 13, &["/user/new"], METHODS, MIDDLEWARE),
        RuleSpec::new(
            "ChatCompletions",
            14,
            &["/chat/completions"],
            METHODS,
            MIDDLEWARE,
        ),
        RuleSpec::new(
            "OpenAICompletions",
            15,
            &["/v1/chat/completions"],
            METHODS,
            MIDDLEWARE,
        ),
        RuleSpec::new("BedrockModels", 16, &["/bedrock/model/*"], METHODS, MIDDLEWARE),
    ]
}

/// Validate `specs` against `groups` and order them by ascending priority.
///
/// Fails with `PriorityConflict` when two rules share a priority, and with
/// a configuration error for an out-of-range priority, an empty pattern or
/// method list, a malformed pattern, a duplicate rule name or a target
/// group that is not declared.
pub fn compile_routes(specs: &[RuleSpec], groups: &[TargetGroup]) -> TopologyResult<Vec<RouteRule>> {
    validate_target_groups(groups)?;

    let mut names = HashSet::new();
    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(TopologyError::configuration(format!(
                "route '{}' declared twice",
                spec.name
            )));
        }
        if spec.priority == 0 || spec.priority > MAX_PRIORITY {
            return Err(TopologyError::configuration(format!(
                "route '{}' priority {} is outside 1..={MAX_PRIORITY}",
                spec.name, spec.priority
            )));
        }
        if spec.path_patterns.is_empty() {
            return Err(TopologyError::configuration(format!(
                "route '{}' has no path patterns",
                spec.name
            )));
        }
        if spec.http_methods.is_empty() {
            return Err(TopologyError::configuration(format!(
                "route '{}' has no HTTP methods",
                spec.name
            )));
        }
        for pattern in &spec.path_patterns {
            PathGlob::new(pattern)?;
        }
        if !groups.iter().any(|g| g.name == spec.target_group) {
            return Err(TopologyError::configuration(format!(
                "route '{}' forwards to undeclared target group '{}'",
                spec.name, spec.target_group
            )));
        }
    }

    // Stable: rules sharing a priority stay in declaration order so the
    // conflict names them first-then-second.
    let mut ordered: Vec<&RuleSpec> = specs.iter().collect();
    ordered.sort_by_key(|s| s.priority);
    for pair in ordered.windows(2) {
        if pair[0].priority == pair[1].priority {
            return Err(TopologyError::PriorityConflict {
                priority: pair[0].priority,
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }
    }

    let rules: Vec<RouteRule> = ordered
        .into_iter()
        .map(|spec| {
            let mut seen = HashSet::new();
            let path_patterns = spec
                .path_patterns
                .iter()
                .filter(|p| seen.insert(p.as_str()))
                .cloned()
                .collect();
            RouteRule {
                name: spec.name.clone(),
                priority: spec.priority,
                path_patterns,
                http_methods: spec.http_methods.iter().copied().collect::<BTreeSet<_>>(),
                target_group: spec.target_group.clone(),
            }
        })
        .collect();

    debug!(count = rules.len(), "routes compiled");
    Ok(rules)
}
