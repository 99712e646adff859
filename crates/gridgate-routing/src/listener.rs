//! The HTTPS listener and its first-match dispatch.
//!
//! Rules are evaluated in ascending priority. The first rule whose method
//! set contains the request method and whose path patterns match the
//! request path wins; no rule matching means the default target.

use gridgate_core::{HttpMethod, Protocol, RouteRule, TopologyError, TopologyResult};
use serde::Serialize;
use tracing::trace;

use crate::matcher::PathGlob;

pub const HTTPS_PORT: u16 = 443;
pub const SSL_POLICY: &str = "ELBSecurityPolicy-TLS13-1-2-2021-06";

/// A compiled listener.
#[derive(Debug, Clone, Serialize)]
pub struct Listener {
    pub name: String,
    pub port: u16,
    pub protocol: Protocol,
    pub certificate_arn: String,
    pub ssl_policy: String,
    pub internet_facing: bool,
    pub rules: Vec<RouteRule>,
    /// Target group receiving traffic no rule matches.
    pub default_target: String,
    #[serde(skip)]
    matchers: Vec<Vec<PathGlob>>,
}

impl Listener {
    /// Build an HTTPS listener over already compiled rules.
    ///
    /// Rules must be in ascending priority order, as `compile_routes`
    /// returns them.
    pub fn https(
        name: &str,
        certificate_arn: &str,
        internet_facing: bool,
        rules: Vec<RouteRule>,
        default_target: &str,
    ) -> TopologyResult<Self> {
        if rules.windows(2).any(|w| w[0].priority >= w[1].priority) {
            return Err(TopologyError::configuration(format!(
                "rules of listener '{name}' are not in ascending priority order"
            )));
        }
        let matchers = rules
            .iter()
            .map(|rule| {
                rule.path_patterns
                    .iter()
                    .map(|p| PathGlob::new(p))
                    .collect::<TopologyResult<Vec<_>>>()
            })
            .collect::<TopologyResult<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            port: HTTPS_PORT,
            protocol: Protocol::Https,
            certificate_arn: certificate_arn.to_string(),
            ssl_policy: SSL_POLICY.to_string(),
            internet_facing,
            rules,
            default_target: default_target.to_string(),
            matchers,
        })
    }

    /// The rule a request would hit, if any.
    pub fn matching_rule(&self, method: HttpMethod, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .zip(&self.matchers)
            .find(|(rule, globs)| {
                rule.http_methods.contains(&method) && globs.iter().any(|g| g.matches(path))
            })
            .map(|(rule, _)| rule)
    }

    /// Target group a request is forwarded to.
    pub fn dispatch(&self, method: HttpMethod, path: &str) -> &str {
        match self.matching_rule(method, path) {
            Some(rule) => {
                trace!(%method, path, rule = %rule.name, "rule matched");
                &rule.target_group
            }
            None => &self.default_target,
        }
    }
}
