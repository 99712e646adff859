//! Path glob matching for listener conditions.
//!
//! `*` matches any run of characters (including `/`), `?` matches exactly
//! one. Matching is case-sensitive and anchored at both ends.

use gridgate_core::{TopologyError, TopologyResult};
use regex::Regex;

/// A compiled path glob.
#[derive(Debug, Clone)]
pub struct PathGlob {
    pattern: String,
    regex: Regex,
}

impl PathGlob {
    pub fn new(pattern: &str) -> TopologyResult<Self> {
        if pattern.is_empty() {
            return Err(TopologyError::configuration("empty path pattern"));
        }
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for c in pattern.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            TopologyError::configuration(format!("invalid path pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}
