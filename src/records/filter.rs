//! Username filter for `apply-users --filter`.

use crate::error::{Result, UserPoolError};
use regex::Regex;

/// Compiled username pattern. An absent pattern matches every username.
#[derive(Debug, Clone, Default)]
pub struct UsernameFilter {
    pattern: Option<Regex>,
}

impl UsernameFilter {
    /// Compile an optional pattern. `None` and `""` both match everything.
    pub fn compile(pattern: Option<&str>) -> Result<Self> {
        let pattern = match pattern {
            Some(p) if !p.is_empty() => Some(Regex::new(p).map_err(|e| {
                UserPoolError::Validation(format!("invalid filter pattern '{}': {}", p, e))
            })?),
            _ => None,
        };
        Ok(Self { pattern })
    }

    pub fn matches(&self, username: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |re| re.is_match(username))
    }
}
