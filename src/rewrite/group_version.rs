//! Group-version identifiers.
//!
//! # Format
//! - `"<group>/<version>"` for grouped APIs (e.g. `openshift.org/v1`)
//! - `"<version>"` for the ungrouped core API (e.g. `v1`)
//!
//! # Design Decisions
//! - Split on the first slash only; a second slash is malformed
//! - An empty group renders as the bare version

use std::fmt;
use std::str::FromStr;

use crate::rewrite::RewriteError;

/// A parsed `apiVersion` value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Same version, different group.
    pub fn with_group(self, group: &str) -> Self {
        Self {
            group: group.to_string(),
            version: self.version,
        }
    }
}

impl FromStr for GroupVersion {
    type Err = RewriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            None => Ok(Self::new("", s)),
            Some((_, version)) if version.contains('/') => {
                Err(RewriteError::GroupFormat(format!(
                    "unexpected GroupVersion string: {}",
                    s
                )))
            }
            Some((group, version)) => Ok(Self::new(group, version)),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}
