//! Role manager configuration

use crate::error::{RbacError, Result};
use crate::matching::{Matcher, MatchingFn};
use serde::Deserialize;

/// Hierarchy bound used when none is configured
pub const DEFAULT_MAX_HIERARCHY_LEVEL: usize = 10;

/// Settings shared by every role manager variant
///
/// ```toml
/// max_hierarchy_level = 5
/// matching = "glob"
/// domain_matching = "key_match"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleManagerConfig {
    /// Maximum number of parent hops a reachability query may follow
    pub max_hierarchy_level: usize,

    /// Built-in matcher for role names
    pub matching: Option<Matcher>,

    /// Built-in matcher for domain names
    pub domain_matching: Option<Matcher>,
}

impl Default for RoleManagerConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_level: DEFAULT_MAX_HIERARCHY_LEVEL,
            matching: None,
            domain_matching: None,
        }
    }
}

impl RoleManagerConfig {
    /// Parses and validates a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_hierarchy_level == 0 {
            return Err(RbacError::InvalidConfig(
                "max_hierarchy_level must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn matching_func(&self) -> Option<MatchingFn> {
        self.matching.map(Matcher::func)
    }

    pub fn domain_matching_func(&self) -> Option<MatchingFn> {
        self.domain_matching.map(Matcher::func)
    }
}
