//! Error types for the role managers

use thiserror::Error;

/// Result type alias for role manager operations
pub type Result<T> = std::result::Result<T, RbacError>;

/// Errors raised by role managers
///
/// Unknown role or user names are never an error: they are treated as
/// isolated, freshly created roles. Matching functions never produce errors
/// either (a panicking matcher counts as "no match").
#[derive(Debug, Error)]
pub enum RbacError {
    /// More than one domain value was supplied where at most one is accepted
    #[error("domain should be 1 parameter, got {0}")]
    DomainArity(usize),

    /// A domain manager was asked to delete a link it never recorded
    #[error("link between {user} and {role} does not exist in domain '{domain}'")]
    LinkNotFound {
        user: String,
        role: String,
        domain: String,
    },

    /// A link condition function failed while evaluating an edge
    #[error("link condition for {user} -> {role} (domain '{domain}') failed: {source}")]
    LinkCondition {
        user: String,
        role: String,
        domain: String,
        #[source]
        source: anyhow::Error,
    },

    /// Grouping rule that cannot be turned into a link
    #[error("invalid grouping rule: {0}")]
    InvalidRule(String),

    /// Configuration that fails validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed configuration document
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl RbacError {
    pub(crate) fn link_not_found(user: &str, role: &str, domain: &str) -> Self {
        RbacError::LinkNotFound {
            user: user.to_string(),
            role: role.to_string(),
            domain: domain.to_string(),
        }
    }
}
