//! Capability traits shared by every role manager variant
//!
//! A policy engine holds a `Box<dyn RoleGraph>` and never needs to know
//! whether links are domain-scoped, cached, or gated by conditions.

use crate::error::Result;
use crate::matching::MatchingFn;
use std::sync::Arc;

/// Predicate gating a conditional link, called with the link's stored
/// parameters at query time
///
/// Parameters are positional and carried as strings; a predicate parses
/// whatever typed values it needs and reports bad input as an error.
pub type LinkConditionFn = Arc<dyn Fn(&[String]) -> anyhow::Result<bool> + Send + Sync>;

/// Role inheritance graph
///
/// `domain` is `None` for the default domain (`""`). Managers that are not
/// domain-aware ignore it.
pub trait RoleGraph: Send + Sync {
    /// Drops every role and link
    fn clear(&mut self);

    /// Records that `name1` has role `name2`
    fn add_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()>;

    /// Removes a link previously added with the same arguments
    fn delete_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()>;

    /// Whether `name1` inherits `name2` within the hierarchy bound
    fn has_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool>;

    /// Direct parents of `name`
    fn get_roles(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>>;

    /// Direct children of `name`
    fn get_users(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>>;

    /// Installs the role name matching function
    fn add_matching_func(&mut self, func: MatchingFn);

    /// Installs the domain matching function
    fn add_domain_matching_func(&mut self, func: MatchingFn);

    /// Logs a human readable dump of the graph
    fn print_roles(&self);
}

/// Role graph whose links may be gated by predicates
pub trait ConditionalRoleGraph: RoleGraph {
    /// Attaches `func` to the link `user -> role` in the default domain
    fn add_link_condition_func(&mut self, user: &str, role: &str, func: LinkConditionFn);

    /// Attaches `func` to the link `user -> role` in `domain`
    fn add_domain_link_condition_func(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        func: LinkConditionFn,
    );

    /// Stores the arguments passed to the default-domain condition
    fn set_link_condition_func_params(&mut self, user: &str, role: &str, params: Vec<String>);

    /// Stores the arguments passed to the condition in `domain`
    fn set_domain_link_condition_func_params(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        params: Vec<String>,
    );
}
