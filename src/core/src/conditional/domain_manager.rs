//! Domain-partitioned conditional role manager

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{RoleManagerConfig, DEFAULT_MAX_HIERARCHY_LEVEL};
use crate::domain::DomainLinks;
use crate::error::Result;
use crate::graph::{ConditionalRoleGraph, LinkConditionFn, RoleGraph};
use crate::matching::MatchingFn;

use super::ConditionalRoleManager;

/// One [`ConditionalRoleManager`] per domain
///
/// Link mutations go to the exact domain's manager, which is materialized
/// (and kept) on first mutation by replaying that domain's links and those
/// of the domain patterns it matches. Queries against a domain that was
/// never materialized run on a throwaway manager.
///
/// Condition setters only reach managers that already exist when they are
/// called; a domain materialized afterwards starts without conditions.
/// A new matching function rebuilds every materialized manager and drops
/// its conditions, as with [`ConditionalRoleManager`].
///
/// Unlike the plain [`RoleManager`](crate::RoleManager), deleting a link
/// that was never added to the domain fails with
/// [`RbacError::LinkNotFound`](crate::RbacError::LinkNotFound), the same
/// as [`DomainManager`](crate::DomainManager).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rolegraph_core::{
///     ConditionalDomainManager, ConditionalRoleGraph, LinkConditionFn, RoleGraph,
/// };
///
/// let mut dm = ConditionalDomainManager::new(10);
/// dm.add_link("alice", "admin", Some("tenant-a")).unwrap();
/// let deny: LinkConditionFn = Arc::new(|_: &[String]| Ok(false));
/// dm.add_domain_link_condition_func("alice", "admin", "tenant-a", deny);
///
/// assert!(!dm.has_link("alice", "admin", Some("tenant-a")).unwrap());
/// ```
#[derive(Clone)]
pub struct ConditionalDomainManager {
    max_hierarchy_level: usize,
    matching_func: Option<MatchingFn>,
    domain_matching_func: Option<MatchingFn>,
    all_links: DomainLinks,
    rm_map: IndexMap<String, ConditionalRoleManager>,
}

impl ConditionalDomainManager {
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            max_hierarchy_level,
            matching_func: None,
            domain_matching_func: None,
            all_links: DomainLinks::default(),
            rm_map: IndexMap::new(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        config.validate()?;
        let mut dm = Self::new(config.max_hierarchy_level);
        dm.matching_func = config.matching_func();
        dm.domain_matching_func = config.domain_matching_func();
        Ok(dm)
    }

    /// Domains whose role manager has been materialized
    pub fn cached_domains(&self) -> Vec<&str> {
        self.rm_map.keys().map(String::as_str).collect()
    }

    fn build_role_manager(&self, domain: &str) -> ConditionalRoleManager {
        let links = self
            .all_links
            .visible_from(domain, self.domain_matching_func.as_ref());
        ConditionalRoleManager::from_links(
            self.max_hierarchy_level,
            self.matching_func.clone(),
            links,
        )
    }

    fn stored_role_manager(&mut self, domain: &str) -> &mut ConditionalRoleManager {
        if !self.rm_map.contains_key(domain) {
            debug!(domain, "materializing conditional domain role manager");
            let rm = self.build_role_manager(domain);
            self.rm_map.insert(domain.to_string(), rm);
        }
        &mut self.rm_map[domain]
    }
}

impl Default for ConditionalDomainManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIERARCHY_LEVEL)
    }
}

impl RoleGraph for ConditionalDomainManager {
    fn clear(&mut self) {
        self.all_links.clear();
        self.rm_map.clear();
    }

    fn add_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        let cached = self.rm_map.contains_key(domain);
        self.all_links.record(name1, name2, domain);

        // A freshly built manager already replays the new link
        let rm = self.stored_role_manager(domain);
        if cached {
            rm.link(name1, name2);
        }
        Ok(())
    }

    fn delete_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        let cached = self.rm_map.contains_key(domain);
        self.all_links.remove(name1, name2, domain)?;

        let rm = self.stored_role_manager(domain);
        if cached {
            rm.unlink(name1, name2);
        }
        Ok(())
    }

    fn has_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool> {
        let domain = domain.unwrap_or_default();
        match self.rm_map.get_mut(domain) {
            Some(rm) => rm.has_link(name1, name2, Some(domain)),
            None => self
                .build_role_manager(domain)
                .has_link(name1, name2, Some(domain)),
        }
    }

    fn get_roles(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        let domain = domain.unwrap_or_default();
        self.stored_role_manager(domain).get_roles(name, None)
    }

    fn get_users(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        let domain = domain.unwrap_or_default();
        self.stored_role_manager(domain).get_users(name, None)
    }

    fn add_matching_func(&mut self, func: MatchingFn) {
        self.matching_func = Some(func.clone());
        for rm in self.rm_map.values_mut() {
            rm.add_matching_func(func.clone());
        }
    }

    /// Domain grouping changed, so every materialized manager (and the
    /// conditions attached to it) is dropped
    fn add_domain_matching_func(&mut self, func: MatchingFn) {
        self.domain_matching_func = Some(func);
        self.rm_map.clear();
    }

    fn print_roles(&self) {
        for (domain, rm) in &self.rm_map {
            info!(target: "rolegraph::role", "{}: {}", domain, rm);
        }
    }
}

impl ConditionalRoleGraph for ConditionalDomainManager {
    fn add_link_condition_func(&mut self, user: &str, role: &str, func: LinkConditionFn) {
        for rm in self.rm_map.values_mut() {
            rm.add_link_condition_func(user, role, func.clone());
        }
    }

    fn add_domain_link_condition_func(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        func: LinkConditionFn,
    ) {
        for rm in self.rm_map.values_mut() {
            rm.add_domain_link_condition_func(user, role, domain, func.clone());
        }
    }

    fn set_link_condition_func_params(&mut self, user: &str, role: &str, params: Vec<String>) {
        for rm in self.rm_map.values_mut() {
            rm.set_link_condition_func_params(user, role, params.clone());
        }
    }

    fn set_domain_link_condition_func_params(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        params: Vec<String>,
    ) {
        for rm in self.rm_map.values_mut() {
            rm.set_domain_link_condition_func_params(user, role, domain, params.clone());
        }
    }
}
