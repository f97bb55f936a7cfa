//! Domain-partitioned role managers
//!
//! Links are stored per domain (`""` when no domain is given). A query for
//! a domain runs against a role manager built from that domain's links
//! plus, when a domain matching function is installed, the links of every
//! other domain pattern the requested domain matches.
//!
//! - [`UncachedDomainManager`] rebuilds that role manager on every query.
//! - [`DomainManager`] materializes it once per domain and keeps it in sync
//!   as links change.
//!
//! Unlike the plain [`RoleManager`], deleting a link that was never added
//! to a domain is an error.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{RoleManagerConfig, DEFAULT_MAX_HIERARCHY_LEVEL};
use crate::error::{RbacError, Result};
use crate::graph::RoleGraph;
use crate::manager::RoleManager;
use crate::matching::{guarded_match, MatchingFn};
use crate::role::Link;

/// Normalizes a variadic domain argument: none is `""`, one is itself, and
/// more than one is an error
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::resolve_domain;
///
/// assert_eq!(resolve_domain(&[]).unwrap(), "");
/// assert_eq!(resolve_domain(&["tenant-a"]).unwrap(), "tenant-a");
/// assert!(resolve_domain(&["a", "b"]).is_err());
/// ```
pub fn resolve_domain<'a>(domains: &[&'a str]) -> Result<&'a str> {
    match domains {
        [] => Ok(""),
        [domain] => Ok(domain),
        more => Err(RbacError::DomainArity(more.len())),
    }
}

/// Per-domain link log shared by the domain manager variants
#[derive(Clone, Default)]
pub(crate) struct DomainLinks {
    links: IndexMap<String, Vec<Link>>,
}

impl DomainLinks {
    pub(crate) fn get(&self, domain: &str) -> &[Link] {
        self.links.get(domain).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.links.clear();
    }

    pub(crate) fn record(&mut self, name1: &str, name2: &str, domain: &str) {
        self.links
            .entry(domain.to_string())
            .or_default()
            .push(Link::new(name1, name2));
    }

    /// Removes the first matching link, failing if the domain never had it
    pub(crate) fn remove(&mut self, name1: &str, name2: &str, domain: &str) -> Result<()> {
        let links = self.links.entry(domain.to_string()).or_default();
        let pos = links
            .iter()
            .position(|link| link.is(name1, name2))
            .ok_or_else(|| RbacError::link_not_found(name1, name2, domain))?;
        links.remove(pos);
        Ok(())
    }

    /// Links of `domain` followed by those of every other domain it matches
    pub(crate) fn visible_from(
        &self,
        domain: &str,
        domain_matching_func: Option<&MatchingFn>,
    ) -> Vec<&Link> {
        let mut visible: Vec<&Link> = self.get(domain).iter().collect();
        if let Some(func) = domain_matching_func {
            for (other, links) in &self.links {
                if other != domain && guarded_match(func, domain, other) {
                    visible.extend(links);
                }
            }
        }
        visible
    }
}

/// Domain manager that builds a fresh role manager for every query
///
/// Always consistent with the link log, at the cost of replaying the
/// domain's links on each call.
#[derive(Clone)]
pub struct UncachedDomainManager {
    max_hierarchy_level: usize,
    matching_func: Option<MatchingFn>,
    domain_matching_func: Option<MatchingFn>,
    all_links: DomainLinks,
}

impl UncachedDomainManager {
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            max_hierarchy_level,
            matching_func: None,
            domain_matching_func: None,
            all_links: DomainLinks::default(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        config.validate()?;
        let mut dm = Self::new(config.max_hierarchy_level);
        dm.matching_func = config.matching_func();
        dm.domain_matching_func = config.domain_matching_func();
        Ok(dm)
    }

    /// Links recorded directly under `domain`
    pub fn links(&self, domain: &str) -> &[Link] {
        self.all_links.get(domain)
    }

    /// Builds the role manager answering queries for `domain`
    pub fn role_manager(&self, domain: &str) -> RoleManager {
        let links = self
            .all_links
            .visible_from(domain, self.domain_matching_func.as_ref());
        RoleManager::from_links(self.max_hierarchy_level, self.matching_func.clone(), links)
    }

    fn domain_matches(&self, domain: &str, pattern: &str) -> bool {
        match &self.domain_matching_func {
            Some(func) => domain == pattern || guarded_match(func, domain, pattern),
            None => domain == pattern,
        }
    }
}

impl Default for UncachedDomainManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIERARCHY_LEVEL)
    }
}

impl RoleGraph for UncachedDomainManager {
    fn clear(&mut self) {
        self.all_links.clear();
    }

    fn add_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        self.all_links.record(name1, name2, domain.unwrap_or_default());
        Ok(())
    }

    fn delete_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        self.all_links.remove(name1, name2, domain.unwrap_or_default())
    }

    fn has_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool> {
        self.role_manager(domain.unwrap_or_default())
            .has_link(name1, name2, None)
    }

    fn get_roles(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.role_manager(domain.unwrap_or_default())
            .get_roles(name, None)
    }

    fn get_users(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.role_manager(domain.unwrap_or_default())
            .get_users(name, None)
    }

    fn add_matching_func(&mut self, func: MatchingFn) {
        self.matching_func = Some(func);
    }

    fn add_domain_matching_func(&mut self, func: MatchingFn) {
        self.domain_matching_func = Some(func);
    }

    fn print_roles(&self) {}
}

/// Domain manager caching one role manager per queried domain
///
/// Link mutations are recorded in the log and replayed into every cached
/// role manager whose domain matches the affected domain. Domains nobody
/// has queried yet are only materialized on first use.
///
/// # Example
///
/// ```rust
/// use rolegraph_core::{DomainManager, RoleGraph};
///
/// let mut dm = DomainManager::new(10);
/// dm.add_link("alice", "admin", Some("tenant-a")).unwrap();
///
/// assert!(dm.has_link("alice", "admin", Some("tenant-a")).unwrap());
/// assert!(!dm.has_link("alice", "admin", Some("tenant-b")).unwrap());
/// assert!(dm.delete_link("alice", "admin", Some("tenant-b")).is_err());
/// ```
#[derive(Clone, Default)]
pub struct DomainManager {
    base: UncachedDomainManager,
    rm_map: IndexMap<String, RoleManager>,
}

impl DomainManager {
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            base: UncachedDomainManager::new(max_hierarchy_level),
            rm_map: IndexMap::new(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        Ok(Self {
            base: UncachedDomainManager::from_config(config)?,
            rm_map: IndexMap::new(),
        })
    }

    /// Domains whose role manager has been materialized
    pub fn cached_domains(&self) -> Vec<&str> {
        self.rm_map.keys().map(String::as_str).collect()
    }

    pub fn links(&self, domain: &str) -> &[Link] {
        self.base.links(domain)
    }

    fn role_manager(&mut self, domain: &str) -> &mut RoleManager {
        if !self.rm_map.contains_key(domain) {
            debug!(domain, "materializing domain role manager");
            let rm = self.base.role_manager(domain);
            self.rm_map.insert(domain.to_string(), rm);
        }
        &mut self.rm_map[domain]
    }

    /// Cached role managers that must observe a change to `domain`
    fn affected_role_managers(&mut self, domain: &str) -> Vec<&mut RoleManager> {
        let base = &self.base;
        self.rm_map
            .iter_mut()
            .filter(|(cached, _)| base.domain_matches(cached, domain))
            .map(|(_, rm)| rm)
            .collect()
    }

    fn rebuild(&mut self) {
        self.rm_map.clear();
    }
}

impl RoleGraph for DomainManager {
    fn clear(&mut self) {
        self.base.clear();
        self.rm_map.clear();
    }

    fn add_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        self.base.add_link(name1, name2, Some(domain))?;
        debug!(user = name1, role = name2, domain, "add domain link");
        for rm in self.affected_role_managers(domain) {
            rm.link(name1, name2);
        }
        Ok(())
    }

    fn delete_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        self.base.delete_link(name1, name2, Some(domain))?;
        debug!(user = name1, role = name2, domain, "deleted domain link");
        for rm in self.affected_role_managers(domain) {
            rm.unlink(name1, name2);
        }
        Ok(())
    }

    fn has_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool> {
        self.role_manager(domain.unwrap_or_default())
            .has_link(name1, name2, None)
    }

    fn get_roles(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.role_manager(domain.unwrap_or_default())
            .get_roles(name, None)
    }

    fn get_users(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.role_manager(domain.unwrap_or_default())
            .get_users(name, None)
    }

    fn add_matching_func(&mut self, func: MatchingFn) {
        self.base.add_matching_func(func.clone());
        for rm in self.rm_map.values_mut() {
            rm.add_matching_func(func.clone());
        }
    }

    /// Domain grouping changed, so every cached manager is dropped
    fn add_domain_matching_func(&mut self, func: MatchingFn) {
        self.base.add_domain_matching_func(func);
        self.rebuild();
    }

    fn print_roles(&self) {
        for (domain, rm) in &self.rm_map {
            info!(target: "rolegraph::role", "{}: {}", domain, rm);
        }
    }
}
