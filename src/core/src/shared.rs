//! Thread-safe caching domain manager
//!
//! Each domain's role graph is independent state, so every materialized
//! [`RoleManager`] sits behind its own `RwLock` inside a `DashMap`: queries
//! on different domains never contend and queries on the same domain share
//! a read lock. Mutations serialize on the link log, which is always locked
//! before any domain graph.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::{RoleManagerConfig, DEFAULT_MAX_HIERARCHY_LEVEL};
use crate::domain::DomainLinks;
use crate::error::Result;
use crate::graph::RoleGraph;
use crate::manager::RoleManager;
use crate::matching::{guarded_match, MatchingFn};

type SharedRoleManager = Arc<RwLock<RoleManager>>;

/// Caching domain manager usable through `&self` from many threads
///
/// Same contract as [`DomainManager`](crate::DomainManager), including the
/// error on deleting a link that was never added.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rolegraph_core::SharedDomainManager;
///
/// let dm = Arc::new(SharedDomainManager::new(10));
/// dm.add_link("alice", "admin", Some("tenant-a")).unwrap();
///
/// let reader = dm.clone();
/// std::thread::spawn(move || {
///     assert!(reader.has_link("alice", "admin", Some("tenant-a")).unwrap());
/// })
/// .join()
/// .unwrap();
/// ```
pub struct SharedDomainManager {
    max_hierarchy_level: usize,
    matching_func: RwLock<Option<MatchingFn>>,
    domain_matching_func: RwLock<Option<MatchingFn>>,
    all_links: RwLock<DomainLinks>,
    rm_map: DashMap<String, SharedRoleManager>,
}

impl SharedDomainManager {
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            max_hierarchy_level,
            matching_func: RwLock::new(None),
            domain_matching_func: RwLock::new(None),
            all_links: RwLock::new(DomainLinks::default()),
            rm_map: DashMap::new(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        config.validate()?;
        let dm = Self::new(config.max_hierarchy_level);
        *dm.matching_func.write() = config.matching_func();
        *dm.domain_matching_func.write() = config.domain_matching_func();
        Ok(dm)
    }

    /// Domains whose role manager has been materialized
    pub fn cached_domains(&self) -> Vec<String> {
        self.rm_map.iter().map(|entry| entry.key().clone()).collect()
    }

    fn role_manager(&self, domain: &str) -> SharedRoleManager {
        if let Some(rm) = self.rm_map.get(domain) {
            return rm.clone();
        }

        let links = self.all_links.read();
        self.rm_map
            .entry(domain.to_string())
            .or_insert_with(|| {
                debug!(domain, "materializing shared domain role manager");
                let domain_matching_func = self.domain_matching_func.read().clone();
                let visible = links.visible_from(domain, domain_matching_func.as_ref());
                let rm = RoleManager::from_links(
                    self.max_hierarchy_level,
                    self.matching_func.read().clone(),
                    visible,
                );
                Arc::new(RwLock::new(rm))
            })
            .clone()
    }

    /// Cached role managers that must observe a change to `domain`
    fn affected_role_managers(&self, domain: &str) -> Vec<SharedRoleManager> {
        let domain_matching_func = self.domain_matching_func.read().clone();
        self.rm_map
            .iter()
            .filter(|entry| {
                let cached = entry.key().as_str();
                cached == domain
                    || domain_matching_func
                        .as_ref()
                        .is_some_and(|func| guarded_match(func, cached, domain))
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut links = self.all_links.write();
        links.clear();
        self.rm_map.clear();
    }

    pub fn add_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        let mut links = self.all_links.write();
        links.record(name1, name2, domain);
        debug!(user = name1, role = name2, domain, "add shared domain link");

        for rm in self.affected_role_managers(domain) {
            rm.write().link(name1, name2);
        }
        Ok(())
    }

    pub fn delete_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        let domain = domain.unwrap_or_default();
        let mut links = self.all_links.write();
        links.remove(name1, name2, domain)?;
        debug!(user = name1, role = name2, domain, "deleted shared domain link");

        for rm in self.affected_role_managers(domain) {
            rm.write().unlink(name1, name2);
        }
        Ok(())
    }

    /// Answers under a read lock when both names are known; otherwise the
    /// names are created first, since a new role may inherit pattern links
    pub fn has_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool> {
        let rm = self.role_manager(domain.unwrap_or_default());
        {
            let graph = rm.read();
            if name1 == name2 || (graph.contains_role(name1) && graph.contains_role(name2)) {
                return Ok(graph.reachable(name1, name2));
            }
        }
        let mut graph = rm.write();
        graph.has_link(name1, name2, None)
    }

    pub fn get_roles(&self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        let rm = self.role_manager(domain.unwrap_or_default());
        {
            let graph = rm.read();
            if graph.contains_role(name) {
                return Ok(graph.roles_of(name));
            }
        }
        let mut graph = rm.write();
        graph.get_roles(name, None)
    }

    pub fn get_users(&self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        let rm = self.role_manager(domain.unwrap_or_default());
        {
            let graph = rm.read();
            if graph.contains_role(name) {
                return Ok(graph.users_of(name));
            }
        }
        let mut graph = rm.write();
        graph.get_users(name, None)
    }

    pub fn add_matching_func(&self, func: MatchingFn) {
        let _links = self.all_links.write();
        *self.matching_func.write() = Some(func.clone());
        for entry in self.rm_map.iter() {
            entry.value().write().add_matching_func(func.clone());
        }
    }

    /// Domain grouping changed, so every cached manager is dropped
    pub fn add_domain_matching_func(&self, func: MatchingFn) {
        let _links = self.all_links.write();
        *self.domain_matching_func.write() = Some(func);
        self.rm_map.clear();
    }

    pub fn print_roles(&self) {
        for entry in self.rm_map.iter() {
            info!(target: "rolegraph::role", "{}: {}", entry.key(), entry.value().read());
        }
    }
}

impl Default for SharedDomainManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIERARCHY_LEVEL)
    }
}
