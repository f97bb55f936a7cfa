//! Role manager with predicate-gated links

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::RoleManagerConfig;
use crate::error::{RbacError, Result};
use crate::graph::{ConditionalRoleGraph, LinkConditionFn, RoleGraph};
use crate::manager::RoleManager;
use crate::matching::{match_in_order, MatchOrder, MatchingFn};
use crate::role::{Link, RoleId};

/// `(user, role, domain)`; the default domain is `""`
type EdgeKey = (String, String, String);

fn edge_key(user: &str, role: &str, domain: &str) -> EdgeKey {
    (user.to_string(), role.to_string(), domain.to_string())
}

/// Role manager whose links may carry condition functions
///
/// The graph itself is a plain [`RoleManager`]; conditions and their
/// parameters live in side tables keyed by role names and domain. They
/// belong to the role nodes, so both `clear` and the rebuild triggered by a
/// new matching function drop them together with the graph.
#[derive(Clone, Default)]
pub struct ConditionalRoleManager {
    graph: RoleManager,
    conditions: HashMap<EdgeKey, LinkConditionFn>,
    params: HashMap<EdgeKey, Vec<String>>,
}

impl ConditionalRoleManager {
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            graph: RoleManager::new(max_hierarchy_level),
            conditions: HashMap::new(),
            params: HashMap::new(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        Ok(Self {
            graph: RoleManager::from_config(config)?,
            conditions: HashMap::new(),
            params: HashMap::new(),
        })
    }

    pub(crate) fn from_links<'a>(
        max_hierarchy_level: usize,
        matching_func: Option<MatchingFn>,
        links: impl IntoIterator<Item = &'a Link>,
    ) -> Self {
        Self {
            graph: RoleManager::from_links(max_hierarchy_level, matching_func, links),
            conditions: HashMap::new(),
            params: HashMap::new(),
        }
    }

    /// The unconditional graph underneath
    pub fn graph(&self) -> &RoleManager {
        &self.graph
    }

    pub(crate) fn link(&mut self, name1: &str, name2: &str) {
        self.graph.link(name1, name2);
    }

    pub(crate) fn unlink(&mut self, name1: &str, name2: &str) -> bool {
        self.graph.unlink(name1, name2)
    }

    /// Condition attached to `user -> role` in `domain`, if any
    pub fn link_condition_func(
        &self,
        user: &str,
        role: &str,
        domain: &str,
    ) -> Option<LinkConditionFn> {
        self.conditions.get(&edge_key(user, role, domain)).cloned()
    }

    /// Parameters stored for `user -> role` in `domain`; empty when unset
    pub fn link_condition_func_params(&self, user: &str, role: &str, domain: &str) -> &[String] {
        self.params
            .get(&edge_key(user, role, domain))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn name_matches(&self, name: &str, target: &str) -> bool {
        name == target
            || self
                .graph
                .matching_func
                .as_ref()
                .is_some_and(|func| match_in_order(func, name, target, MatchOrder::StrPattern))
    }

    /// Evaluates the gate on `user -> role`; links without a condition pass
    fn passes(&self, user: RoleId, role: RoleId, domain: &str) -> Result<bool> {
        let user = self.graph.all_roles.name(user);
        let role = self.graph.all_roles.name(role);

        let Some(func) = self.conditions.get(&edge_key(user, role, domain)) else {
            return Ok(true);
        };

        let params = self.link_condition_func_params(user, role, domain);
        func(params).map_err(|source| RbacError::LinkCondition {
            user: user.to_string(),
            role: role.to_string(),
            domain: domain.to_string(),
            source,
        })
    }

    /// Breadth-first search matching the target by name at every level and
    /// following only links whose gate passes
    fn reaches(&self, user: RoleId, target: &str, domain: &str) -> Result<bool> {
        let mut visited = HashSet::from([user]);
        let mut frontier = vec![user];

        for _ in 0..=self.graph.max_hierarchy_level {
            if frontier
                .iter()
                .any(|&id| self.name_matches(self.graph.all_roles.name(id), target))
            {
                return Ok(true);
            }

            let mut next = Vec::new();
            for &id in &frontier {
                for &parent in &self.graph.all_roles.get(id).roles {
                    // A visited role is already reachable, so its incoming
                    // gates are not evaluated again
                    if visited.contains(&parent) {
                        continue;
                    }
                    if self.passes(id, parent, domain)? {
                        visited.insert(parent);
                        next.push(parent);
                    }
                }
            }

            if next.is_empty() {
                return Ok(false);
            }
            frontier = next;
        }
        Ok(false)
    }
}

impl fmt::Debug for ConditionalRoleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalRoleManager")
            .field("graph", &self.graph)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

impl fmt::Display for ConditionalRoleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.graph, f)
    }
}

impl RoleGraph for ConditionalRoleManager {
    fn clear(&mut self) {
        self.graph.clear();
        self.conditions.clear();
        self.params.clear();
    }

    fn add_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        self.graph.add_link(name1, name2, domain)
    }

    fn delete_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<()> {
        self.graph.delete_link(name1, name2, domain)
    }

    /// With a domain, only that domain's conditions gate the search; there
    /// is no fallback to the default domain
    fn has_link(&mut self, name1: &str, name2: &str, domain: Option<&str>) -> Result<bool> {
        if self.name_matches(name1, name2) {
            return Ok(true);
        }

        let user = self.graph.get_role(name1);
        self.graph.get_role(name2);
        self.reaches(user, name2, domain.unwrap_or_default())
    }

    fn get_roles(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.graph.get_roles(name, domain)
    }

    fn get_users(&mut self, name: &str, domain: Option<&str>) -> Result<Vec<String>> {
        self.graph.get_users(name, domain)
    }

    /// Rebuilds the graph from the link log; conditions and params attached
    /// before the rebuild are discarded with the old role nodes
    fn add_matching_func(&mut self, func: MatchingFn) {
        self.graph.add_matching_func(func);
        self.conditions.clear();
        self.params.clear();
    }

    fn add_domain_matching_func(&mut self, func: MatchingFn) {
        self.graph.add_domain_matching_func(func);
    }

    fn print_roles(&self) {
        self.graph.print_roles();
    }
}

impl ConditionalRoleGraph for ConditionalRoleManager {
    fn add_link_condition_func(&mut self, user: &str, role: &str, func: LinkConditionFn) {
        self.add_domain_link_condition_func(user, role, "", func);
    }

    fn add_domain_link_condition_func(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        func: LinkConditionFn,
    ) {
        self.graph.get_role(user);
        self.graph.get_role(role);
        self.conditions.insert(edge_key(user, role, domain), func);
    }

    fn set_link_condition_func_params(&mut self, user: &str, role: &str, params: Vec<String>) {
        self.set_domain_link_condition_func_params(user, role, "", params);
    }

    fn set_domain_link_condition_func_params(
        &mut self,
        user: &str,
        role: &str,
        domain: &str,
        params: Vec<String>,
    ) {
        self.graph.get_role(user);
        self.graph.get_role(role);
        self.params.insert(edge_key(user, role, domain), params);
    }
}
