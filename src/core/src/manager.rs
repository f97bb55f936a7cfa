//! Default role manager
//!
//! Keeps a directed graph where an edge `user -> role` means "user has
//! role" and answers bounded reachability queries over it.
//!
//! # Pattern roles
//!
//! With a matching function installed, roles whose names are patterns act
//! as bridges: a role created after a pattern was linked inherits the
//! pattern's edges, and every link added to or from a pattern is also
//! wired into each existing role the pattern matches. Changing the matching
//! function replays the whole link log, since the set of bridged roles
//! cannot be patched incrementally.
//!
//! # Example
//!
//! ```rust
//! use rolegraph_core::{RoleGraph, RoleManager};
//!
//! let mut rm = RoleManager::new(10);
//! rm.add_link("alice", "admin", None).unwrap();
//! rm.add_link("admin", "superuser", None).unwrap();
//!
//! assert!(rm.has_link("alice", "superuser", None).unwrap());
//! assert!(!rm.has_link("superuser", "alice", None).unwrap());
//! assert_eq!(rm.get_roles("alice", None).unwrap(), vec!["admin"]);
//! ```

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info};

use crate::config::{RoleManagerConfig, DEFAULT_MAX_HIERARCHY_LEVEL};
use crate::error::Result;
use crate::graph::RoleGraph;
use crate::matching::{match_in_order, MatchOrder, MatchingFn};
use crate::role::{Link, RoleArena, RoleId};

/// Role manager for a single scope
#[derive(Clone)]
pub struct RoleManager {
    pub(crate) max_hierarchy_level: usize,
    pub(crate) matching_func: Option<MatchingFn>,
    domain_matching_func: Option<MatchingFn>,
    pub(crate) all_roles: RoleArena,
    all_links: Vec<Link>,
}

impl RoleManager {
    /// Creates an empty manager bounded to `max_hierarchy_level` hops
    pub fn new(max_hierarchy_level: usize) -> Self {
        Self {
            max_hierarchy_level,
            matching_func: None,
            domain_matching_func: None,
            all_roles: RoleArena::default(),
            all_links: Vec::new(),
        }
    }

    pub fn from_config(config: &RoleManagerConfig) -> Result<Self> {
        config.validate()?;
        let mut rm = Self::new(config.max_hierarchy_level);
        rm.matching_func = config.matching_func();
        rm.domain_matching_func = config.domain_matching_func();
        Ok(rm)
    }

    /// Builds a manager by replaying `links` under `matching_func`
    pub(crate) fn from_links<'a>(
        max_hierarchy_level: usize,
        matching_func: Option<MatchingFn>,
        links: impl IntoIterator<Item = &'a Link>,
    ) -> Self {
        let mut rm = Self::new(max_hierarchy_level);
        rm.matching_func = matching_func;
        for link in links {
            rm.link(&link.user, &link.role);
        }
        rm
    }

    pub fn max_hierarchy_level(&self) -> usize {
        self.max_hierarchy_level
    }

    /// Every link added and not deleted, in insertion order
    pub fn links(&self) -> &[Link] {
        &self.all_links
    }

    /// Number of roles materialized so far
    pub fn role_count(&self) -> usize {
        self.all_roles.len()
    }

    pub fn contains_role(&self, name: &str) -> bool {
        self.all_roles.id(name).is_some()
    }

    /// Looks up a role, creating it on first reference
    ///
    /// A new role copies the edges of every existing pattern role its name
    /// matches, so late-created literals still inherit pattern links.
    pub(crate) fn get_role(&mut self, name: &str) -> RoleId {
        if let Some(id) = self.all_roles.id(name) {
            return id;
        }

        let id = self.all_roles.insert(name);
        if let Some(func) = &self.matching_func {
            let patterns: Vec<RoleId> = self
                .all_roles
                .ids()
                .filter(|&other| other != id)
                .filter(|&other| {
                    match_in_order(func, name, self.all_roles.name(other), MatchOrder::StrPattern)
                })
                .collect();

            for pattern in patterns {
                self.all_roles.copy_edges(id, pattern);
            }
        }
        id
    }

    fn rebuild(&mut self) {
        let links = std::mem::take(&mut self.all_links);
        self.all_roles.clear();
        debug!(links = links.len(), "rebuilding role graph");
        for link in &links {
            self.link(&link.user, &link.role);
        }
    }

    /// Roles other than `user` and `role` that match `pattern`
    fn matched_by(
        &self,
        func: &MatchingFn,
        pattern: &str,
        user: RoleId,
        role: RoleId,
    ) -> Vec<RoleId> {
        self.all_roles
            .ids()
            .filter(|&r| r != user && r != role)
            .filter(|&r| {
                match_in_order(func, pattern, self.all_roles.name(r), MatchOrder::PatternStr)
            })
            .collect()
    }

    pub(crate) fn link(&mut self, name1: &str, name2: &str) {
        self.all_links.push(Link::new(name1, name2));

        let user = self.get_role(name1);
        let role = self.get_role(name2);
        self.all_roles.add_edge(user, role);

        if let Some(func) = self.matching_func.clone() {
            for r in self.matched_by(&func, name1, user, role) {
                self.all_roles.add_edge(r, role);
            }
            for r in self.matched_by(&func, name2, user, role) {
                self.all_roles.add_edge(role, r);
            }
        }
    }

    pub(crate) fn unlink(&mut self, name1: &str, name2: &str) -> bool {
        let Some(pos) = self.all_links.iter().position(|link| link.is(name1, name2)) else {
            return false;
        };
        self.all_links.remove(pos);

        let user = self.get_role(name1);
        let role = self.get_role(name2);
        self.all_roles.remove_edge(user, role);

        if let Some(func) = self.matching_func.clone() {
            for r in self.matched_by(&func, name1, user, role) {
                self.all_roles.remove_edge(r, role);
            }
            for r in self.matched_by(&func, name2, user, role) {
                self.all_roles.remove_edge(role, r);
            }
        }
        true
    }

    /// Breadth-first search from `name1` toward `name2` without creating
    /// roles; an unknown name is an isolated role
    pub fn reachable(&self, name1: &str, name2: &str) -> bool {
        if name1 == name2 {
            return true;
        }
        match (self.all_roles.id(name1), self.all_roles.id(name2)) {
            (Some(user), Some(target)) => self.reaches(user, target),
            _ => false,
        }
    }

    /// Checks frontiers at depth `0..=max_hierarchy_level`
    fn reaches(&self, user: RoleId, target: RoleId) -> bool {
        let mut visited = HashSet::from([user]);
        let mut frontier = vec![user];

        for _ in 0..=self.max_hierarchy_level {
            if frontier.contains(&target) {
                return true;
            }

            let mut next = Vec::new();
            for id in frontier {
                for &parent in &self.all_roles.get(id).roles {
                    if visited.insert(parent) {
                        next.push(parent);
                    }
                }
            }

            if next.is_empty() {
                return false;
            }
            frontier = next;
        }
        false
    }

    /// Direct parents of `name` without creating it
    pub fn roles_of(&self, name: &str) -> Vec<String> {
        self.all_roles
            .id(name)
            .map(|id| self.all_roles.parent_names(id))
            .unwrap_or_default()
    }

    /// Direct children of `name` without creating it
    pub fn users_of(&self, name: &str) -> Vec<String> {
        self.all_roles
            .id(name)
            .map(|id| self.all_roles.child_names(id))
            .unwrap_or_default()
    }
}

impl Default for RoleManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIERARCHY_LEVEL)
    }
}

impl fmt::Debug for RoleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleManager")
            .field("max_hierarchy_level", &self.max_hierarchy_level)
            .field("matching_func", &self.matching_func.is_some())
            .field("domain_matching_func", &self.domain_matching_func.is_some())
            .field("roles", &self.all_roles.len())
            .field("links", &self.all_links.len())
            .finish()
    }
}

/// Comma-separated `role < parents` descriptions of every role with parents
impl fmt::Display for RoleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .all_roles
            .ids()
            .map(|id| self.all_roles.describe(id))
            .filter(|line| !line.is_empty())
            .collect();
        f.write_str(&lines.join(", "))
    }
}

impl RoleGraph for RoleManager {
    fn clear(&mut self) {
        self.all_roles.clear();
        self.all_links.clear();
    }

    fn add_link(&mut self, name1: &str, name2: &str, _domain: Option<&str>) -> Result<()> {
        debug!(user = name1, role = name2, "add link");
        self.link(name1, name2);
        Ok(())
    }

    /// Silently ignores links that were never added
    fn delete_link(&mut self, name1: &str, name2: &str, _domain: Option<&str>) -> Result<()> {
        if self.unlink(name1, name2) {
            debug!(user = name1, role = name2, "deleted link");
        }
        Ok(())
    }

    fn has_link(&mut self, name1: &str, name2: &str, _domain: Option<&str>) -> Result<bool> {
        let user = self.get_role(name1);
        let target = self.get_role(name2);
        Ok(user == target || self.reaches(user, target))
    }

    fn get_roles(&mut self, name: &str, _domain: Option<&str>) -> Result<Vec<String>> {
        let id = self.get_role(name);
        Ok(self.all_roles.parent_names(id))
    }

    fn get_users(&mut self, name: &str, _domain: Option<&str>) -> Result<Vec<String>> {
        let id = self.get_role(name);
        Ok(self.all_roles.child_names(id))
    }

    fn add_matching_func(&mut self, func: MatchingFn) {
        self.matching_func = Some(func);
        self.rebuild();
    }

    fn add_domain_matching_func(&mut self, func: MatchingFn) {
        self.domain_matching_func = Some(func);
    }

    fn print_roles(&self) {
        info!(target: "rolegraph::role", "{}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::glob_match;
    use std::sync::Arc;

    fn manager(links: &[(&str, &str)]) -> RoleManager {
        let mut rm = RoleManager::new(10);
        for (user, role) in links {
            rm.add_link(user, role, None).unwrap();
        }
        rm
    }

    #[test]
    fn test_reflexive_for_unknown_name() {
        let mut rm = RoleManager::default();
        assert!(rm.has_link("ghost", "ghost", None).unwrap());
        assert!(rm.reachable("ghost", "ghost"));
    }

    #[test]
    fn test_direct_edge() {
        let mut rm = manager(&[("alice", "admin")]);

        assert!(rm.has_link("alice", "admin", None).unwrap());
        assert_eq!(rm.get_roles("alice", None).unwrap(), vec!["admin"]);
        assert_eq!(rm.get_users("admin", None).unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_hierarchy_bound() {
        let mut rm = RoleManager::new(1);
        rm.add_link("a", "b", None).unwrap();
        rm.add_link("b", "c", None).unwrap();

        assert!(rm.has_link("a", "b", None).unwrap());
        assert!(!rm.has_link("a", "c", None).unwrap());

        let mut rm = RoleManager::new(2);
        rm.add_link("a", "b", None).unwrap();
        rm.add_link("b", "c", None).unwrap();
        assert!(rm.has_link("a", "c", None).unwrap());
    }

    #[test]
    fn test_cycle_terminates() {
        let mut rm = manager(&[("a", "b"), ("b", "c"), ("c", "a")]);

        assert!(rm.has_link("a", "c", None).unwrap());
        assert!(!rm.has_link("a", "d", None).unwrap());
    }

    #[test]
    fn test_delete_link_is_silent_when_missing() {
        let mut rm = manager(&[("alice", "admin")]);

        rm.delete_link("alice", "admin", None).unwrap();
        assert!(!rm.has_link("alice", "admin", None).unwrap());
        rm.delete_link("alice", "admin", None).unwrap();
        rm.delete_link("nobody", "nothing", None).unwrap();
        assert!(rm.links().is_empty());
    }

    #[test]
    fn test_delete_keeps_other_paths() {
        let mut rm = manager(&[("alice", "admin"), ("alice", "ops"), ("ops", "admin")]);

        rm.delete_link("alice", "admin", None).unwrap();
        assert!(rm.has_link("alice", "admin", None).unwrap());
    }

    #[test]
    fn test_delete_pattern_link_unwires_matched_literals() {
        let mut rm = RoleManager::new(10);
        rm.add_matching_func(Arc::new(glob_match));
        rm.add_link("gfoo", "writer", None).unwrap();
        rm.add_link("g*", "reader", None).unwrap();
        assert!(rm.has_link("gfoo", "reader", None).unwrap());

        rm.delete_link("g*", "reader", None).unwrap();

        assert!(!rm.has_link("gfoo", "reader", None).unwrap());
        assert!(rm.has_link("gfoo", "writer", None).unwrap());
        assert!(rm.get_users("reader", None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_link_to_pattern_unwires_matched_roles() {
        let mut rm = RoleManager::new(10);
        rm.add_matching_func(Arc::new(glob_match));
        rm.add_link("carol", "book_1", None).unwrap();
        rm.add_link("alice", "book_*", None).unwrap();
        assert_eq!(rm.get_roles("book_*", None).unwrap(), vec!["book_1"]);

        rm.delete_link("alice", "book_*", None).unwrap();

        assert!(rm.get_roles("book_*", None).unwrap().is_empty());
        assert!(!rm.has_link("alice", "book_1", None).unwrap());
        assert!(rm.has_link("carol", "book_1", None).unwrap());
    }

    #[test]
    fn test_pattern_role_bridges_new_literal() {
        let mut rm = RoleManager::new(10);
        rm.add_matching_func(Arc::new(glob_match));
        rm.add_link("g*", "reader", None).unwrap();
        rm.add_link("gfoo", "writer", None).unwrap();

        assert!(rm.has_link("gfoo", "reader", None).unwrap());
        assert!(rm.has_link("gfoo", "writer", None).unwrap());
        assert!(!rm.has_link("hfoo", "reader", None).unwrap());
    }

    #[test]
    fn test_link_to_pattern_reaches_existing_literals() {
        let mut rm = RoleManager::new(10);
        rm.add_matching_func(Arc::new(glob_match));
        rm.add_link("alice", "book_1", None).unwrap();
        rm.add_link("book_*", "library", None).unwrap();

        assert!(rm.has_link("alice", "library", None).unwrap());
        assert_eq!(rm.get_roles("book_1", None).unwrap(), vec!["library"]);
    }

    #[test]
    fn test_has_link_creates_roles() {
        let mut rm = RoleManager::default();
        assert!(!rm.has_link("x", "y", None).unwrap());
        assert_eq!(rm.role_count(), 2);
        assert!(!rm.reachable("p", "q"));
        assert_eq!(rm.role_count(), 2);
    }

    #[test]
    fn test_rebuild_on_matching_func() {
        let mut rm = manager(&[("g*", "reader"), ("gfoo", "writer")]);
        assert!(!rm.has_link("gfoo", "reader", None).unwrap());

        rm.add_matching_func(Arc::new(glob_match));
        assert!(rm.has_link("gfoo", "reader", None).unwrap());
        assert_eq!(rm.links().len(), 2);
    }

    #[test]
    fn test_display() {
        let rm = manager(&[("alice", "admin"), ("bob", "admin"), ("bob", "ops")]);
        assert_eq!(rm.to_string(), "alice < admin, bob < (admin, ops)");
    }

    #[test]
    fn test_clear() {
        let mut rm = manager(&[("alice", "admin")]);
        rm.clear();

        assert!(rm.links().is_empty());
        assert_eq!(rm.role_count(), 0);
        assert!(!rm.has_link("alice", "admin", None).unwrap());
    }
}
