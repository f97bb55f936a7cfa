//! Role nodes and link records

use indexmap::IndexSet;

/// Index of a role inside its manager's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(pub(crate) usize);

/// A `(user, role)` pair meaning "user has role"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub user: String,
    pub role: String,
}

impl Link {
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
        }
    }

    pub(crate) fn is(&self, user: &str, role: &str) -> bool {
        self.user == user && self.role == role
    }
}

/// A named vertex of the role graph
///
/// `roles` holds the direct parents ("this role has these roles") and
/// `users` the direct children. The manager keeps the two sets mutual
/// inverses; nodes never edit each other directly.
#[derive(Debug, Clone)]
pub(crate) struct Role {
    pub(crate) name: String,
    pub(crate) roles: IndexSet<RoleId>,
    pub(crate) users: IndexSet<RoleId>,
}

impl Role {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: IndexSet::new(),
            users: IndexSet::new(),
        }
    }
}

/// Dense storage for the roles of one manager
///
/// Roles are created on first reference and only ever dropped all at once.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoleArena {
    roles: Vec<Role>,
    index: std::collections::HashMap<String, RoleId>,
}

impl RoleArena {
    pub(crate) fn len(&self) -> usize {
        self.roles.len()
    }

    pub(crate) fn clear(&mut self) {
        self.roles.clear();
        self.index.clear();
    }

    pub(crate) fn id(&self, name: &str) -> Option<RoleId> {
        self.index.get(name).copied()
    }

    /// Inserts an empty role; the caller has checked the name is new
    pub(crate) fn insert(&mut self, name: &str) -> RoleId {
        let id = RoleId(self.roles.len());
        self.roles.push(Role::new(name));
        self.index.insert(name.to_string(), id);
        id
    }

    pub(crate) fn get(&self, id: RoleId) -> &Role {
        &self.roles[id.0]
    }

    pub(crate) fn name(&self, id: RoleId) -> &str {
        &self.roles[id.0].name
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = RoleId> {
        (0..self.roles.len()).map(RoleId)
    }

    /// Makes `role` a parent of `user`, updating both directions
    pub(crate) fn add_edge(&mut self, user: RoleId, role: RoleId) {
        self.roles[user.0].roles.insert(role);
        self.roles[role.0].users.insert(user);
    }

    /// Removes the edge `user -> role` if present, updating both directions
    pub(crate) fn remove_edge(&mut self, user: RoleId, role: RoleId) {
        self.roles[user.0].roles.shift_remove(&role);
        self.roles[role.0].users.shift_remove(&user);
    }

    /// Gives `target` every parent and child edge of `source`
    pub(crate) fn copy_edges(&mut self, target: RoleId, source: RoleId) {
        let parents: Vec<RoleId> = self.roles[source.0].roles.iter().copied().collect();
        let children: Vec<RoleId> = self.roles[source.0].users.iter().copied().collect();

        for parent in parents {
            self.add_edge(target, parent);
        }
        for child in children {
            self.add_edge(child, target);
        }
    }

    pub(crate) fn parent_names(&self, id: RoleId) -> Vec<String> {
        self.roles[id.0]
            .roles
            .iter()
            .map(|&parent| self.name(parent).to_string())
            .collect()
    }

    pub(crate) fn child_names(&self, id: RoleId) -> Vec<String> {
        self.roles[id.0]
            .users
            .iter()
            .map(|&child| self.name(child).to_string())
            .collect()
    }

    /// Renders `name < parent` or `name < (p1, p2)`; empty for roles
    /// without parents
    pub(crate) fn describe(&self, id: RoleId) -> String {
        let role = self.get(id);
        if role.roles.is_empty() {
            return String::new();
        }

        let names = self.parent_names(id).join(", ");
        if role.roles.len() == 1 {
            format!("{} < {}", role.name, names)
        } else {
            format!("{} < ({})", role.name, names)
        }
    }
}
