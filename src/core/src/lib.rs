//! # Role Graph (rolegraph-core)
//!
//! In-memory role inheritance graphs for role-based access control:
//! - Role/user links with bounded-depth reachability queries
//! - Pattern roles wired in through a matching function
//! - Domain-partitioned managers, cached or rebuilt per query
//! - Conditional links gated by predicates evaluated at query time
//! - A thread-safe domain manager with per-domain locking
//!
//! The graph is homogeneous: users and roles are both just named nodes, and
//! an edge `user -> role` means "user has role". Policy evaluation itself
//! lives in the caller; this crate only answers "does X inherit Y".
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rolegraph_core::{matching, RoleGraph, RoleManager};
//!
//! let mut rm = RoleManager::new(10);
//! rm.add_matching_func(Arc::new(matching::glob_match));
//!
//! rm.add_link("staff-*", "employee", None).unwrap();
//! rm.add_link("staff-alice", "admin", None).unwrap();
//!
//! assert!(rm.has_link("staff-alice", "employee", None).unwrap());
//! assert!(rm.has_link("staff-alice", "admin", None).unwrap());
//! ```

pub mod conditional;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod manager;
pub mod matching;
mod role;
pub mod shared;

pub use conditional::{ConditionalDomainManager, ConditionalRoleManager};
pub use config::{RoleManagerConfig, DEFAULT_MAX_HIERARCHY_LEVEL};
pub use domain::{resolve_domain, DomainManager, UncachedDomainManager};
pub use error::{RbacError, Result};
pub use graph::{ConditionalRoleGraph, LinkConditionFn, RoleGraph};
pub use grouping::{build_role_links, remove_role_links};
pub use manager::RoleManager;
pub use matching::{Matcher, MatchingFn};
pub use role::Link;
pub use shared::SharedDomainManager;
