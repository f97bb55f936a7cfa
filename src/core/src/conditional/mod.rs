//! # Conditional Role Managers
//!
//! Role graphs whose links can be gated by predicates evaluated at query
//! time, for attribute, time or quota based grants:
//! - A link without a predicate is always traversable
//! - A link with a predicate is followed only while the predicate, called
//!   with its stored parameters, returns `true`
//! - Predicate errors propagate out of `has_link` unchanged
//!
//! Because the gate is evaluated on every query, the same graph can answer
//! differently over time as the predicate's underlying state changes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rolegraph_core::{ConditionalRoleGraph, ConditionalRoleManager, RoleGraph};
//!
//! let mut rm = ConditionalRoleManager::new(10);
//! rm.add_link("alice", "on_call", None).unwrap();
//! rm.add_link_condition_func(
//!     "alice",
//!     "on_call",
//!     Arc::new(|params: &[String]| Ok(params.first().map(String::as_str) == Some("active"))),
//! );
//!
//! rm.set_link_condition_func_params("alice", "on_call", vec!["inactive".to_string()]);
//! assert!(!rm.has_link("alice", "on_call", None).unwrap());
//!
//! rm.set_link_condition_func_params("alice", "on_call", vec!["active".to_string()]);
//! assert!(rm.has_link("alice", "on_call", None).unwrap());
//! ```

mod domain_manager;
mod role_manager;

pub use domain_manager::ConditionalDomainManager;
pub use role_manager::ConditionalRoleManager;
