//! Feeding grouping rules into a role graph
//!
//! A grouping rule is the `[user, role, domain...]` tuple a policy model
//! stores for role inheritance (`g, alice, admin, tenant-a`). At most one
//! trailing domain is accepted.

use crate::domain::resolve_domain;
use crate::error::{RbacError, Result};
use crate::graph::RoleGraph;

/// Splits a rule into `(user, role, domain)`
fn parse_rule<S: AsRef<str>>(rule: &[S]) -> Result<(&str, &str, Option<&str>)> {
    let [user, role, rest @ ..] = rule else {
        return Err(RbacError::InvalidRule(format!(
            "expected at least user and role, got {} field(s)",
            rule.len()
        )));
    };

    let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
    let domain = match resolve_domain(&rest)? {
        "" if rest.is_empty() => None,
        domain => Some(domain),
    };
    Ok((user.as_ref(), role.as_ref(), domain))
}

/// Adds one link per rule, stopping at the first malformed rule
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::{build_role_links, DomainManager, RoleGraph};
///
/// let mut dm = DomainManager::new(10);
/// build_role_links(&mut dm, &[["alice", "admin", "tenant-a"]]).unwrap();
/// assert!(dm.has_link("alice", "admin", Some("tenant-a")).unwrap());
/// ```
pub fn build_role_links<R, S>(rm: &mut R, rules: &[impl AsRef<[S]>]) -> Result<()>
where
    R: RoleGraph + ?Sized,
    S: AsRef<str>,
{
    for rule in rules {
        let (user, role, domain) = parse_rule(rule.as_ref())?;
        rm.add_link(user, role, domain)?;
    }
    Ok(())
}

/// Deletes the link of every rule
pub fn remove_role_links<R, S>(rm: &mut R, rules: &[impl AsRef<[S]>]) -> Result<()>
where
    R: RoleGraph + ?Sized,
    S: AsRef<str>,
{
    for rule in rules {
        let (user, role, domain) = parse_rule(rule.as_ref())?;
        rm.delete_link(user, role, domain)?;
    }
    Ok(())
}
