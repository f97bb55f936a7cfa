//! Integration tests for the domain managers
//!
//! These tests verify that the cached, uncached and shared variants agree
//! on domain isolation and domain patterns.

#[cfg(test)]
mod integration_tests {
    use rolegraph_core::matching::{glob_match, key_match};
    use rolegraph_core::{
        build_role_links, DomainManager, RbacError, RoleGraph, RoleManagerConfig,
        SharedDomainManager, UncachedDomainManager,
    };
    use std::sync::Arc;

    fn managers() -> Vec<Box<dyn RoleGraph>> {
        vec![
            Box::new(UncachedDomainManager::new(10)),
            Box::new(DomainManager::new(10)),
        ]
    }

    #[test]
    fn test_domain_isolation() {
        for mut dm in managers() {
            dm.add_link("alice", "admin", Some("d1")).unwrap();

            assert!(dm.has_link("alice", "admin", Some("d1")).unwrap());
            assert!(!dm.has_link("alice", "admin", Some("d2")).unwrap());
            assert!(!dm.has_link("alice", "admin", None).unwrap());
        }
    }

    #[test]
    fn test_default_domain() {
        for mut dm in managers() {
            dm.add_link("alice", "admin", None).unwrap();

            assert!(dm.has_link("alice", "admin", Some("")).unwrap());
            assert_eq!(dm.get_roles("alice", None).unwrap(), vec!["admin"]);
        }
    }

    #[test]
    fn test_delete_missing_link_fails() {
        for mut dm in managers() {
            let err = dm.delete_link("alice", "admin", Some("d1")).unwrap_err();
            assert!(matches!(err, RbacError::LinkNotFound { .. }));
            assert!(err.to_string().contains("d1"));
        }
    }

    #[test]
    fn test_domain_pattern_links_visible() {
        for mut dm in managers() {
            dm.add_domain_matching_func(Arc::new(key_match));
            dm.add_link("alice", "admin", Some("tenant/*")).unwrap();
            dm.add_link("bob", "viewer", Some("tenant/1")).unwrap();

            assert!(dm.has_link("alice", "admin", Some("tenant/1")).unwrap());
            assert!(dm.has_link("bob", "viewer", Some("tenant/1")).unwrap());
            assert!(!dm.has_link("bob", "viewer", Some("tenant/2")).unwrap());
            assert!(!dm.has_link("alice", "admin", Some("other")).unwrap());
        }
    }

    #[test]
    fn test_cached_domain_sees_later_pattern_links() {
        let mut dm = DomainManager::new(10);
        dm.add_domain_matching_func(Arc::new(key_match));

        assert!(!dm.has_link("alice", "admin", Some("tenant/1")).unwrap());
        assert_eq!(dm.cached_domains(), vec!["tenant/1"]);

        dm.add_link("alice", "admin", Some("tenant/*")).unwrap();
        assert!(dm.has_link("alice", "admin", Some("tenant/1")).unwrap());

        dm.delete_link("alice", "admin", Some("tenant/*")).unwrap();
        assert!(!dm.has_link("alice", "admin", Some("tenant/1")).unwrap());
    }

    #[test]
    fn test_role_matching_inside_domain() {
        for mut dm in managers() {
            dm.add_matching_func(Arc::new(glob_match));
            dm.add_link("svc-*", "deployer", Some("prod")).unwrap();

            assert!(dm.has_link("svc-api", "deployer", Some("prod")).unwrap());
            assert!(!dm.has_link("svc-api", "deployer", Some("staging")).unwrap());
        }
    }

    #[test]
    fn test_managers_agree() {
        let rules = [
            ["alice", "admin", "tenant/1"],
            ["admin", "owner", "tenant/1"],
            ["bob", "admin", "tenant/*"],
            ["carol", "viewer", "tenant/2"],
        ];
        let queries = [
            ("alice", "owner", "tenant/1"),
            ("bob", "admin", "tenant/1"),
            ("bob", "owner", "tenant/1"),
            ("bob", "admin", "tenant/2"),
            ("carol", "viewer", "tenant/1"),
            ("alice", "admin", "tenant/2"),
        ];

        let mut uncached = UncachedDomainManager::new(10);
        let mut cached = DomainManager::new(10);
        let shared = SharedDomainManager::new(10);

        uncached.add_domain_matching_func(Arc::new(key_match));
        cached.add_domain_matching_func(Arc::new(key_match));
        shared.add_domain_matching_func(Arc::new(key_match));

        build_role_links(&mut uncached, &rules).unwrap();
        build_role_links(&mut cached, &rules).unwrap();
        for [user, role, domain] in rules {
            shared.add_link(user, role, Some(domain)).unwrap();
        }

        for (user, role, domain) in queries {
            let expected = uncached.has_link(user, role, Some(domain)).unwrap();
            assert_eq!(cached.has_link(user, role, Some(domain)).unwrap(), expected);
            assert_eq!(shared.has_link(user, role, Some(domain)).unwrap(), expected);
        }
        assert!(uncached.has_link("alice", "owner", Some("tenant/1")).unwrap());
        assert!(uncached.has_link("bob", "owner", Some("tenant/1")).unwrap());
        assert!(!uncached.has_link("carol", "viewer", Some("tenant/1")).unwrap());
    }

    #[test]
    fn test_from_toml_config() {
        let config = RoleManagerConfig::from_toml_str(
            r#"
            max_hierarchy_level = 4
            domain_matching = "key_match"
            "#,
        )
        .unwrap();

        let mut dm = DomainManager::from_config(&config).unwrap();
        dm.add_link("alice", "admin", Some("org/*")).unwrap();

        assert!(dm.has_link("alice", "admin", Some("org/acme")).unwrap());
    }

    #[test]
    fn test_too_many_domains_in_rule() {
        let mut dm = DomainManager::new(10);
        let err = build_role_links(&mut dm, &[["alice", "admin", "d1", "d2"]]).unwrap_err();

        assert!(matches!(err, RbacError::DomainArity(2)));
        assert!(dm.links("d1").is_empty());
    }

    #[test]
    fn test_clear() {
        for mut dm in managers() {
            dm.add_link("alice", "admin", Some("d1")).unwrap();
            dm.clear();

            assert!(!dm.has_link("alice", "admin", Some("d1")).unwrap());
        }
    }
}
