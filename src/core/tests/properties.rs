//! Property tests for role graph invariants

#[cfg(test)]
mod properties {
    use proptest::prelude::*;
    use rolegraph_core::matching::glob_match;
    use rolegraph_core::{ConditionalRoleManager, RoleGraph, RoleManager};
    use std::sync::Arc;

    const NAMES: &[&str] = &["alice", "bob", "admin", "staff", "g1", "g2", "g*", "root"];
    const LITERALS: &[&str] = &["alice", "bob", "admin", "staff", "root"];

    type Links = Vec<(&'static str, &'static str)>;

    fn links_over(names: &'static [&'static str]) -> impl Strategy<Value = Links> {
        prop::collection::vec(
            (prop::sample::select(names), prop::sample::select(names)),
            0..16,
        )
    }

    fn build(max_hierarchy_level: usize, links: &[(&str, &str)]) -> RoleManager {
        let mut rm = RoleManager::new(max_hierarchy_level);
        for (user, role) in links {
            rm.add_link(user, role, None).unwrap();
        }
        rm
    }

    proptest! {
        #[test]
        fn test_has_link_is_reflexive(links in links_over(NAMES), name in "[a-z*]{0,8}") {
            let mut rm = RoleManager::new(3);
            rm.add_matching_func(Arc::new(glob_match));
            let mut crm = ConditionalRoleManager::new(3);
            crm.add_matching_func(Arc::new(glob_match));
            for (user, role) in &links {
                rm.add_link(user, role, None).unwrap();
                crm.add_link(user, role, None).unwrap();
            }

            prop_assert!(rm.has_link(&name, &name, None).unwrap());
            prop_assert!(crm.has_link(&name, &name, None).unwrap());
        }

        #[test]
        fn test_parents_and_children_are_inverse(links in links_over(NAMES)) {
            let mut rm = RoleManager::new(10);
            rm.add_matching_func(Arc::new(glob_match));
            for (user, role) in &links {
                rm.add_link(user, role, None).unwrap();
            }

            for name in NAMES {
                for role in rm.get_roles(name, None).unwrap() {
                    let users = rm.get_users(&role, None).unwrap();
                    prop_assert!(users.iter().any(|user| user == name));
                }
                for user in rm.get_users(name, None).unwrap() {
                    let roles = rm.get_roles(&user, None).unwrap();
                    prop_assert!(roles.iter().any(|role| role == name));
                }
            }
        }

        #[test]
        fn test_delete_undoes_add(links in links_over(LITERALS)) {
            let mut rm = build(10, &links);

            rm.add_link("fresh-user", "fresh-role", None).unwrap();
            prop_assert!(rm.has_link("fresh-user", "fresh-role", None).unwrap());

            rm.delete_link("fresh-user", "fresh-role", None).unwrap();
            prop_assert!(!rm.has_link("fresh-user", "fresh-role", None).unwrap());
            prop_assert!(rm.delete_link("fresh-user", "fresh-role", None).is_ok());
        }

        #[test]
        fn test_delete_undoes_pattern_add(links in links_over(NAMES)) {
            let mut rm = RoleManager::new(10);
            rm.add_matching_func(Arc::new(glob_match));
            for (user, role) in &links {
                rm.add_link(user, role, None).unwrap();
            }
            rm.add_link("fresh-1", "fresh-base", None).unwrap();
            rm.add_link("fresh-2", "fresh-base", None).unwrap();

            let mut before = Vec::new();
            for name1 in NAMES {
                for name2 in NAMES {
                    before.push(rm.has_link(name1, name2, None).unwrap());
                }
            }

            rm.add_link("fresh-*", "fresh-role", None).unwrap();
            prop_assert!(rm.has_link("fresh-1", "fresh-role", None).unwrap());
            prop_assert!(rm.has_link("fresh-2", "fresh-role", None).unwrap());

            rm.delete_link("fresh-*", "fresh-role", None).unwrap();
            for name in ["fresh-*", "fresh-1", "fresh-2"] {
                prop_assert!(!rm.has_link(name, "fresh-role", None).unwrap());
            }
            prop_assert!(rm.get_users("fresh-role", None).unwrap().is_empty());

            let mut after = Vec::new();
            for name1 in NAMES {
                for name2 in NAMES {
                    after.push(rm.has_link(name1, name2, None).unwrap());
                }
            }
            prop_assert_eq!(before, after);
        }

        #[test]
        fn test_matching_rebuild_equivalence(links in links_over(NAMES)) {
            let mut upfront = RoleManager::new(10);
            upfront.add_matching_func(Arc::new(glob_match));
            for (user, role) in &links {
                upfront.add_link(user, role, None).unwrap();
            }

            let mut replayed = build(10, &links);
            replayed.add_matching_func(Arc::new(glob_match));

            prop_assert_eq!(upfront.links(), replayed.links());
            for name1 in NAMES.iter().chain(&["gnew"]) {
                for name2 in NAMES {
                    prop_assert_eq!(
                        upfront.has_link(name1, name2, None).unwrap(),
                        replayed.has_link(name1, name2, None).unwrap(),
                        "has_link({}, {})", name1, name2
                    );
                }
            }
        }
    }
}
