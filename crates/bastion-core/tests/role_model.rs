//! Role containment through the public API

use bastion_core::{Role, RoleGroup, ANYBODY, ANY_AUTHENTICATED};

fn group(name: &str, roles: &[&str]) -> RoleGroup {
    RoleGroup::from_names(name, roles.iter().copied())
}

#[test]
fn containment_is_asymmetric_for_supersets() {
    let g = group("G", &["A", "B"]);
    let h = group("H", &["A", "B", "C"]);
    assert!(!g.contains_all(&Role::Group(h.clone())));
    assert!(h.contains_all(&Role::Group(g)));
}

#[test]
fn nested_groups_are_searched() {
    let caller = RoleGroup::with_roles(
        RoleGroup::CALLER_ROLES,
        [
            Role::simple("employee"),
            Role::group("Managers", [Role::simple("approver"), Role::group("Leads", [Role::simple("lead")])]),
        ],
    );
    assert!(caller.contains_role_named("lead"));
    assert!(caller.contains_all(&Role::Group(group("needed", &["employee", "lead"]))));
    assert!(!caller.contains_all(&Role::Group(group("needed", &["employee", "auditor"]))));
    assert!(caller.contains_at_least_one_role(&group("any", &["auditor", "approver"])));
}

#[test]
fn wildcard_roles_match_any_held_role() {
    let caller = group(RoleGroup::CALLER_ROLES, &["guest"]);
    assert!(caller.contains_role_named(ANY_AUTHENTICATED));
    assert!(caller.contains_role_named(ANYBODY));
    assert!(!caller.contains_role_named("**extra"));
    assert!(!caller.contains_role_named("anybody"));
}

#[test]
fn empty_groups() {
    let empty = RoleGroup::new("Empty");
    let caller = group(RoleGroup::CALLER_ROLES, &["a"]);
    assert!(caller.contains_all(&Role::Group(empty.clone())));
    assert!(!empty.contains_all(&Role::simple("a")));
    assert!(!empty.contains_role_named(ANY_AUTHENTICATED));
    assert!(!caller.contains_at_least_one_role(&empty));
}
