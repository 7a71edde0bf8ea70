//! Property test strategies for Bastion types
//!
//! Role names are drawn from a small alphabet so that generated groups
//! overlap often enough for containment properties to be meaningful.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use bastion_authorization::{ControlFlag, ModuleOutcome};
use bastion_core::{BastionError, CompositeAclPermission, Role, RoleGroup};

/// Short role names over a five-letter alphabet
pub fn arb_role_name() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

/// Simple roles and nested groups up to three levels deep
///
/// # Example
///
/// ```rust
/// use bastion_testkit::strategies::arb_role;
/// use proptest::prelude::*;
///
/// proptest! {
///     #[test]
///     fn reflexive(role in arb_role()) {
///         prop_assert!(role.contains_all(&role));
///     }
/// }
/// ```
pub fn arb_role() -> impl Strategy<Value = Role> {
    arb_role_name()
        .prop_map(Role::simple)
        .prop_recursive(3, 24, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(|roles| Role::group("Nested", roles))
        })
}

/// Caller-role groups of up to five members
pub fn arb_role_group() -> impl Strategy<Value = RoleGroup> {
    prop::collection::vec(arb_role(), 0..5)
        .prop_map(|roles| RoleGroup::with_roles(RoleGroup::CALLER_ROLES, roles))
}

/// Any ACL permission bit-set
pub fn arb_permission() -> impl Strategy<Value = CompositeAclPermission> {
    (0u8..16).prop_map(CompositeAclPermission::from_bits_truncate)
}

/// Any control flag
pub fn arb_control_flag() -> impl Strategy<Value = ControlFlag> {
    prop_oneof![
        Just(ControlFlag::Required),
        Just(ControlFlag::Requisite),
        Just(ControlFlag::Sufficient),
        Just(ControlFlag::Optional),
    ]
}

/// Any module outcome, errors included
pub fn arb_outcome() -> impl Strategy<Value = ModuleOutcome> {
    prop_oneof![
        3 => Just(ModuleOutcome::Permit),
        3 => Just(ModuleOutcome::Deny),
        1 => Just(ModuleOutcome::Abstain),
        1 => Just(ModuleOutcome::Error(BastionError::authorization("scripted failure"))),
    ]
}

/// Module chains of up to six (flag, outcome) steps
pub fn arb_chain() -> impl Strategy<Value = Vec<(ControlFlag, ModuleOutcome)>> {
    prop::collection::vec((arb_control_flag(), arb_outcome()), 0..6)
}
