//! Control-flag aggregation driven through an authorization context

use assert_matches::assert_matches;
use bastion_authorization::{
    aggregate, AggregateDecision, AuthorizationContext, AuthorizationDecision, ControlFlag,
    ModuleOutcome,
};
use bastion_core::BastionError;
use bastion_testkit::strategies::arb_chain;
use bastion_testkit::{generic_resource, roles, subject, ScriptedChain};
use proptest::prelude::*;

use ControlFlag::{Optional, Required, Requisite, Sufficient};
use ModuleOutcome::{Deny, Permit};

fn decide(chain: &ScriptedChain) -> bastion_core::Result<AuthorizationDecision> {
    let context = AuthorizationContext::new(&chain.config, chain.registry.clone())?;
    context.authorize(&generic_resource("doc"), &subject("ann"), &roles(&["user"]))
}

#[test]
fn required_failure_denies() {
    let chain = ScriptedChain::new("required", &[(Required, Deny)]);
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Deny);
}

#[test]
fn requisite_failure_skips_the_rest() {
    let chain = ScriptedChain::new("requisite", &[(Requisite, Deny), (Required, Permit)]);
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Deny);
    assert_eq!(chain.calls(), vec![1, 0]);
}

#[test]
fn sufficient_success_skips_the_rest() {
    let chain = ScriptedChain::new(
        "sufficient",
        &[(Sufficient, Permit), (Required, Deny), (Requisite, Deny)],
    );
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Permit);
    assert_eq!(chain.calls(), vec![1, 0, 0]);
}

#[test]
fn sufficient_after_required_failure_does_not_permit() {
    let chain = ScriptedChain::new(
        "late-sufficient",
        &[(Required, Deny), (Sufficient, Permit), (Optional, Permit)],
    );
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Deny);
    assert_eq!(chain.calls(), vec![1, 1, 1]);
}

#[test]
fn optional_failure_is_ignored() {
    let chain = ScriptedChain::new("optional", &[(Optional, Deny), (Required, Permit)]);
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Permit);
}

#[test]
fn modules_run_in_configuration_order() {
    let chain = ScriptedChain::new(
        "ordered",
        &[(Optional, Deny), (Required, Permit), (Required, Permit), (Sufficient, Deny)],
    );
    decide(&chain).unwrap();
    assert_eq!(
        chain.log.entries(),
        vec!["step-0", "step-1", "step-2", "step-3"]
    );
}

#[test]
fn requisite_error_is_surfaced() {
    let failing = ModuleOutcome::Error(BastionError::internal("policy store unreachable"));
    let chain = ScriptedChain::new("requisite-error", &[(Requisite, failing), (Required, Permit)]);
    let err = decide(&chain).unwrap_err();
    assert_matches!(err, BastionError::Authorization { ref message } if message.contains("unreachable"));
    assert_eq!(chain.calls(), vec![1, 0]);
}

#[test]
fn required_error_folds_into_deny() {
    let failing = ModuleOutcome::Error(BastionError::internal("timeout"));
    let chain = ScriptedChain::new("required-error", &[(Required, failing), (Required, Permit)]);
    assert_eq!(decide(&chain).unwrap(), AuthorizationDecision::Deny);
    assert_eq!(chain.calls(), vec![1, 1]);
}

fn expected(chain: &[(ControlFlag, ModuleOutcome)]) -> AggregateDecision {
    aggregate(chain.iter().map(|(flag, outcome)| (*flag, move || outcome.clone()))).decision
}

proptest! {
    #[test]
    fn permit_requires_no_mandatory_failure(chain in arb_chain()) {
        let outcome = aggregate(chain.iter().map(|(flag, outcome)| (*flag, move || outcome.clone())));
        let decision = outcome.decision;
        let mandatory_failed = chain.iter().take(outcome.evaluated).any(|(flag, outcome)| {
            flag.is_mandatory() && matches!(outcome, ModuleOutcome::Deny | ModuleOutcome::Error(_))
        });
        if mandatory_failed {
            prop_assert_ne!(decision, AggregateDecision::Permit);
        }
    }

    #[test]
    fn context_agrees_with_aggregator(chain in arb_chain()) {
        let scripted = ScriptedChain::new("generated", &chain);
        let aggregated = aggregate(
            chain.iter().map(|(flag, outcome)| (*flag, move || outcome.clone())),
        );
        match decide(&scripted) {
            Ok(decision) => {
                prop_assert!(aggregated.deciding_error.is_none());
                prop_assert_eq!(decision, aggregated.decision.or(AuthorizationDecision::Deny));
            }
            Err(err) => {
                prop_assert!(aggregated.deciding_error.is_some());
                prop_assert_eq!(err.kind(), "authorization");
            }
        }
        let invoked = scripted.calls().iter().filter(|calls| **calls == 1).count();
        prop_assert_eq!(invoked, aggregated.evaluated);
    }

    #[test]
    fn all_abstaining_chain_abstains(len in 0usize..5) {
        let chain: Vec<_> = (0..len).map(|_| (Required, ModuleOutcome::Abstain)).collect();
        prop_assert_eq!(expected(&chain), AggregateDecision::Abstain);
    }
}
