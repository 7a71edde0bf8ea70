//! Control-flag aggregation
//!
//! Evaluates an ordered chain of module steps and combines their outcomes:
//!
//! | Flag | On failure | On success |
//! |------|------------|------------|
//! | REQUIRED | chain fails, evaluation continues | continue |
//! | REQUISITE | chain fails, evaluation stops | continue |
//! | SUFFICIENT | ignored | chain permits and stops, unless a REQUIRED/REQUISITE module already failed |
//! | OPTIONAL | ignored | ignored, unless every decisive module is OPTIONAL |
//!
//! An error counts as a failure. Abstaining modules are skipped entirely.
//! Steps are closures so that modules after an early exit are never invoked.

use crate::control_flag::ControlFlag;
use crate::decision::{AuthorizationDecision, ModuleOutcome};
use bastion_core::BastionError;

/// Combined decision of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateDecision {
    /// The chain grants access
    Permit,
    /// The chain refuses access
    Deny,
    /// No module produced a decisive outcome
    Abstain,
}

impl AggregateDecision {
    /// Resolve to a final decision, using `fallback` when the chain abstained
    pub fn or(self, fallback: AuthorizationDecision) -> AuthorizationDecision {
        match self {
            Self::Permit => AuthorizationDecision::Permit,
            Self::Deny => AuthorizationDecision::Deny,
            Self::Abstain => fallback,
        }
    }
}

/// A module that failed while the chain was evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Position of the module in the chain
    pub index: usize,
    /// Flag the module was configured with
    pub flag: ControlFlag,
    /// Error raised by the module, if it failed with one
    pub error: Option<BastionError>,
}

/// Everything the aggregator learned from a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Combined decision
    pub decision: AggregateDecision,
    /// Number of modules invoked
    pub evaluated: usize,
    /// Whether a REQUISITE failure or SUFFICIENT success ended the chain
    pub stopped_early: bool,
    /// Every failed module, in chain order
    pub failures: Vec<StepFailure>,
    /// Error of the REQUISITE module that ended the chain, if it ended on one
    pub deciding_error: Option<BastionError>,
}

/// Evaluate `steps` in order and combine their outcomes
pub fn aggregate<I, F>(steps: I) -> ChainOutcome
where
    I: IntoIterator<Item = (ControlFlag, F)>,
    F: FnOnce() -> ModuleOutcome,
{
    let mut evaluated = 0;
    let mut failures = Vec::new();
    let mut mandatory_failed = false;
    let mut mandatory_present = false;
    let mut sufficient_present = false;
    let mut optional_present = false;
    let mut optional_permitted = false;

    for (index, (flag, step)) in steps.into_iter().enumerate() {
        evaluated += 1;
        let (passed, error) = match step() {
            ModuleOutcome::Abstain => continue,
            ModuleOutcome::Permit => (true, None),
            ModuleOutcome::Deny => (false, None),
            ModuleOutcome::Error(err) => (false, Some(err)),
        };

        if !passed {
            failures.push(StepFailure {
                index,
                flag,
                error: error.clone(),
            });
        }

        match flag {
            ControlFlag::Required => {
                mandatory_present = true;
                mandatory_failed |= !passed;
            }
            ControlFlag::Requisite => {
                mandatory_present = true;
                if !passed {
                    return ChainOutcome {
                        decision: AggregateDecision::Deny,
                        evaluated,
                        stopped_early: true,
                        failures,
                        deciding_error: error,
                    };
                }
            }
            ControlFlag::Sufficient => {
                sufficient_present = true;
                if passed && !mandatory_failed {
                    return ChainOutcome {
                        decision: AggregateDecision::Permit,
                        evaluated,
                        stopped_early: true,
                        failures,
                        deciding_error: None,
                    };
                }
            }
            ControlFlag::Optional => {
                optional_present = true;
                optional_permitted |= passed;
            }
        }
    }

    let decision = if mandatory_failed {
        AggregateDecision::Deny
    } else if mandatory_present {
        AggregateDecision::Permit
    } else if sufficient_present {
        AggregateDecision::Deny
    } else if optional_present {
        if optional_permitted {
            AggregateDecision::Permit
        } else {
            AggregateDecision::Deny
        }
    } else {
        AggregateDecision::Abstain
    };

    ChainOutcome {
        decision,
        evaluated,
        stopped_early: false,
        failures,
        deciding_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn run(chain: &[(ControlFlag, ModuleOutcome)]) -> ChainOutcome {
        aggregate(
            chain
                .iter()
                .map(|(flag, outcome)| (*flag, move || outcome.clone())),
        )
    }

    use ControlFlag::{Optional, Required, Requisite, Sufficient};
    use ModuleOutcome::{Abstain, Deny, Permit};

    #[test]
    fn required_failure_denies() {
        let outcome = run(&[(Required, Deny)]);
        assert_eq!(outcome.decision, AggregateDecision::Deny);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn required_failures_are_all_surfaced() {
        let outcome = run(&[(Required, Deny), (Required, Permit), (Required, Deny)]);
        assert_eq!(outcome.decision, AggregateDecision::Deny);
        assert_eq!(outcome.evaluated, 3);
        let indices: Vec<usize> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn requisite_failure_stops_chain() {
        let invoked = Cell::new(false);
        let steps: Vec<(ControlFlag, Box<dyn FnOnce() -> ModuleOutcome + '_>)> = vec![
            (Requisite, Box::new(|| Deny)),
            (
                Required,
                Box::new(|| {
                    invoked.set(true);
                    Permit
                }),
            ),
        ];
        let outcome = aggregate(steps);
        assert_eq!(outcome.decision, AggregateDecision::Deny);
        assert!(outcome.stopped_early);
        assert_eq!(outcome.evaluated, 1);
        assert!(!invoked.get());
    }

    #[test]
    fn sufficient_success_stops_chain() {
        let invoked = Cell::new(false);
        let steps: Vec<(ControlFlag, Box<dyn FnOnce() -> ModuleOutcome + '_>)> = vec![
            (Sufficient, Box::new(|| Permit)),
            (
                Required,
                Box::new(|| {
                    invoked.set(true);
                    Deny
                }),
            ),
        ];
        let outcome = aggregate(steps);
        assert_eq!(outcome.decision, AggregateDecision::Permit);
        assert!(outcome.stopped_early);
        assert!(!invoked.get());
    }

    #[test]
    fn sufficient_after_required_failure_does_not_permit() {
        let outcome = run(&[(Required, Deny), (Sufficient, Permit)]);
        assert_eq!(outcome.decision, AggregateDecision::Deny);
        assert!(!outcome.stopped_early);
        assert_eq!(outcome.evaluated, 2);
    }

    #[test]
    fn optional_failure_is_ignored_next_to_required() {
        let outcome = run(&[(Optional, Deny), (Required, Permit)]);
        assert_eq!(outcome.decision, AggregateDecision::Permit);
    }

    #[test]
    fn optional_only_chain_needs_one_permit() {
        assert_eq!(
            run(&[(Optional, Deny), (Optional, Permit)]).decision,
            AggregateDecision::Permit
        );
        assert_eq!(run(&[(Optional, Deny)]).decision, AggregateDecision::Deny);
    }

    #[test]
    fn failed_sufficient_only_chain_denies() {
        assert_eq!(
            run(&[(Sufficient, Deny), (Optional, Permit)]).decision,
            AggregateDecision::Deny
        );
    }

    #[test]
    fn sufficient_failure_next_to_passing_required_permits() {
        assert_eq!(
            run(&[(Required, Permit), (Sufficient, Deny)]).decision,
            AggregateDecision::Permit
        );
    }

    #[test]
    fn empty_and_abstaining_chains_abstain() {
        assert_eq!(run(&[]).decision, AggregateDecision::Abstain);
        let outcome = run(&[(Required, Abstain), (Sufficient, Abstain)]);
        assert_eq!(outcome.decision, AggregateDecision::Abstain);
        assert_eq!(outcome.evaluated, 2);
        assert_eq!(
            outcome.decision.or(AuthorizationDecision::Deny),
            AuthorizationDecision::Deny
        );
    }

    #[test]
    fn errors_count_as_failures() {
        let err = BastionError::internal("policy store offline");
        let outcome = run(&[(Required, ModuleOutcome::Error(err.clone())), (Required, Permit)]);
        assert_eq!(outcome.decision, AggregateDecision::Deny);
        assert_eq!(outcome.failures[0].error, Some(err.clone()));
        assert!(outcome.deciding_error.is_none());

        let outcome = run(&[(Requisite, ModuleOutcome::Error(err.clone()))]);
        assert_eq!(outcome.deciding_error, Some(err));
    }

    #[test]
    fn sufficient_error_is_discarded() {
        let err = BastionError::internal("timeout");
        let outcome = run(&[(Sufficient, ModuleOutcome::Error(err)), (Required, Permit)]);
        assert_eq!(outcome.decision, AggregateDecision::Permit);
        assert!(outcome.deciding_error.is_none());
    }
}
