//! The session state-transition table (spec.md §4.4). Kept as one
//! small pure function so every transition in the coordinator goes
//! through the same gate rather than hand-checking `match`es inline.

use lucid_types::SessionState as S;

/// Whether `to` is a legal direct successor of `from` under spec.md's
/// transition table.
#[must_use]
pub fn is_legal_transition(from: S, to: S) -> bool {
    use S::*;
    match (from, to) {
        (Pending, Ready) => true,
        (Ready, Recording) => true,
        (Recording, Finalizing) => true,
        (Finalizing, Anchoring) => true,
        (Anchoring, Completed) => true,
        (Pending, Cancelled) | (Ready, Cancelled) => true,
        (_, Failed) => from != Completed && from != Failed && from != Cancelled,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_chain_is_legal() {
        assert!(is_legal_transition(S::Pending, S::Ready));
        assert!(is_legal_transition(S::Ready, S::Recording));
        assert!(is_legal_transition(S::Recording, S::Finalizing));
        assert!(is_legal_transition(S::Finalizing, S::Anchoring));
        assert!(is_legal_transition(S::Anchoring, S::Completed));
    }

    #[test]
    fn fatal_error_reaches_failed_from_any_non_terminal_state() {
        for from in [S::Pending, S::Ready, S::Recording, S::Finalizing, S::Anchoring] {
            assert!(is_legal_transition(from, S::Failed));
        }
        assert!(!is_legal_transition(S::Completed, S::Failed));
        assert!(!is_legal_transition(S::Cancelled, S::Failed));
    }

    #[test]
    fn expiry_only_cancels_pending_or_ready() {
        assert!(is_legal_transition(S::Pending, S::Cancelled));
        assert!(is_legal_transition(S::Ready, S::Cancelled));
        assert!(!is_legal_transition(S::Recording, S::Cancelled));
    }

    #[test]
    fn skipping_a_state_is_illegal() {
        assert!(!is_legal_transition(S::Pending, S::Recording));
        assert!(!is_legal_transition(S::Ready, S::Completed));
    }
}
