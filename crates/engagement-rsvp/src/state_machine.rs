use crate::types::RsvpStatus;
use engagement_common::{EngagementError, Result};

/// Validates a transition against the state diagram. Kept
/// separate from `RsvpService` so the table can be unit-tested without a
/// store.
pub fn validate_transition(from: RsvpStatus, to: RsvpStatus) -> Result<()> {
    use RsvpStatus::*;
    let allowed = matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Waitlisted)
            | (Approved, Attended)
            | (Approved, Cancelled)
            | (Waitlisted, Approved)
            | (Waitlisted, Cancelled)
    );
    if allowed {
        Ok(())
    } else {
        Err(EngagementError::Validation(format!(
            "illegal RSVP transition {from:?} -> {to:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RsvpStatus::*;

    #[test]
    fn pending_can_reach_all_three_first_hop_states() {
        assert!(validate_transition(Pending, Approved).is_ok());
        assert!(validate_transition(Pending, Rejected).is_ok());
        assert!(validate_transition(Pending, Waitlisted).is_ok());
    }

    #[test]
    fn terminal_states_accept_no_transitions() {
        for terminal in [Rejected, Cancelled, Attended] {
            for to in [Pending, Approved, Rejected, Waitlisted, Attended, Cancelled] {
                assert!(validate_transition(terminal, to).is_err());
            }
        }
    }

    #[test]
    fn waitlisted_can_only_approve_or_cancel() {
        assert!(validate_transition(Waitlisted, Approved).is_ok());
        assert!(validate_transition(Waitlisted, Cancelled).is_ok());
        assert!(validate_transition(Waitlisted, Rejected).is_err());
        assert!(validate_transition(Waitlisted, Attended).is_err());
    }

    #[test]
    fn approved_cannot_go_back_to_pending_or_waitlisted() {
        assert!(validate_transition(Approved, Pending).is_err());
        assert!(validate_transition(Approved, Waitlisted).is_err());
    }
}
