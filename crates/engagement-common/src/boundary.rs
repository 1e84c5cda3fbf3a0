use crate::{Id, Result};
use serde_json::Value;

/// Boundary contract implemented by `engagement-trust` (C8) and consumed by
/// `engagement-graph` (C2, visibility) and `engagement-rsvp` (C3,
/// submission gating) without either depending on C8 directly. Keeps the
/// block/moderation subsystem a leaf the coordination engine calls into
/// rather than a dependency every component must link.
pub trait BlockChecker: Send + Sync {
    /// True if `a` and `b` have blocked each other in either direction.
    fn is_blocked(&self, a: &Id, b: &Id) -> Result<bool>;
}

/// A `BlockChecker` that never reports a block, for tests and for graph
/// operations that don't need moderation wired in yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlocks;

impl BlockChecker for NoBlocks {
    fn is_blocked(&self, _a: &Id, _b: &Id) -> Result<bool> {
        Ok(false)
    }
}

/// Boundary contract implemented by `engagement-fanout` (C7) and consumed
/// by every component that emits an SSE event on commit — fanned out only
/// after the originating transaction commits. Kept trait-level so
/// C3/C4/C5/engagement-voting never link the hub's mailbox machinery
/// directly.
pub trait EventSink: Send + Sync {
    fn publish(&self, kind: &str, target: Option<Id>, payload: Value);
}

/// An `EventSink` that discards everything, for tests that don't assert on
/// fan-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSink;

impl EventSink for NoSink {
    fn publish(&self, _kind: &str, _target: Option<Id>, _payload: Value) {}
}

/// Result of scoring one user's answers against a target's values
/// questions (step 1). `yikes_count` counts answers whose
/// `selected_option` falls in the question's `yikes_options`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    pub alignment_score: f64,
    pub yikes_count: u32,
}

/// Boundary contract implemented by `engagement-compat` (C4) and consumed
/// by `engagement-rsvp` (C3) so the admission state machine never links
/// the pairwise-compatibility/pool-matching machinery directly.
/// `anchor` is the event's organizer (the values questions are scored
/// against whoever set them, per the pairwise definition);
/// `None` when the event is guild-organized and no single person's
/// answers apply, in which case implementers should treat the submission
/// as trivially aligned.
pub trait AlignmentScorer: Send + Sync {
    fn score_against_questions(
        &self,
        user: &Id,
        anchor: Option<&Id>,
        questions: &[Id],
    ) -> Result<AlignmentResult>;
}

/// An `AlignmentScorer` that reports perfect alignment and no yikes, for
/// events that don't require values gating and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAligned;

impl AlignmentScorer for AlwaysAligned {
    fn score_against_questions(
        &self,
        _user: &Id,
        _anchor: Option<&Id>,
        _questions: &[Id],
    ) -> Result<AlignmentResult> {
        Ok(AlignmentResult {
            alignment_score: 1.0,
            yikes_count: 0,
        })
    }
}

/// Lets C8 verify a trust rating's anchor (a shared event or confirmed
/// hangout) is real and completed, without C8 depending on C2/C3 directly
/// ("`CanRate` consults storage to verify the anchor exists
/// and is completed").
pub trait AnchorVerifier: Send + Sync {
    fn anchor_completed(&self, anchor_type: &str, anchor_id: &Id) -> Result<bool>;
}
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAnchored;
impl AnchorVerifier for AlwaysAnchored {
    fn anchor_completed(&self, _anchor_type: &str, _anchor_id: &Id) -> Result<bool> {
        Ok(true)
    }
}

/// Boundary contract implemented by `engagement-resonance` (C5) and
/// consumed by `engagement-rsvp` (C3) on completion verification
/// ("notify C5 to award Questing/Mana/Wayfinder points"). The per-stat
/// formula methods let C3 drive each award without linking the ledger's
/// concrete type; `try_award` stays for the generic `stat∈{questing|mana|
/// wayfinder|attunement}` case where the caller already has raw points.
pub trait ResonanceAwarder: Send + Sync {
    fn try_award(
        &self,
        user: &Id,
        stat: &str,
        points: u32,
        source_object_id: &Id,
        reason_code: &str,
    ) -> Result<bool>;

    /// Questing: `10 + 2·[confirmed_early] + 2·[checkin within ±10 min]`.
    fn award_questing(
        &self,
        user_id: &Id,
        event_id: &Id,
        confirmed_early: bool,
        checkin_on_time: bool,
    ) -> Result<bool>;

    /// Mana: `12 + 2·[early] + 2·[tag_selected]`, scaled by the
    /// diminishing-returns pairwise factor.
    fn award_mana(
        &self,
        helper_id: &Id,
        receiver_id: &Id,
        event_id: &Id,
        early: bool,
        tag_selected: bool,
    ) -> Result<bool>;

    /// Wayfinder (host): `8 + 2·min(verified_attendees, 4) + 2·[early]`.
    fn award_wayfinder(
        &self,
        host_id: &Id,
        event_id: &Id,
        verified_attendees: u32,
        early: bool,
    ) -> Result<bool>;
}

/// A `ResonanceAwarder` that records nothing and always reports "already
/// awarded", for tests that don't assert on ledger side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAwards;

impl ResonanceAwarder for NoAwards {
    fn try_award(
        &self,
        _user: &Id,
        _stat: &str,
        _points: u32,
        _source_object_id: &Id,
        _reason_code: &str,
    ) -> Result<bool> {
        Ok(false)
    }

    fn award_questing(&self, _user_id: &Id, _event_id: &Id, _confirmed_early: bool, _checkin_on_time: bool) -> Result<bool> {
        Ok(false)
    }

    fn award_mana(&self, _helper_id: &Id, _receiver_id: &Id, _event_id: &Id, _early: bool, _tag_selected: bool) -> Result<bool> {
        Ok(false)
    }

    fn award_wayfinder(&self, _host_id: &Id, _event_id: &Id, _verified_attendees: u32, _early: bool) -> Result<bool> {
        Ok(false)
    }
}
