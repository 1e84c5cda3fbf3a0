use chrono::{DateTime, Utc};
use engagement_common::Id;
use serde::{Deserialize, Serialize};

/// "pending → {approved, rejected, waitlisted}; approved →
/// {attended, cancelled}; waitlisted → {approved, cancelled}; terminal:
/// rejected, cancelled, attended."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Pending,
    Approved,
    Rejected,
    Waitlisted,
    Attended,
    Cancelled,
}

impl RsvpStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Attended)
    }

    /// Counts toward effective headcount "Capacity
    /// accounting": "Σ (1 + plus_ones) over RSVPs in {approved, attended}".
    pub fn occupies_capacity(&self) -> bool {
        matches!(self, Self::Approved | Self::Attended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Requested,
    Admitted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedBy {
    SelfRequested,
    Invited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HelpfulnessRating {
    Yes,
    Somewhat,
    NotReally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlusOne {
    pub name: String,
}

/// The type of record a `UnifiedRSVP` targets: an Event or an Adventure
/// (describes both surfaces sharing one state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Event,
    Adventure,
}

/// `(target_type, target_id, user_id)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRsvp {
    pub id: Id,
    pub target_type: TargetType,
    pub target_id: Id,
    pub user_id: Id,
    pub status: RsvpStatus,
    pub role_id: Option<Id>,
    pub values_aligned: Option<bool>,
    pub alignment_score: Option<f64>,
    pub yikes_count: u32,
    pub plus_ones: Vec<PlusOne>,
    pub note: Option<String>,
    pub host_note: Option<String>,
    pub checkin_time: Option<DateTime<Utc>>,
    pub completion_confirmed: Option<DateTime<Utc>>,
    pub early_confirmed: bool,
    pub helpfulness_rating: Option<HelpfulnessRating>,
    pub helpfulness_tags: Vec<String>,
    pub created_on: DateTime<Utc>,
    pub reason_code: Option<String>,
}

impl UnifiedRsvp {
    pub fn headcount(&self) -> u32 {
        1 + self.plus_ones.len() as u32
    }
}

/// `(adventure_id, user_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureAdmission {
    pub id: Id,
    pub adventure_id: Id,
    pub user_id: Id,
    pub status: AdmissionStatus,
    pub requested_by: RequestedBy,
    pub invited_by: Option<Id>,
    pub rejection_reason: Option<String>,
}

/// Everything a caller supplies when submitting an RSVP: target, user,
/// role, optional note, plus-ones.
#[derive(Debug, Clone)]
pub struct RsvpRequest {
    pub target_type: TargetType,
    pub target_id: Id,
    pub user_id: Id,
    pub role_id: Option<Id>,
    pub note: Option<String>,
    pub plus_ones: Vec<PlusOne>,
}

/// Outcome of a completed submission, distinguishing the terminal status
/// reached from the reason it was reached (needed for the 422 "values
/// mismatch" / "full" responses).
#[derive(Debug, Clone, PartialEq)]
pub struct RsvpOutcome {
    pub rsvp: UnifiedRsvp,
}
