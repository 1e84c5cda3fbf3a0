use chrono::{DateTime, Utc};
use engagement_common::Id;
use serde::{Deserialize, Serialize};

/// What a vote is attached to ("scoped `guild|adventure|event|global`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteScope {
    Guild,
    Adventure,
    Event,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Single,
    Multi,
    Ranked,
    Approval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    Draft,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsVisibility {
    /// Tally visible to anyone who could see the vote itself.
    Public,
    /// Tally visible only once the vote closes.
    OnClose,
    /// Tally visible only to the organizer who created it.
    OrganizerOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOption {
    pub id: Id,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Id,
    pub scope: VoteScope,
    pub scope_id: Id,
    pub vote_type: VoteType,
    pub prompt: String,
    pub options: Vec<VoteOption>,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub results_visibility: ResultsVisibility,
    pub status: VoteStatus,
}

impl Vote {
    /// Whether casting a ballot is currently permitted.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == VoteStatus::Open && now >= self.opens_at && now < self.closes_at
    }
}

/// One member's submission. `voter_display_name` is a snapshot taken at
/// cast time so a ballot stays attributable even if the user later renames
/// ("snapshot of voter identity embedded in ballot, for
/// durability if user renames").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteBallot {
    pub id: Id,
    pub vote_id: Id,
    pub voter_id: Id,
    pub voter_display_name: String,
    /// Selected option ids. `single`/`approval`: unordered set (one entry
    /// for `single`). `multi`: unordered set, any size. `ranked`: ordered
    /// most-to-least preferred.
    pub selections: Vec<Id>,
    pub cast_at: DateTime<Utc>,
}

impl VoteBallot {
    pub fn key(vote_id: &Id, voter_id: &Id) -> Id {
        Id::new("ballot", format!("{}-{}", vote_id.local(), voter_id.local()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TallyResult {
    /// Final vote counts per option after tallying (for `ranked`, the
    /// counts from the deciding round).
    pub counts: std::collections::HashMap<String, u32>,
    pub winner: Option<Id>,
    pub total_ballots: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn vote_is_open_only_within_its_window() {
        let now = Utc::now();
        let vote = Vote {
            id: Id::new("vote", "v1"),
            scope: VoteScope::Adventure,
            scope_id: Id::new("adventure", "a1"),
            vote_type: VoteType::Single,
            prompt: "Where next?".into(),
            options: vec![],
            opens_at: now - Duration::hours(1),
            closes_at: now + Duration::hours(1),
            results_visibility: ResultsVisibility::Public,
            status: VoteStatus::Open,
        };
        assert!(vote.is_open_at(now));
        assert!(!vote.is_open_at(now + Duration::hours(2)));
    }
}
