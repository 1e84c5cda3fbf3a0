use engagement_common::Id;
use engagement_compat::Importance;
use engagement_rsvp::HelpfulnessRating;
use engagement_trust::{EndorsementKind, FlagSeverity, RatingKind};
use engagement_voting::{ResultsVisibility, VoteScope, VoteType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
pub struct RsvpSubmitRequest {
    pub user_id: Id,
    pub role_id: Option<Id>,
    pub note: Option<String>,
    #[serde(default)]
    pub plus_one_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    pub checkin_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub confirmed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: HelpfulnessRating,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub user_id: Id,
    pub question_id: Id,
    pub selected_option: String,
    pub acceptable_options: HashSet<String>,
    pub importance: Importance,
    #[serde(default)]
    pub is_dealbreaker: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompatibilityQuery {
    pub with: Id,
    #[serde(default)]
    pub questions: Vec<Id>,
}

#[derive(Debug, Serialize)]
pub struct CompatibilityResponse {
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct PoolMembershipRequest {
    pub user_id: Id,
}

#[derive(Debug, Deserialize)]
pub struct CreateVoteRequest {
    pub scope: VoteScope,
    pub scope_id: Id,
    pub vote_type: VoteType,
    pub prompt: String,
    pub options: Vec<String>,
    pub opens_at: chrono::DateTime<chrono::Utc>,
    pub closes_at: chrono::DateTime<chrono::Utc>,
    #[serde(default = "default_results_visibility")]
    pub results_visibility: ResultsVisibility,
}

fn default_results_visibility() -> ResultsVisibility {
    ResultsVisibility::Public
}

#[derive(Debug, Deserialize)]
pub struct CastBallotRequest {
    pub voter_id: Id,
    pub voter_display_name: String,
    pub selections: Vec<Id>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rater_id: Id,
    pub ratee_id: Id,
    pub anchor_type: String,
    pub anchor_id: Id,
    pub kind: RatingKind,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndorseRequest {
    pub endorser_id: Id,
    pub kind: EndorsementKind,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub severity: FlagSeverity,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub blocker_id: Id,
    pub blocked_id: Id,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub user_id: Id,
    #[serde(default)]
    pub guild_ids: Vec<Id>,
    #[serde(default)]
    pub target_ids: Vec<Id>,
}
