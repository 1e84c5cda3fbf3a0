use chrono::{DateTime, NaiveDate, Utc};
use engagement_common::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    Trust,
    Distrust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVisibility {
    Public,
    AdminOnly,
}

/// Keyed by `(rater, ratee, anchor_type, anchor_id)` — a
/// rater can rate the same ratee again only over a different anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustRating {
    pub id: Id,
    pub rater_id: Id,
    pub ratee_id: Id,
    pub anchor_type: String,
    pub anchor_id: Id,
    pub kind: RatingKind,
    pub review_visibility: ReviewVisibility,
    pub note: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl TrustRating {
    pub fn key(rater_id: &Id, ratee_id: &Id, anchor_type: &str, anchor_id: &Id) -> Id {
        Id::new(
            "rating",
            format!("{}-{}-{}-{}", rater_id.local(), ratee_id.local(), anchor_type, anchor_id.local()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRatingCount {
    pub user_id: Id,
    pub day: NaiveDate,
    pub count: u32,
}

impl DailyRatingCount {
    pub fn key(user_id: &Id, day: NaiveDate) -> Id {
        Id::new("ratingcap", format!("{}-{}", user_id.local(), day))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsementKind {
    Agree,
    Disagree,
}

/// `(endorser, rating_id)` unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: Id,
    pub endorser_id: Id,
    pub rating_id: Id,
    pub kind: EndorsementKind,
}

impl Endorsement {
    pub fn key(endorser_id: &Id, rating_id: &Id) -> Id {
        Id::new("endorsement", format!("{}-{}", endorser_id.local(), rating_id.local()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Routine,
    HateOrHarassment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationActionKind {
    Nudge,
    Warning,
    Suspension,
    Ban,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: Id,
    pub user_id: Id,
    pub kind: ModerationActionKind,
    pub reason: String,
    pub feature_restrictions: Vec<String>,
    pub created_on: DateTime<Utc>,
    /// `None` for a permanent ban.
    pub expires_at: Option<DateTime<Utc>>,
    pub appeal_after: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_key_is_stable_for_same_inputs() {
        let a = Id::new("user", "a");
        let b = Id::new("user", "b");
        let anchor = Id::new("event", "e1");
        let k1 = TrustRating::key(&a, &b, "event", &anchor);
        let k2 = TrustRating::key(&a, &b, "event", &anchor);
        assert_eq!(k1, k2);
    }
}
