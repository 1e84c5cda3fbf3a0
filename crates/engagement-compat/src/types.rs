use chrono::NaiveDate;
use engagement_common::Id;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weight table from "irrelevant=0, little=1, somewhat=10,
/// very=50, mandatory=250".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Irrelevant,
    Little,
    Somewhat,
    Very,
    Mandatory,
}

impl Importance {
    pub fn weight(&self) -> u32 {
        match self {
            Self::Irrelevant => 0,
            Self::Little => 1,
            Self::Somewhat => 10,
            Self::Very => 50,
            Self::Mandatory => 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub key: String,
    pub implicit_bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    pub options: Vec<QuestionOption>,
    /// Options whose selection makes an answer count toward `yikes_count`
    /// on a gated submission (step 1).
    pub yikes_options: HashSet<String>,
}

impl Question {
    pub fn option_bias(&self, key: &str) -> Option<f64> {
        self.options.iter().find(|o| o.key == key).map(|o| o.implicit_bias)
    }
}

/// `(question_id, user_id)` unique: one answer per user per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Id,
    pub question_id: Id,
    pub user_id: Id,
    pub selected_option: String,
    pub acceptable_options: HashSet<String>,
    pub importance: Importance,
    pub is_dealbreaker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasStatus {
    Normal,
    Warning,
    Concern,
}

/// Rolling accumulator over a user's answered `implicit_bias` values.
/// `sum`/`count` rather than a stored average so an update is a simple
/// atomic increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBiasProfile {
    pub user_id: Id,
    pub sum: f64,
    pub count: u32,
}

impl UserBiasProfile {
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// `warning` at `avg <= warning_threshold/10`, `concern` at the
    /// stronger `avg <= concern_threshold/10`. Thresholds
    /// are supplied by the caller rather than hardcoded since they're a
    /// guild-level moderation policy, not a C4 constant.
    pub fn status(&self, warning_threshold: f64, concern_threshold: f64) -> BiasStatus {
        let avg = self.average();
        if avg <= concern_threshold / 10.0 {
            BiasStatus::Concern
        } else if avg <= warning_threshold / 10.0 {
            BiasStatus::Warning
        } else {
            BiasStatus::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl MatchFrequency {
    pub fn as_duration(&self) -> chrono::Duration {
        match self {
            Self::Weekly => chrono::Duration::weeks(1),
            Self::Biweekly => chrono::Duration::weeks(2),
            Self::Monthly => chrono::Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPool {
    pub id: Id,
    pub guild_id: Id,
    pub frequency: MatchFrequency,
    pub match_size: usize,
    pub next_match_on: chrono::DateTime<chrono::Utc>,
    pub activity_suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMember {
    pub pool_id: Id,
    pub user_id: Id,
    pub excluded_members: HashSet<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Scheduled,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: Id,
    pub pool_id: Id,
    pub members: Vec<Id>,
    pub match_round: NaiveDate,
    pub status: MatchStatus,
}

/// Per-day discovery-browse counter, garbage-collected by
/// `DiscoveryQuotaGC`. The discovery feed handler that increments this
/// lives outside this crate's scope; the engine only owns the counter's
/// lifecycle (increment + GC), mirroring `engagement_resonance::DailyCap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryCounter {
    pub user_id: Id,
    pub day: NaiveDate,
    pub count: u32,
}

impl DiscoveryCounter {
    pub fn key(user_id: &Id, day: NaiveDate) -> Id {
        Id::new("discoverycounter", format!("{}-{}", user_id.as_str(), day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_weight_table_matches_spec() {
        assert_eq!(Importance::Irrelevant.weight(), 0);
        assert_eq!(Importance::Little.weight(), 1);
        assert_eq!(Importance::Somewhat.weight(), 10);
        assert_eq!(Importance::Very.weight(), 50);
        assert_eq!(Importance::Mandatory.weight(), 250);
    }

    #[test]
    fn bias_status_escalates_with_lower_average() {
        let profile = UserBiasProfile {
            user_id: Id::new("user", "u1"),
            sum: -8.0,
            count: 2,
        };
        assert_eq!(profile.average(), -4.0);
        assert_eq!(profile.status(-30.0, -50.0), BiasStatus::Warning);
        assert_eq!(profile.status(-10.0, -35.0), BiasStatus::Concern);
    }
}
