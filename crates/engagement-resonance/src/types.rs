use chrono::{DateTime, NaiveDate, Utc};
use engagement_common::Id;
use serde::{Deserialize, Serialize};

/// The five additive Resonance stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Questing,
    Mana,
    Wayfinder,
    Attunement,
    Nexus,
}

impl Stat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Questing => "questing",
            Self::Mana => "mana",
            Self::Wayfinder => "wayfinder",
            Self::Attunement => "attunement",
            Self::Nexus => "nexus",
        }
    }

    /// Daily per-stat caps from Nexus has no daily cap since
    /// it's computed monthly, not earned transactionally.
    pub fn daily_cap(&self) -> Option<u32> {
        match self {
            Self::Questing => Some(40),
            Self::Mana => Some(32),
            Self::Wayfinder => Some(30),
            Self::Attunement => Some(20),
            Self::Nexus => None,
        }
    }
}

/// One immutable award row. `(user_id, stat, source_object_id)` is unique —
/// the ledger's idempotence contract (step 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Id,
    pub user_id: Id,
    pub stat: Stat,
    pub points: u32,
    pub source_object_id: Id,
    pub reason_code: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The ledger row's own id is deterministic from the uniqueness key so
    /// `insert_unique` is the sole enforcement point — no separate lookup
    /// needed before the write.
    pub fn key(user_id: &Id, stat: Stat, source_object_id: &Id) -> Id {
        Id::new(
            "ledger",
            format!("{}-{}-{}", user_id.as_str(), stat.as_str(), source_object_id.as_str()),
        )
    }
}

/// Per-user, per-stat, per-day accumulator used to trim awards at the
/// daily cap (step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCap {
    pub user_id: Id,
    pub stat: Stat,
    pub day: NaiveDate,
    pub earned: u32,
}

impl DailyCap {
    pub fn key(user_id: &Id, stat: Stat, day: NaiveDate) -> Id {
        Id::new("dailycap", format!("{}-{}-{}", user_id.as_str(), stat.as_str(), day))
    }
}

/// Running per-user totals, one row per user. Incremented alongside each
/// ledger write so reads don't need to sum the ledger table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResonanceScore {
    pub user_id: Id,
    pub questing: u32,
    pub mana: u32,
    pub wayfinder: u32,
    pub attunement: u32,
    pub nexus: u32,
    pub total: u32,
}

impl ResonanceScore {
    pub fn new(user_id: Id) -> Self {
        Self { user_id, ..Default::default() }
    }

    pub fn add(&mut self, stat: Stat, points: u32) {
        match stat {
            Stat::Questing => self.questing += points,
            Stat::Mana => self.mana += points,
            Stat::Wayfinder => self.wayfinder += points,
            Stat::Attunement => self.attunement += points,
            Stat::Nexus => self.nexus += points,
        }
        self.total += points;
    }
}

/// Tracks how many Mana-awarding sessions a helper/receiver pair has shared,
/// driving the pairwise diminishing-returns factor (reusing
/// the same diminishing-returns factor table used by pool matching).
/// Scoped to C5's own namespace
/// rather than shared with the compatibility engine's pool-matching table
/// of the same name, to keep the two crates decoupled (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportPairCount {
    pub helper_id: Id,
    pub receiver_id: Id,
    pub count: u32,
    pub last_session: DateTime<Utc>,
}

impl SupportPairCount {
    pub fn key(helper_id: &Id, receiver_id: &Id) -> Id {
        Id::new("pair", format!("{}-{}", helper_id.as_str(), receiver_id.as_str()))
    }

    /// `f(c)` from 1.0 below 3 sessions, 0.5 below 6, 0.25 beyond.
    pub fn factor(count: u32) -> f64 {
        if count < 3 {
            1.0
        } else if count < 6 {
            0.5
        } else {
            0.25
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_add_updates_stat_and_total() {
        let mut score = ResonanceScore::new(Id::new("user", "u1"));
        score.add(Stat::Questing, 12);
        score.add(Stat::Mana, 8);
        assert_eq!(score.questing, 12);
        assert_eq!(score.mana, 8);
        assert_eq!(score.total, 20);
    }

    #[test]
    fn pair_factor_steps_down_at_3_and_6() {
        assert_eq!(SupportPairCount::factor(0), 1.0);
        assert_eq!(SupportPairCount::factor(2), 1.0);
        assert_eq!(SupportPairCount::factor(3), 0.5);
        assert_eq!(SupportPairCount::factor(5), 0.5);
        assert_eq!(SupportPairCount::factor(6), 0.25);
        assert_eq!(SupportPairCount::factor(50), 0.25);
    }
}
