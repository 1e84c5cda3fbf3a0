use crate::metrics::{AWARDS_CAP_TRIMMED, AWARDS_DUPLICATE, AWARDS_GRANTED};
use crate::types::{DailyCap, LedgerEntry, ResonanceScore, Stat, SupportPairCount};
use chrono::{DateTime, Utc};
use engagement_common::{Clock, EngagementError, EventSink, Id, ResonanceAwarder, Result};
use engagement_store::{AtomicBatch, RecordStore};
use serde_json::json;
use std::sync::Arc;

pub const TABLE_LEDGER: &str = "resonance_ledger";
pub const TABLE_DAILY_CAPS: &str = "resonance_daily_caps";
pub const TABLE_SCORES: &str = "resonance_scores";
pub const TABLE_SUPPORT_PAIR_COUNT: &str = "resonance_support_pair_count";
pub const TABLE_ANSWERED: &str = "resonance_answered_marks";
pub const TABLE_PROFILE_REFRESH: &str = "resonance_profile_refresh_marks";

/// C5 — the Resonance Ledger: additive-only point awards,
/// gated by `(user, stat, source_object_id)` uniqueness and per-stat daily
/// caps, with the per-formula award helpers for each stat.
pub struct ResonanceLedger<S: RecordStore> {
    store: S,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore + Clone> ResonanceLedger<S> {
    pub fn new(store: S, sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self { store, sink, clock }
    }

    fn score_for(&self, user_id: &Id) -> Result<ResonanceScore> {
        Ok(self
            .store
            .get_opt(TABLE_SCORES, user_id)?
            .unwrap_or_else(|| ResonanceScore::new(user_id.clone())))
    }

    fn cap_for(&self, user_id: &Id, stat: Stat, day: chrono::NaiveDate) -> Result<DailyCap> {
        let key = DailyCap::key(user_id, stat, day);
        Ok(self.store.get_opt(TABLE_DAILY_CAPS, &key)?.unwrap_or(DailyCap {
            user_id: user_id.clone(),
            stat,
            day,
            earned: 0,
        }))
    }

    /// Attempts to award points, gated by uniqueness and the daily cap.
    /// `raw_points` is the formula's
    /// pre-cap-trim value; this function performs the trim (step 2) itself
    /// rather than requiring the caller to pre-compute `cap_remaining`, so
    /// every award helper below can call straight through.
    pub fn try_award(
        &self,
        user_id: &Id,
        stat: Stat,
        raw_points: u32,
        source_object_id: &Id,
        reason_code: &str,
    ) -> Result<bool> {
        if raw_points == 0 {
            return Ok(false);
        }
        let ledger_key = LedgerEntry::key(user_id, stat, source_object_id);
        if self
            .store
            .get_opt::<LedgerEntry>(TABLE_LEDGER, &ledger_key)?
            .is_some()
        {
            AWARDS_DUPLICATE.inc();
            return Ok(false);
        }

        let now = self.clock.now();
        let day = now.date_naive();
        let cap = stat.daily_cap();
        let mut daily_cap = self.cap_for(user_id, stat, day)?;
        let remaining = cap.map(|c| c.saturating_sub(daily_cap.earned)).unwrap_or(raw_points);
        let award = raw_points.min(remaining);
        if award == 0 {
            AWARDS_CAP_TRIMMED.inc();
            return Ok(false);
        }

        let entry = LedgerEntry {
            id: ledger_key.clone(),
            user_id: user_id.clone(),
            stat,
            points: award,
            source_object_id: source_object_id.clone(),
            reason_code: reason_code.to_string(),
            created_at: now,
        };
        daily_cap.earned += award;
        let mut score = self.score_for(user_id)?;
        score.add(stat, award);

        let mut batch = AtomicBatch::new();
        batch.insert_unique(TABLE_LEDGER, ledger_key, &entry)?;
        batch.put(TABLE_DAILY_CAPS, DailyCap::key(user_id, stat, day), &daily_cap)?;
        batch.put(TABLE_SCORES, user_id.clone(), &score)?;
        match self.store.commit(batch) {
            Ok(()) => {
                AWARDS_GRANTED.inc();
                self.sink.publish(
                    "resonance.awarded",
                    Some(user_id.clone()),
                    json!({
                        "user_id": user_id.as_str(),
                        "stat": stat.as_str(),
                        "points": award,
                        "source_object_id": source_object_id.as_str(),
                    }),
                );
                Ok(true)
            }
            Err(EngagementError::UniqueConstraint(_)) => {
                AWARDS_DUPLICATE.inc();
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Questing: `10 + 2·[confirmed_early] + 2·[checkin within ±10 min]`, cap 40.
    pub fn award_questing(
        &self,
        user_id: &Id,
        event_id: &Id,
        confirmed_early: bool,
        checkin_on_time: bool,
    ) -> Result<bool> {
        let points = 10 + if confirmed_early { 2 } else { 0 } + if checkin_on_time { 2 } else { 0 };
        self.try_award(user_id, Stat::Questing, points, event_id, "questing")
    }

    /// Mana: `12 + 2·[early] + 2·[tag_selected]`, scaled by the
    /// diminishing-returns pairwise factor, cap 32. Also increments the
    /// helper/receiver `SupportPairCount`, regardless of whether the
    /// award itself was trimmed to zero — the side effect tracks sessions,
    /// not points.
    pub fn award_mana(
        &self,
        helper_id: &Id,
        receiver_id: &Id,
        event_id: &Id,
        early: bool,
        tag_selected: bool,
    ) -> Result<bool> {
        let pair_count = self.increment_support_pair_count(helper_id, receiver_id)?;
        let base = 12.0 + if early { 2.0 } else { 0.0 } + if tag_selected { 2.0 } else { 0.0 };
        let factor = SupportPairCount::factor(pair_count.saturating_sub(1));
        let points = (base * factor).round() as u32;
        self.try_award(helper_id, Stat::Mana, points, event_id, "mana")
    }

    fn increment_support_pair_count(&self, helper_id: &Id, receiver_id: &Id) -> Result<u32> {
        let key = SupportPairCount::key(helper_id, receiver_id);
        let mut pair = self.store.get_opt::<SupportPairCount>(TABLE_SUPPORT_PAIR_COUNT, &key)?.unwrap_or(
            SupportPairCount {
                helper_id: helper_id.clone(),
                receiver_id: receiver_id.clone(),
                count: 0,
                last_session: self.clock.now(),
            },
        );
        pair.count += 1;
        pair.last_session = self.clock.now();
        self.store.put(TABLE_SUPPORT_PAIR_COUNT, key, &pair)?;
        Ok(pair.count)
    }

    /// `ResetExpiredSupportPairCounts` (`PairCountReset`):
    /// zeroes counters whose `last_session` is older than 30 days.
    pub fn reset_expired_support_pair_counts(&self) -> Result<u32> {
        let cutoff = self.clock.now() - chrono::Duration::days(30);
        let stale = self
            .store
            .scan::<SupportPairCount>(TABLE_SUPPORT_PAIR_COUNT, |p| p.last_session < cutoff)?;
        let mut batch = AtomicBatch::new();
        for mut pair in stale.clone() {
            pair.count = 0;
            batch.put(TABLE_SUPPORT_PAIR_COUNT, SupportPairCount::key(&pair.helper_id, &pair.receiver_id), &pair)?;
        }
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        Ok(stale.len() as u32)
    }

    /// Wayfinder (host): `8 + 2·min(verified_attendees, 4) + 2·[early]`, cap 30.
    pub fn award_wayfinder(
        &self,
        host_id: &Id,
        event_id: &Id,
        verified_attendees: u32,
        early: bool,
    ) -> Result<bool> {
        let points = 8 + 2 * verified_attendees.min(4) + if early { 2 } else { 0 };
        self.try_award(host_id, Stat::Wayfinder, points, event_id, "wayfinder")
    }

    /// Attunement: `+2` the first time a user answers a given question,
    /// unique on `(user, answer, q)`.
    pub fn award_attunement_answer(&self, user_id: &Id, question_id: &Id, answer_id: &Id) -> Result<bool> {
        let source = Id::new(
            "answer",
            format!("{}-{}", question_id.local(), answer_id.local()),
        );
        self.try_award(user_id, Stat::Attunement, 2, &source, "attunement-answer")
    }

    /// Attunement: `+10` per monthly substantive profile refresh, unique on
    /// `(user, "profile-refresh-YYYY-MM")`.
    pub fn award_attunement_profile_refresh(&self, user_id: &Id, now: DateTime<Utc>) -> Result<bool> {
        let source = Id::new("profile-refresh", now.format("%Y-%m").to_string());
        self.try_award(user_id, Stat::Attunement, 10, &source, "attunement-profile-refresh")
    }

    /// Nexus: one ledger row per user per month, computed by
    /// [`crate::nexus::compute_nexus`] and handed here for the actual award.
    pub fn award_nexus(&self, user_id: &Id, nexus_total: u32, month: &str) -> Result<bool> {
        let source = Id::new("month", month);
        self.try_award(user_id, Stat::Nexus, nexus_total, &source, "nexus-monthly")
    }

    pub fn score(&self, user_id: &Id) -> Result<ResonanceScore> {
        self.score_for(user_id)
    }
}

impl<S: RecordStore + Clone> ResonanceAwarder for ResonanceLedger<S> {
    fn try_award(&self, user: &Id, stat: &str, points: u32, source_object_id: &Id, reason_code: &str) -> Result<bool> {
        let stat = match stat {
            "questing" => Stat::Questing,
            "mana" => Stat::Mana,
            "wayfinder" => Stat::Wayfinder,
            "attunement" => Stat::Attunement,
            "nexus" => Stat::Nexus,
            other => return Err(EngagementError::Validation(format!("unknown resonance stat `{other}`"))),
        };
        ResonanceLedger::try_award(self, user, stat, points, source_object_id, reason_code)
    }

    fn award_questing(&self, user_id: &Id, event_id: &Id, confirmed_early: bool, checkin_on_time: bool) -> Result<bool> {
        ResonanceLedger::award_questing(self, user_id, event_id, confirmed_early, checkin_on_time)
    }

    fn award_mana(&self, helper_id: &Id, receiver_id: &Id, event_id: &Id, early: bool, tag_selected: bool) -> Result<bool> {
        ResonanceLedger::award_mana(self, helper_id, receiver_id, event_id, early, tag_selected)
    }

    fn award_wayfinder(&self, host_id: &Id, event_id: &Id, verified_attendees: u32, early: bool) -> Result<bool> {
        ResonanceLedger::award_wayfinder(self, host_id, event_id, verified_attendees, early)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engagement_common::{FixedClock, NoSink, SystemClock};
    use engagement_store::MemoryStore;

    fn ledger() -> ResonanceLedger<MemoryStore> {
        ResonanceLedger::new(MemoryStore::new(), Arc::new(NoSink), Arc::new(SystemClock))
    }

    #[test]
    fn idempotent_award_scenario_4() {
        let ledger = ledger();
        let user = Id::new("user", "u");
        let event = Id::new("event", "e");
        let first = ledger.try_award(&user, Stat::Questing, 12, &event, "questing").unwrap();
        let second = ledger.try_award(&user, Stat::Questing, 12, &event, "questing").unwrap();
        assert!(first);
        assert!(!second);
        let rows = ledger.store.scan::<LedgerEntry>(TABLE_LEDGER, |_| true).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(ledger.score(&user).unwrap().questing, 12);
    }

    #[test]
    fn daily_cap_trims_excess_questing_awards() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let ledger = ResonanceLedger::new(MemoryStore::new(), Arc::new(NoSink), clock);
        let user = Id::new("user", "u");
        for i in 0..4 {
            let event = Id::new("event", format!("e{i}"));
            ledger.award_questing(&user, &event, true, true).unwrap();
        }
        assert_eq!(ledger.score(&user).unwrap().questing, 40);
        let fifth = Id::new("event", "e-overflow");
        assert!(!ledger.award_questing(&user, &fifth, true, true).unwrap());
        assert_eq!(ledger.score(&user).unwrap().questing, 40);
    }

    #[test]
    fn mana_pairwise_factor_steps_down_after_three_sessions() {
        let ledger = ledger();
        let helper = Id::new("user", "helper");
        let receiver = Id::new("user", "receiver");
        for i in 0..3 {
            let event = Id::new("event", format!("e{i}"));
            ledger.award_mana(&helper, &receiver, &event, false, false).unwrap();
        }
        assert_eq!(ledger.score(&helper).unwrap().mana, 36);
        let fourth = Id::new("event", "e3");
        ledger.award_mana(&helper, &receiver, &fourth, false, false).unwrap();
        assert_eq!(ledger.score(&helper).unwrap().mana, 42);
    }

    #[test]
    fn attunement_answer_is_unique_per_question() {
        let ledger = ledger();
        let user = Id::new("user", "u");
        let question = Id::new("question", "q1");
        let answer = Id::new("answer", "a1");
        assert!(ledger.award_attunement_answer(&user, &question, &answer).unwrap());
        assert!(!ledger.award_attunement_answer(&user, &question, &answer).unwrap());
        assert_eq!(ledger.score(&user).unwrap().attunement, 2);
    }
}
