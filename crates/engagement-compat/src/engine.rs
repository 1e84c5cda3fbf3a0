use crate::types::{
    Answer, DiscoveryCounter, MatchResult, MatchStatus, MatchingPool, PoolMember, Question,
    QuestionOption, UserBiasProfile,
};
use engagement_common::{
    AlignmentResult, AlignmentScorer, BlockChecker, Clock, EngagementError, EventSink, Id, Result,
};
use engagement_resonance::SupportPairCount;
use engagement_store::{AtomicBatch, RecordStore};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

pub const TABLE_QUESTIONS: &str = "compat_questions";
pub const TABLE_ANSWERS: &str = "compat_answers";
pub const TABLE_BIAS_PROFILES: &str = "compat_bias_profiles";
pub const TABLE_POOLS: &str = "compat_pools";
pub const TABLE_POOL_MEMBERS: &str = "compat_pool_members";
pub const TABLE_MATCH_RESULTS: &str = "compat_match_results";
pub use engagement_resonance::ledger::TABLE_SUPPORT_PAIR_COUNT;
pub const TABLE_DISCOVERY_COUNTERS: &str = "compat_discovery_counters";

/// Configuration knobs for the pairwise diminishing-returns / recent-match
/// penalty (step 3), a small `Default`-able struct owned
/// by the engine rather than threading constants through every call.
#[derive(Debug, Clone, Copy)]
pub struct CompatConfig {
    pub recent_match_window_days: i64,
    pub recent_match_penalty: f64,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            recent_match_window_days: 30,
            recent_match_penalty: 0.25,
        }
    }
}

/// C4 — pairwise compatibility, bias-profile accumulation, and Donut-style
/// pool matching. Generic over the store like C2/C3.
pub struct CompatEngine<S: RecordStore> {
    store: S,
    blocks: Arc<dyn BlockChecker>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: CompatConfig,
}

impl<S: RecordStore> CompatEngine<S> {
    pub fn new(store: S, blocks: Arc<dyn BlockChecker>, sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            blocks,
            sink,
            clock,
            config: CompatConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompatConfig) -> Self {
        self.config = config;
        self
    }

    fn answer_for(&self, user: &Id, question: &Id) -> Result<Option<Answer>> {
        let q = question.clone();
        let u = user.clone();
        let mut found = self.store.scan(TABLE_ANSWERS, move |a: &Answer| {
            a.question_id == q && a.user_id == u
        })?;
        Ok(found.pop())
    }

    /// `questions` is the set both parties are expected to
    /// have answered; a question either side hasn't answered is skipped.
    pub fn pairwise_compatibility(&self, a: &Id, b: &Id, questions: &[Id]) -> Result<f64> {
        let mut score_ab_num = 0.0;
        let mut score_ab_den = 0.0;
        let mut score_ba_num = 0.0;
        let mut score_ba_den = 0.0;

        for q in questions {
            let (Some(answer_a), Some(answer_b)) =
                (self.answer_for(a, q)?, self.answer_for(b, q)?)
            else {
                continue;
            };

            let match_ab = answer_b.acceptable_options.contains(&answer_a.selected_option) as u8 as f64;
            let match_ba = answer_a.acceptable_options.contains(&answer_b.selected_option) as u8 as f64;

            if answer_a.is_dealbreaker && match_ab == 0.0 {
                return Ok(0.0);
            }
            if answer_b.is_dealbreaker && match_ba == 0.0 {
                return Ok(0.0);
            }

            let w_a = answer_a.importance.weight() as f64;
            let w_b = answer_b.importance.weight() as f64;
            score_ab_num += w_a * match_ab;
            score_ab_den += w_a;
            score_ba_num += w_b * match_ba;
            score_ba_den += w_b;
        }

        let score_ab = score_ab_num / score_ab_den.max(1.0);
        let score_ba = score_ba_num / score_ba_den.max(1.0);
        Ok((score_ab * score_ba).sqrt() * 100.0)
    }

    /// Records or replaces a user's answer and folds its option's
    /// `implicit_bias` into the rolling `UserBiasProfile`.
    pub fn record_answer(&self, question: &Question, answer: Answer) -> Result<()> {
        let bias = question
            .option_bias(&answer.selected_option)
            .unwrap_or(0.0);
        let profile_id = Id::new("bias_profile", answer.user_id.local());
        let mut profile = self
            .store
            .get_opt::<UserBiasProfile>(TABLE_BIAS_PROFILES, &profile_id)?
            .unwrap_or(UserBiasProfile {
                user_id: answer.user_id.clone(),
                sum: 0.0,
                count: 0,
            });
        profile.sum += bias;
        profile.count += 1;

        let mut batch = AtomicBatch::new();
        batch.put(TABLE_ANSWERS, answer.id.clone(), &answer)?;
        batch.put(TABLE_BIAS_PROFILES, profile_id, &profile)?;
        self.store.commit(batch)
    }

    /// Reads the same `SupportPairCount` rows C5 writes on every Mana award
    /// (`SupportPairCount::key` is directional, helper -> receiver, so a
    /// pool pair's combined count is the sum of both directions).
    fn support_pair_factor(&self, a: &Id, b: &Id) -> Result<f64> {
        let count = self.support_pair_count(a, b)? + self.support_pair_count(b, a)?;
        Ok(SupportPairCount::factor(count))
    }

    fn support_pair_count(&self, helper: &Id, receiver: &Id) -> Result<u32> {
        let key = SupportPairCount::key(helper, receiver);
        Ok(self
            .store
            .get_opt::<SupportPairCount>(TABLE_SUPPORT_PAIR_COUNT, &key)?
            .map(|p| p.count)
            .unwrap_or(0))
    }

    /// Builds the compatibility matrix, applies exclusions,
    /// blocks, diminishing returns and the recent-match penalty, then
    /// partitions members into groups of `pool.match_size` with a greedy
    /// maximum-weight heuristic (documented simplification of Hungarian
    /// / Blossom assignment — see DESIGN.md).
    pub fn run_pool_match(&self, pool_id: &Id, questions: &[Id]) -> Result<Vec<MatchResult>> {
        let pool: MatchingPool = self.store.get(TABLE_POOLS, pool_id)?;
        let pool_id_for_scan = pool_id.clone();
        let members: Vec<PoolMember> = self
            .store
            .scan(TABLE_POOL_MEMBERS, move |m: &PoolMember| {
                m.pool_id == pool_id_for_scan
            })?;
        let user_ids: Vec<Id> = members.iter().map(|m| m.user_id.clone()).collect();

        if user_ids.len() < pool.match_size {
            warn!(pool = %pool_id, "too few active members for a match round, advancing cadence only");
            self.advance_pool(&pool)?;
            return Ok(vec![]);
        }

        let mut weights: HashMap<(Id, Id), f64> = HashMap::new();
        for i in 0..user_ids.len() {
            for j in (i + 1)..user_ids.len() {
                let a = &user_ids[i];
                let b = &user_ids[j];
                if self.blocks.is_blocked(a, b)? {
                    continue;
                }
                if members[i].excluded_members.contains(b) || members[j].excluded_members.contains(a) {
                    continue;
                }
                let mut w = self.pairwise_compatibility(a, b, questions)?;
                w *= self.support_pair_factor(a, b)?;
                if self.matched_recently(a, b)? {
                    w *= self.config.recent_match_penalty;
                }
                weights.insert((a.clone(), b.clone()), w);
            }
        }

        let groups = greedy_group_assignment(&user_ids, pool.match_size, &weights);
        let round = self.clock.now().date_naive();
        let mut results = Vec::new();
        let mut batch = AtomicBatch::new();
        for (idx, group) in groups.iter().enumerate() {
            let result = MatchResult {
                id: Id::new("match", format!("{}-{}-{}", pool_id.local(), round, idx)),
                pool_id: pool_id.clone(),
                members: group.clone(),
                match_round: round,
                status: MatchStatus::Pending,
            };
            batch.put(TABLE_MATCH_RESULTS, result.id.clone(), &result)?;
            results.push(result);
        }
        self.advance_pool_in_batch(&mut batch, &pool)?;
        self.store.commit(batch)?;

        for result in &results {
            self.sink.publish(
                "pool.match_created",
                None,
                json!({
                    "pool_id": pool_id.as_str(),
                    "match_id": result.id.as_str(),
                    "members": result.members.iter().map(Id::as_str).collect::<Vec<_>>(),
                }),
            );
        }
        info!(pool = %pool_id, matches = results.len(), "pool match round complete");
        Ok(results)
    }

    fn matched_recently(&self, a: &Id, b: &Id) -> Result<bool> {
        let cutoff = self.clock.now() - chrono::Duration::days(self.config.recent_match_window_days);
        let pair_a = a.clone();
        let pair_b = b.clone();
        let recent: Vec<MatchResult> = self.store.scan(TABLE_MATCH_RESULTS, move |m: &MatchResult| {
            m.members.contains(&pair_a) && m.members.contains(&pair_b)
        })?;
        Ok(recent.iter().any(|m| {
            m.match_round
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc() >= cutoff)
                .unwrap_or(false)
        }))
    }

    /// `/guilds/{id}/pools/{id}/join`.
    pub fn join_pool(&self, pool_id: &Id, user_id: &Id) -> Result<()> {
        let member = PoolMember {
            pool_id: pool_id.clone(),
            user_id: user_id.clone(),
            excluded_members: HashSet::new(),
        };
        self.store.insert_unique(
            TABLE_POOL_MEMBERS,
            Id::new("poolmember", format!("{}-{}", pool_id.local(), user_id.local())),
            &member,
        )
    }

    /// `/guilds/{id}/pools/{id}/leave`.
    pub fn leave_pool(&self, pool_id: &Id, user_id: &Id) -> Result<()> {
        self.store
            .delete(TABLE_POOL_MEMBERS, &Id::new("poolmember", format!("{}-{}", pool_id.local(), user_id.local())))
    }

    /// `GetPoolsDueForMatching` (`PoolRound`).
    pub fn pools_due_for_matching(&self) -> Result<Vec<MatchingPool>> {
        let now = self.clock.now();
        self.store.scan(TABLE_POOLS, move |p: &MatchingPool| p.next_match_on <= now)
    }

    /// Increments today's discovery-browse counter for `user_id`. Called by
    /// the (out-of-scope) discovery feed handler before serving results.
    pub fn record_discovery(&self, user_id: &Id) -> Result<u32> {
        let day = self.clock.now().date_naive();
        let key = DiscoveryCounter::key(user_id, day);
        let mut counter = self
            .store
            .get_opt(TABLE_DISCOVERY_COUNTERS, &key)?
            .unwrap_or(DiscoveryCounter { user_id: user_id.clone(), day, count: 0 });
        counter.count += 1;
        self.store.put(TABLE_DISCOVERY_COUNTERS, key, &counter)?;
        Ok(counter.count)
    }

    /// `DiscoveryQuotaGC`: drops per-day discovery counters
    /// older than 30 days. Returns the number dropped.
    pub fn gc_discovery_counters(&self) -> Result<u32> {
        let cutoff = self.clock.now().date_naive() - chrono::Duration::days(30);
        let stale: Vec<DiscoveryCounter> =
            self.store.scan(TABLE_DISCOVERY_COUNTERS, |c: &DiscoveryCounter| c.day < cutoff)?;
        for counter in &stale {
            self.store.delete(TABLE_DISCOVERY_COUNTERS, &DiscoveryCounter::key(&counter.user_id, counter.day))?;
        }
        Ok(stale.len() as u32)
    }

    fn advance_pool(&self, pool: &MatchingPool) -> Result<()> {
        let mut updated = pool.clone();
        updated.next_match_on = self.clock.now() + updated.frequency.as_duration();
        self.store.put(TABLE_POOLS, updated.id.clone(), &updated)
    }

    fn advance_pool_in_batch(&self, batch: &mut AtomicBatch, pool: &MatchingPool) -> Result<()> {
        let mut updated = pool.clone();
        updated.next_match_on = self.clock.now() + updated.frequency.as_duration();
        batch.put(TABLE_POOLS, updated.id.clone(), &updated)?;
        Ok(())
    }
}

/// Greedily builds groups of `size` by repeatedly taking the
/// highest-weight remaining edge and filling its group with the
/// next-best-compatible remaining members. Not an optimal min-cost
/// assignment, but monotonically prefers higher total edge weight over
/// arbitrary grouping, and handles the `|members| % size != 0` leftover
/// case by simply not grouping the remainder ("leftover
/// members carry to the next round").
fn greedy_group_assignment(
    user_ids: &[Id],
    size: usize,
    weights: &HashMap<(Id, Id), f64>,
) -> Vec<Vec<Id>> {
    if size == 0 {
        return vec![];
    }
    let weight_of = |a: &Id, b: &Id| -> f64 {
        let key = if a.as_str() <= b.as_str() {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        *weights.get(&key).unwrap_or(&0.0)
    };

    let mut remaining: HashSet<Id> = user_ids.iter().cloned().collect();
    let mut groups = Vec::new();

    while remaining.len() >= size {
        let mut ordered: Vec<Id> = remaining.iter().cloned().collect();
        ordered.sort();
        let seed = ordered[0].clone();
        remaining.remove(&seed);

        let mut group = vec![seed.clone()];
        while group.len() < size {
            let mut candidates: Vec<Id> = remaining.iter().cloned().collect();
            candidates.sort();
            let best = candidates.into_iter().max_by(|x, y| {
                let score_x: f64 = group.iter().map(|m| weight_of(m, x)).sum();
                let score_y: f64 = group.iter().map(|m| weight_of(m, y)).sum();
                score_x.partial_cmp(&score_y).unwrap_or(std::cmp::Ordering::Equal)
            });
            let Some(best) = best else { break };
            remaining.remove(&best);
            group.push(best);
        }
        if group.len() == size {
            groups.push(group);
        } else {
            // Not enough remaining members to fill the last group; put
            // them back so they carry to the next round.
            for m in group {
                remaining.insert(m);
            }
            break;
        }
    }
    groups
}

impl<S: RecordStore> AlignmentScorer for CompatEngine<S> {
    fn score_against_questions(
        &self,
        user: &Id,
        anchor: Option<&Id>,
        questions: &[Id],
    ) -> Result<AlignmentResult> {
        let Some(anchor) = anchor else {
            return Ok(AlignmentResult {
                alignment_score: 1.0,
                yikes_count: 0,
            });
        };
        let mut yikes_count = 0;
        for q in questions {
            if let Some(answer) = self.answer_for(user, q)? {
                let question: Question = self.store.get(TABLE_QUESTIONS, q)?;
                if question.yikes_options.contains(&answer.selected_option) {
                    yikes_count += 1;
                }
            }
        }
        let compatibility = self.pairwise_compatibility(user, anchor, questions)?;
        Ok(AlignmentResult {
            alignment_score: compatibility / 100.0,
            yikes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engagement_common::{FixedClock, NoBlocks, NoSink};
    use engagement_store::MemoryStore;
    use std::collections::HashSet as Set;

    fn question(id: &str, yikes: &[&str]) -> Question {
        Question {
            id: Id::new("question", id),
            options: vec![
                QuestionOption { key: "x".into(), implicit_bias: 0.0 },
                QuestionOption { key: "y".into(), implicit_bias: -5.0 },
            ],
            yikes_options: yikes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn mandatory_answer(user: &str, question_id: &str, selected: &str, acceptable: &[&str]) -> Answer {
        Answer {
            id: Id::new("answer", format!("{question_id}-{user}")),
            question_id: Id::new("question", question_id),
            user_id: Id::new("user", user),
            selected_option: selected.to_string(),
            acceptable_options: acceptable.iter().map(|s| s.to_string()).collect(),
            importance: crate::types::Importance::Mandatory,
            is_dealbreaker: true,
        }
    }

    fn engine() -> (CompatEngine<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let engine = CompatEngine::new(
            store.clone(),
            Arc::new(NoBlocks),
            Arc::new(NoSink),
            Arc::new(FixedClock::new(chrono::Utc::now())),
        );
        (engine, store)
    }

    /// scenario 5, first half: identical mandatory acceptance on
    /// both sides scores 100.
    #[test]
    fn identical_mandatory_match_scores_100() {
        let (engine, _store) = engine();
        let q = question("q1", &[]);
        engine
            .record_answer(&q, mandatory_answer("a", "q1", "x", &["x"]))
            .unwrap();
        engine
            .record_answer(&q, mandatory_answer("b", "q1", "x", &["x"]))
            .unwrap();
        let score = engine
            .pairwise_compatibility(&Id::new("user", "a"), &Id::new("user", "b"), &[q.id.clone()])
            .unwrap();
        assert!((score - 100.0).abs() < 1e-9);
    }

    /// scenario 5, second half: B selects something outside A's
    /// acceptable set on a mandatory/dealbreaker question -> 0.
    #[test]
    fn dealbreaker_violation_zeroes_the_pair() {
        let (engine, _store) = engine();
        let q = question("q1", &[]);
        engine
            .record_answer(&q, mandatory_answer("a", "q1", "x", &["x"]))
            .unwrap();
        engine
            .record_answer(&q, mandatory_answer("b", "q1", "y", &["y"]))
            .unwrap();
        let score = engine
            .pairwise_compatibility(&Id::new("user", "a"), &Id::new("user", "b"), &[q.id.clone()])
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn compatibility_is_symmetric() {
        let (engine, _store) = engine();
        let q = question("q1", &[]);
        engine
            .record_answer(&q, mandatory_answer("a", "q1", "x", &["x", "y"]))
            .unwrap();
        engine
            .record_answer(&q, mandatory_answer("b", "q1", "y", &["x", "y"]))
            .unwrap();
        let ab = engine
            .pairwise_compatibility(&Id::new("user", "a"), &Id::new("user", "b"), &[q.id.clone()])
            .unwrap();
        let ba = engine
            .pairwise_compatibility(&Id::new("user", "b"), &Id::new("user", "a"), &[q.id.clone()])
            .unwrap();
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn bias_profile_accumulates_rolling_average() {
        let (engine, store) = engine();
        let q = question("q1", &[]);
        engine
            .record_answer(&q, mandatory_answer("a", "q1", "y", &["y"]))
            .unwrap();
        let profile: UserBiasProfile = store
            .get(TABLE_BIAS_PROFILES, &Id::new("bias_profile", "a"))
            .unwrap();
        assert_eq!(profile.average(), -5.0);
    }

    #[test]
    fn pool_below_match_size_advances_cadence_with_no_matches() {
        let (engine, store) = engine();
        let pool = MatchingPool {
            id: Id::new("pool", "p1"),
            guild_id: Id::new("guild", "g1"),
            frequency: crate::types::MatchFrequency::Weekly,
            match_size: 2,
            next_match_on: chrono::Utc::now(),
            activity_suggestion: None,
        };
        store.insert_unique(TABLE_POOLS, pool.id.clone(), &pool).unwrap();
        let member = PoolMember {
            pool_id: pool.id.clone(),
            user_id: Id::new("user", "solo"),
            excluded_members: Set::new(),
        };
        store
            .insert_unique(TABLE_POOL_MEMBERS, Id::new("poolmember", "solo"), &member)
            .unwrap();
        let results = engine.run_pool_match(&pool.id, &[]).unwrap();
        assert!(results.is_empty());
        let updated: MatchingPool = store.get(TABLE_POOLS, &pool.id).unwrap();
        assert!(updated.next_match_on > pool.next_match_on);
    }
}
