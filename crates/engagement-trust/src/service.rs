use crate::types::{
    DailyRatingCount, Endorsement, EndorsementKind, FlagSeverity, ModerationAction,
    ModerationActionKind, RatingKind, ReviewVisibility, TrustRating,
};
use chrono::{DateTime, Utc};
use engagement_common::{AnchorVerifier, BlockChecker, Clock, EngagementError, Id, Result};
use engagement_store::{AtomicBatch, RecordStore};
use std::sync::Arc;
use std::time::Duration;

pub const TABLE_RATINGS: &str = "trust_ratings";
pub const TABLE_RATING_CAPS: &str = "trust_rating_caps";
pub const TABLE_ENDORSEMENTS: &str = "trust_endorsements";
pub const TABLE_MODERATION_ACTIONS: &str = "moderation_actions";
const EDGE_BLOCKS: &str = "blocks";

const DAILY_RATING_CAP: u32 = 20;
const WARNING_DAYS: i64 = 7;
const SUSPENSION_DAYS: i64 = 30;
const SUSPENSION_APPEAL_AFTER_DAYS: i64 = 14;

/// C8 — trust ratings, endorsements, moderation progression, and blocking.
pub struct TrustService<S: RecordStore> {
    store: S,
    anchors: Arc<dyn AnchorVerifier>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore + Clone> TrustService<S> {
    pub fn new(store: S, anchors: Arc<dyn AnchorVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self { store, anchors, clock }
    }

    /// `CanRate` + rate-submission. `distrust` ratings are
    /// forced `admin_only`; `trust` is `public`.
    pub fn rate(
        &self,
        rater_id: &Id,
        ratee_id: &Id,
        anchor_type: &str,
        anchor_id: &Id,
        kind: RatingKind,
        note: Option<String>,
    ) -> Result<TrustRating> {
        if rater_id == ratee_id {
            return Err(EngagementError::Validation("cannot rate self".into()));
        }
        if !self.anchors.anchor_completed(anchor_type, anchor_id)? {
            return Err(EngagementError::Validation(format!(
                "anchor {anchor_type}:{anchor_id} is not a completed shared interaction"
            )));
        }

        let now = self.clock.now();
        let day = now.date_naive();
        let cap_key = DailyRatingCount::key(rater_id, day);
        let mut cap = self
            .store
            .get_opt::<DailyRatingCount>(TABLE_RATING_CAPS, &cap_key)?
            .unwrap_or(DailyRatingCount { user_id: rater_id.clone(), day, count: 0 });
        if cap.count >= DAILY_RATING_CAP {
            return Err(EngagementError::RateLimited { retry_after: Duration::from_secs(86_400) });
        }
        cap.count += 1;

        let review_visibility = match kind {
            RatingKind::Trust => ReviewVisibility::Public,
            RatingKind::Distrust => ReviewVisibility::AdminOnly,
        };
        let rating_id = TrustRating::key(rater_id, ratee_id, anchor_type, anchor_id);
        let rating = TrustRating {
            id: rating_id.clone(),
            rater_id: rater_id.clone(),
            ratee_id: ratee_id.clone(),
            anchor_type: anchor_type.to_string(),
            anchor_id: anchor_id.clone(),
            kind,
            review_visibility,
            note,
            created_on: now,
        };

        let mut batch = AtomicBatch::new();
        batch.insert_unique(TABLE_RATINGS, rating_id, &rating)?;
        batch.put(TABLE_RATING_CAPS, cap_key, &cap)?;
        self.store.commit(batch)?;
        Ok(rating)
    }

    /// `(endorser, rating_id)` unique.
    pub fn endorse(&self, endorser_id: &Id, rating_id: &Id, kind: EndorsementKind) -> Result<()> {
        let key = Endorsement::key(endorser_id, rating_id);
        let endorsement = Endorsement { id: key.clone(), endorser_id: endorser_id.clone(), rating_id: rating_id.clone(), kind };
        self.store.insert_unique(TABLE_ENDORSEMENTS, key, &endorsement)
    }

    pub fn endorsement_counts(&self, rating_id: &Id) -> Result<(u32, u32)> {
        let target = rating_id.clone();
        let all: Vec<Endorsement> = self.store.scan(TABLE_ENDORSEMENTS, move |e: &Endorsement| e.rating_id == target)?;
        let agree = all.iter().filter(|e| e.kind == EndorsementKind::Agree).count() as u32;
        let disagree = all.iter().filter(|e| e.kind == EndorsementKind::Disagree).count() as u32;
        Ok((agree, disagree))
    }

    /// Moderation progression: first flag -> `nudge`; a
    /// repeat routine flag -> `warning` (7d); a further repeat -> `suspension`
    /// (30d, appeal after 14d); `hate`/`harassment` always escalates straight
    /// to a permanent `ban` regardless of history.
    pub fn flag(&self, user_id: &Id, severity: FlagSeverity, reason: &str) -> Result<ModerationAction> {
        let now = self.clock.now();
        if severity == FlagSeverity::HateOrHarassment {
            return self.record_action(user_id, ModerationActionKind::Ban, reason, vec![], None, None, now);
        }

        let user = user_id.clone();
        let prior: Vec<ModerationAction> =
            self.store.scan(TABLE_MODERATION_ACTIONS, move |a: &ModerationAction| a.user_id == user)?;
        let (kind, expires_at, appeal_after, restrictions) = match prior.len() {
            0 => (ModerationActionKind::Nudge, None, None, vec![]),
            1 => (
                ModerationActionKind::Warning,
                Some(now + chrono::Duration::days(WARNING_DAYS)),
                None,
                vec!["posting".to_string(), "rsvp".to_string()],
            ),
            _ => (
                ModerationActionKind::Suspension,
                Some(now + chrono::Duration::days(SUSPENSION_DAYS)),
                Some(now + chrono::Duration::days(SUSPENSION_APPEAL_AFTER_DAYS)),
                vec![],
            ),
        };
        self.record_action(user_id, kind, reason, restrictions, expires_at, appeal_after, now)
    }

    fn record_action(
        &self,
        user_id: &Id,
        kind: ModerationActionKind,
        reason: &str,
        feature_restrictions: Vec<String>,
        expires_at: Option<DateTime<Utc>>,
        appeal_after: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ModerationAction> {
        let action = ModerationAction {
            id: Id::new("modaction", format!("{}-{}", user_id.local(), now.timestamp_micros())),
            user_id: user_id.clone(),
            kind,
            reason: reason.to_string(),
            feature_restrictions,
            created_on: now,
            expires_at,
            appeal_after,
            is_active: true,
        };
        self.store.put(TABLE_MODERATION_ACTIONS, action.id.clone(), &action)?;
        Ok(action)
    }

    /// `ModerationExpiry` job: deactivates actions whose
    /// `expires_at` has passed. Bans (`expires_at = None`) never expire.
    pub fn moderation_expiry(&self) -> Result<u32> {
        let now = self.clock.now();
        let expired: Vec<ModerationAction> = self.store.scan(TABLE_MODERATION_ACTIONS, move |a: &ModerationAction| {
            a.is_active && a.expires_at.is_some_and(|exp| exp <= now)
        })?;
        let mut batch = AtomicBatch::new();
        for mut action in expired.clone() {
            action.is_active = false;
            batch.put(TABLE_MODERATION_ACTIONS, action.id.clone(), &action)?;
        }
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        Ok(expired.len() as u32)
    }

    /// Block is instantaneous and enforced from the blocker's direction;
    /// `is_blocked` (below) treats it as mutually invisible for viewing
    /// purposes, matching the `CanView` rule.
    pub fn block(&self, blocker_id: &Id, blocked_id: &Id) -> Result<()> {
        self.store.add_edge(blocker_id, EDGE_BLOCKS, blocked_id)
    }

}

impl<S: RecordStore + Clone> BlockChecker for TrustService<S> {
    fn is_blocked(&self, a: &Id, b: &Id) -> Result<bool> {
        let a_blocks_b = self.store.edges_from(a, EDGE_BLOCKS)?.contains(b);
        let b_blocks_a = self.store.edges_from(b, EDGE_BLOCKS)?.contains(a);
        Ok(a_blocks_b || b_blocks_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engagement_common::{AlwaysAnchored, FixedClock, SystemClock};
    use engagement_store::MemoryStore;

    fn service() -> TrustService<MemoryStore> {
        TrustService::new(MemoryStore::new(), Arc::new(AlwaysAnchored), Arc::new(SystemClock))
    }

    #[test]
    fn distrust_rating_is_admin_only() {
        let svc = service();
        let rating = svc
            .rate(&Id::new("user", "a"), &Id::new("user", "b"), "event", &Id::new("event", "e1"), RatingKind::Distrust, None)
            .unwrap();
        assert_eq!(rating.review_visibility, ReviewVisibility::AdminOnly);
    }

    #[test]
    fn daily_rating_cap_blocks_the_21st_rating() {
        let svc = service();
        let rater = Id::new("user", "a");
        for i in 0..20 {
            let ratee = Id::new("user", format!("b{i}"));
            let anchor = Id::new("event", format!("e{i}"));
            svc.rate(&rater, &ratee, "event", &anchor, RatingKind::Trust, None).unwrap();
        }
        let err = svc
            .rate(&rater, &Id::new("user", "overflow"), "event", &Id::new("event", "e-overflow"), RatingKind::Trust, None)
            .unwrap_err();
        assert!(matches!(err, EngagementError::RateLimited { .. }));
    }

    #[test]
    fn repeated_flags_escalate_nudge_warning_suspension() {
        let svc = service();
        let user = Id::new("user", "offender");
        let first = svc.flag(&user, FlagSeverity::Routine, "spam").unwrap();
        let second = svc.flag(&user, FlagSeverity::Routine, "spam again").unwrap();
        let third = svc.flag(&user, FlagSeverity::Routine, "still spamming").unwrap();
        assert_eq!(first.kind, ModerationActionKind::Nudge);
        assert_eq!(second.kind, ModerationActionKind::Warning);
        assert_eq!(third.kind, ModerationActionKind::Suspension);
    }

    #[test]
    fn hate_or_harassment_bans_immediately() {
        let svc = service();
        let action = svc.flag(&Id::new("user", "u"), FlagSeverity::HateOrHarassment, "slur").unwrap();
        assert_eq!(action.kind, ModerationActionKind::Ban);
        assert!(action.expires_at.is_none());
    }

    #[test]
    fn blocking_is_detected_from_either_direction() {
        let svc = service();
        let a = Id::new("user", "a");
        let b = Id::new("user", "b");
        svc.block(&a, &b).unwrap();
        assert!(svc.is_blocked(&a, &b).unwrap());
        assert!(svc.is_blocked(&b, &a).unwrap());
    }

    #[test]
    fn moderation_expiry_deactivates_past_warnings() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let svc = TrustService::new(MemoryStore::new(), Arc::new(AlwaysAnchored), clock.clone());
        let user = Id::new("user", "u");
        svc.flag(&user, FlagSeverity::Routine, "a").unwrap();
        svc.flag(&user, FlagSeverity::Routine, "b").unwrap();
        clock.advance(chrono::Duration::days(8));
        let expired = svc.moderation_expiry().unwrap();
        assert_eq!(expired, 1);
    }
}
