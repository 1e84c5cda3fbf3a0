use crate::tally::tally;
use crate::types::{ResultsVisibility, TallyResult, Vote, VoteBallot, VoteStatus, VoteType};
use chrono::{DateTime, Utc};
use engagement_common::{Clock, EngagementError, EventSink, Id, Result};
use engagement_store::{AtomicBatch, RecordStore};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const TABLE_VOTES: &str = "votes";
pub const TABLE_BALLOTS: &str = "vote_ballots";

/// Owns the Vote/VoteOption/VoteBallot model: creation,
/// ballot casting, lifecycle transitions, and tallying.
pub struct VotingService<S: RecordStore> {
    store: S,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore> VotingService<S> {
    pub fn new(store: S, sink: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self { store, sink, clock }
    }

    pub fn create(&self, vote: Vote) -> Result<()> {
        if vote.options.is_empty() {
            return Err(EngagementError::Validation("a vote needs at least one option".into()));
        }
        if vote.closes_at <= vote.opens_at {
            return Err(EngagementError::Validation("closes_at must be after opens_at".into()));
        }
        self.store.insert_unique(TABLE_VOTES, vote.id.clone(), &vote)
    }

    pub fn get(&self, vote_id: &Id) -> Result<Vote> {
        self.store.get(TABLE_VOTES, vote_id)
    }

    /// Casts or replaces the caller's ballot. Rejects selections that
    /// aren't among the vote's own options, multi-selection on a `single`
    /// vote, and more than one rank entry per option on a `ranked` vote.
    pub fn cast_ballot(
        &self,
        vote_id: &Id,
        voter_id: &Id,
        voter_display_name: &str,
        selections: Vec<Id>,
    ) -> Result<VoteBallot> {
        let vote: Vote = self.store.get(TABLE_VOTES, vote_id)?;
        let now = self.clock.now();
        if !vote.is_open_at(now) {
            return Err(EngagementError::Validation(format!("vote {vote_id} is not open")));
        }
        if selections.is_empty() {
            return Err(EngagementError::Validation("a ballot needs at least one selection".into()));
        }
        let valid_options: std::collections::HashSet<&Id> = vote.options.iter().map(|o| &o.id).collect();
        for selection in &selections {
            if !valid_options.contains(selection) {
                return Err(EngagementError::Validation(format!(
                    "{selection} is not an option on vote {vote_id}"
                )));
            }
        }
        match vote.vote_type {
            VoteType::Single if selections.len() != 1 => {
                return Err(EngagementError::Validation("single votes accept exactly one selection".into()));
            }
            _ => {}
        }
        let unique: std::collections::HashSet<&Id> = selections.iter().collect();
        if unique.len() != selections.len() {
            return Err(EngagementError::Validation("a ballot cannot repeat an option".into()));
        }

        let ballot = VoteBallot {
            id: VoteBallot::key(vote_id, voter_id),
            vote_id: vote_id.clone(),
            voter_id: voter_id.clone(),
            voter_display_name: voter_display_name.to_string(),
            selections,
            cast_at: now,
        };
        self.store.put(TABLE_BALLOTS, ballot.id.clone(), &ballot)?;
        self.sink.publish(
            "vote.ballot_cast",
            Some(vote_id.clone()),
            json!({ "voter_id": voter_id.as_str() }),
        );
        Ok(ballot)
    }

    fn ballots_for(&self, vote_id: &Id) -> Result<Vec<VoteBallot>> {
        let target = vote_id.clone();
        self.store.scan(TABLE_BALLOTS, move |b: &VoteBallot| b.vote_id == target)
    }

    pub fn tally(&self, vote_id: &Id) -> Result<TallyResult> {
        let vote: Vote = self.store.get(TABLE_VOTES, vote_id)?;
        if vote.results_visibility == ResultsVisibility::OnClose && vote.status != VoteStatus::Closed {
            return Err(EngagementError::visibility_denied());
        }
        let ballots = self.ballots_for(vote_id)?;
        Ok(tally(&vote, &ballots))
    }

    fn transition(&self, vote: &mut Vote, status: VoteStatus) -> Result<()> {
        vote.status = status;
        let mut batch = AtomicBatch::new();
        batch.put(TABLE_VOTES, vote.id.clone(), vote)?;
        self.store.commit(batch)?;
        self.sink.publish(
            "vote.status_changed",
            Some(vote.id.clone()),
            json!({ "status": vote.status }),
        );
        Ok(())
    }

    /// `VoteLifecycle`: opens drafts whose `opens_at ≤ now`
    /// and closes open votes whose `closes_at ≤ now`. Returns the number
    /// of votes transitioned.
    pub fn lifecycle_tick(&self) -> Result<u32> {
        let now = self.clock.now();
        let mut transitioned = 0;

        let due_to_open: Vec<Vote> =
            self.store.scan(TABLE_VOTES, move |v: &Vote| v.status == VoteStatus::Draft && v.opens_at <= now)?;
        for mut vote in due_to_open {
            self.transition(&mut vote, VoteStatus::Open)?;
            transitioned += 1;
        }

        let due_to_close: Vec<Vote> =
            self.store.scan(TABLE_VOTES, move |v: &Vote| v.status == VoteStatus::Open && v.closes_at <= now)?;
        for mut vote in due_to_close {
            self.transition(&mut vote, VoteStatus::Closed)?;
            transitioned += 1;
        }

        if transitioned > 0 {
            info!(count = transitioned, "vote lifecycle tick transitioned votes");
        }
        Ok(transitioned)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VoteOption, VoteScope};
    use chrono::Duration;
    use engagement_common::{FixedClock, NoSink};
    use engagement_store::MemoryStore;

    fn service() -> (VotingService<MemoryStore>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        (VotingService::new(MemoryStore::new(), Arc::new(NoSink), clock.clone()), clock)
    }

    fn draft_vote(clock: &FixedClock) -> Vote {
        Vote {
            id: Id::new("vote", "v1"),
            scope: VoteScope::Adventure,
            scope_id: Id::new("adventure", "a1"),
            vote_type: VoteType::Single,
            prompt: "Where next?".into(),
            options: vec![
                VoteOption { id: Id::new("option", "beach"), label: "Beach".into() },
                VoteOption { id: Id::new("option", "mountains"), label: "Mountains".into() },
            ],
            opens_at: clock.now() - Duration::minutes(1),
            closes_at: clock.now() + Duration::hours(1),
            results_visibility: ResultsVisibility::Public,
            status: VoteStatus::Draft,
        }
    }

    #[test]
    fn lifecycle_tick_opens_and_then_closes() {
        let (svc, clock) = service();
        let vote = draft_vote(&clock);
        svc.create(vote.clone()).unwrap();

        assert_eq!(svc.lifecycle_tick().unwrap(), 1);
        assert_eq!(svc.get(&vote.id).unwrap().status, VoteStatus::Open);

        clock.advance(Duration::hours(2));
        assert_eq!(svc.lifecycle_tick().unwrap(), 1);
        assert_eq!(svc.get(&vote.id).unwrap().status, VoteStatus::Closed);
    }

    #[test]
    fn casting_rejects_unknown_option() {
        let (svc, clock) = service();
        let vote = draft_vote(&clock);
        svc.create(vote.clone()).unwrap();
        svc.lifecycle_tick().unwrap();
        let err = svc
            .cast_ballot(&vote.id, &Id::new("user", "u1"), "Alex", vec![Id::new("option", "desert")])
            .unwrap_err();
        assert!(matches!(err, EngagementError::Validation(_)));
    }

    #[test]
    fn single_vote_tally_after_close() {
        let (svc, clock) = service();
        let vote = draft_vote(&clock);
        svc.create(vote.clone()).unwrap();
        svc.lifecycle_tick().unwrap();
        svc.cast_ballot(&vote.id, &Id::new("user", "u1"), "Alex", vec![Id::new("option", "beach")]).unwrap();
        svc.cast_ballot(&vote.id, &Id::new("user", "u2"), "Sam", vec![Id::new("option", "beach")]).unwrap();
        svc.cast_ballot(&vote.id, &Id::new("user", "u3"), "Jo", vec![Id::new("option", "mountains")]).unwrap();
        let result = svc.tally(&vote.id).unwrap();
        assert_eq!(result.winner, Some(Id::new("option", "beach")));
        assert_eq!(result.total_ballots, 3);
    }
}
