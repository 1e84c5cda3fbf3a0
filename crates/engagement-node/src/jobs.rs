use crate::nexus_job;
use crate::services::Services;
use engagement_common::Id;
use engagement_compat::engine::TABLE_QUESTIONS;
use engagement_compat::Question;
use engagement_scheduler::JobSpec;
use engagement_store::RecordStore;
use std::time::Duration;
use tracing::warn;

/// Builds the nine background jobs from the already-wired services.
/// The scheduler itself stays ignorant of which service backs which job.
pub fn build(services: &Services, nexus_monthly_cadence_hours: u64) -> Vec<JobSpec> {
    let mut jobs = Vec::new();

    {
        let rsvp = services.rsvp.clone();
        jobs.push(JobSpec::new("VerificationSweep", Duration::from_secs(5 * 60), move || rsvp.verification_sweep()));
    }
    {
        let rsvp = services.rsvp.clone();
        jobs.push(JobSpec::new("WaitlistStale", Duration::from_secs(10 * 60), move || rsvp.waitlist_stale_sweep()));
    }
    {
        let compat = services.compat.clone();
        let store = services.store.clone();
        jobs.push(JobSpec::new("PoolRound", Duration::from_secs(60 * 60), move || {
            let questions: Vec<Id> = store.scan(TABLE_QUESTIONS, |_: &Question| true)?.into_iter().map(|q: Question| q.id).collect();
            let due = compat.pools_due_for_matching()?;
            let mut matched = 0u32;
            for pool in due {
                match compat.run_pool_match(&pool.id, &questions) {
                    Ok(results) => matched += results.len() as u32,
                    Err(e) => warn!(pool = %pool.id, error = %e, "pool match failed"),
                }
            }
            Ok(matched)
        }));
    }
    {
        let voting = services.voting.clone();
        jobs.push(JobSpec::new("VoteLifecycle", Duration::from_secs(60), move || voting.lifecycle_tick()));
    }
    {
        let trust = services.trust.clone();
        jobs.push(JobSpec::new("ModerationExpiry", Duration::from_secs(15 * 60), move || trust.moderation_expiry()));
    }
    {
        let rsvp = services.rsvp.clone();
        jobs.push(JobSpec::new("NudgeSweep", Duration::from_secs(30 * 60), move || rsvp.nudge_sweep()));
    }
    {
        let resonance = services.resonance.clone();
        jobs.push(JobSpec::new("PairCountReset", Duration::from_secs(24 * 60 * 60), move || {
            resonance.reset_expired_support_pair_counts()
        }));
    }
    {
        let store = services.store.clone();
        let resonance = services.resonance.clone();
        jobs.push(JobSpec::new(
            "NexusMonthly",
            Duration::from_secs(nexus_monthly_cadence_hours * 60 * 60),
            move || nexus_job::run(&store, &resonance),
        ));
    }
    {
        let compat = services.compat.clone();
        jobs.push(JobSpec::new("DiscoveryQuotaGC", Duration::from_secs(24 * 60 * 60), move || {
            compat.gc_discovery_counters()
        }));
    }

    jobs
}
