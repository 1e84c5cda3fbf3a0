//! C6 — Job Scheduler: a wall-clock-driven periodic dispatcher for the
//! nine maintenance jobs (verification sweeps, waitlist promotion
//! retries, pool rounds, vote lifecycle, moderation expiry, nudges, the
//! monthly Nexus pass, and the daily counter resets). The composition
//! root (`engagement-node`) builds each `JobSpec` from the service it
//! needs; this crate only knows how to tick them.

pub mod job;

pub use job::{JobScheduler, JobSpec};

#[cfg(test)]
mod tests {
    use super::*;
    use engagement_common::Result;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn job_ticks_on_its_cadence_and_skips_overlapping_runs() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks_for_job = ticks.clone();
        let job = JobSpec::new("counter", Duration::from_millis(10), move || -> Result<u32> {
            ticks_for_job.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        });

        let mut scheduler = JobScheduler::new();
        scheduler.start(vec![job]);

        tokio::time::advance(Duration::from_millis(35)).await;
        tokio::task::yield_now().await;

        assert!(ticks.load(Ordering::SeqCst) >= 3);
        scheduler.stop();
    }
}
