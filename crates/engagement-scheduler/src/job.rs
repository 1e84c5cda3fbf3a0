use engagement_common::{EngagementError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// One periodic job. The scheduler holds no domain state of its own
/// ("holds no state itself; each job reads/writes via C1") —
/// `run` is a closure the composition root builds from whichever service
/// the job needs, so this crate never depends on C2–C5/C8 directly.
pub struct JobSpec {
    pub name: &'static str,
    pub cadence: Duration,
    pub run: Arc<dyn Fn() -> Result<u32> + Send + Sync>,
}

impl JobSpec {
    pub fn new(
        name: &'static str,
        cadence: Duration,
        run: impl Fn() -> Result<u32> + Send + Sync + 'static,
    ) -> Self {
        Self { name, cadence, run: Arc::new(run) }
    }
}

/// C6 — a single-process periodic dispatcher: one `tokio::spawn` +
/// `interval.tick()` loop per job, `JoinHandle`s collected for `stop()`'s
/// `abort()` sweep.
#[derive(Default)]
pub struct JobScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self { handles: Vec::new() }
    }

    /// Spawns one loop per job. At most one concurrent run per job: a tick
    /// that lands while the previous run is still in flight is skipped
    /// rather than queued ("on overrun, skip the tick").
    /// `cadence/4` is logged as a soft per-invocation budget; actual
    /// cancellation mid-run isn't possible since job bodies are synchronous
    /// store calls, but every job body commits through an `AtomicBatch` so
    /// there's nothing to half-apply even when a run overruns its budget
    /// (see DESIGN.md).
    pub fn start(&mut self, jobs: Vec<JobSpec>) {
        for job in jobs {
            let running = Arc::new(AtomicBool::new(false));
            let JobSpec { name, cadence, run } = job;
            let budget = cadence / 4;

            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(cadence);
                loop {
                    interval.tick().await;
                    if running.swap(true, Ordering::SeqCst) {
                        warn!(job = name, "previous run still in flight, skipping tick");
                        continue;
                    }
                    let started = Instant::now();
                    match run() {
                        Ok(count) => {
                            let elapsed = started.elapsed();
                            if elapsed > budget {
                                warn!(job = name, ?elapsed, ?budget, "job exceeded its per-invocation budget");
                            }
                            tracing::debug!(job = name, affected = count, ?elapsed, "job tick complete");
                        }
                        Err(err) => log_job_error(name, &err),
                    }
                    running.store(false, Ordering::SeqCst);
                }
            });
            self.handles.push(handle);
        }
    }

    pub fn stop(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn log_job_error(name: &str, err: &EngagementError) {
    error!(job = name, error = %err, "job tick failed");
}
