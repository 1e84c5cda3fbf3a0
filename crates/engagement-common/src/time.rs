use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Abstracts "the server clock is authoritative" so scheduler
/// cadence and ledger `created_on` stamping are deterministic in tests.
/// Generalizes the `TimeProvider` trait referenced across
/// `icn_governance`/`icn_economics`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock a test can advance explicitly instead of sleeping.
#[derive(Debug)]
pub struct FixedClock {
    micros_since_epoch: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            micros_since_epoch: AtomicI64::new(at.timestamp_micros()),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.micros_since_epoch
            .fetch_add(delta.num_microseconds().unwrap_or(0), Ordering::SeqCst);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.micros_since_epoch
            .store(at.timestamp_micros(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.micros_since_epoch.load(Ordering::SeqCst))
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_deterministically() {
        let clock = FixedClock::new(Utc::now());
        let start = clock.now();
        clock.advance(chrono::Duration::hours(1));
        let after = clock.now();
        assert_eq!((after - start).num_minutes(), 60);
    }
}
