use once_cell::sync::Lazy;
use prometheus_client::metrics::counter::Counter;

/// Counts successful `TryAward` calls that created a new ledger row.
pub static AWARDS_GRANTED: Lazy<Counter> = Lazy::new(Counter::default);

/// Counts `TryAward` calls short-circuited by the `(user, stat,
/// source_object_id)` uniqueness invariant (step 1).
pub static AWARDS_DUPLICATE: Lazy<Counter> = Lazy::new(Counter::default);

/// Counts awards trimmed to zero by a stat's daily cap before the ledger
/// write was even attempted (step 2).
pub static AWARDS_CAP_TRIMMED: Lazy<Counter> = Lazy::new(Counter::default);

/// Counts monthly Nexus recomputations performed by the `NexusMonthly` job.
pub static NEXUS_RECOMPUTED: Lazy<Counter> = Lazy::new(Counter::default);
