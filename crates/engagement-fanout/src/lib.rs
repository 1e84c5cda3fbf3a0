//! C7 — Event fan-out: a broadcast hub that delivers domain events to
//! filtered subscribers after their originating transaction commits.

pub mod hub;
pub mod types;

pub use hub::{Hub, Subscription, DEFAULT_MAILBOX_CAPACITY};
pub use types::{FanoutEvent, SubscriberFilter, SYNC_RESET_KIND};
