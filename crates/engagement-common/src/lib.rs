//! Shared building blocks used by every crate in the engagement coordination
//! engine: opaque record identifiers, the cross-component error taxonomy,
//! and a `Clock` abstraction so scheduler and ledger logic stay testable.

pub mod boundary;
pub mod error;
pub mod id;
pub mod retry;
pub mod time;

pub use boundary::{
    AlignmentResult, AlignmentScorer, AlwaysAligned, AlwaysAnchored, AnchorVerifier, BlockChecker,
    EventSink, NoAwards, NoBlocks, NoSink, ResonanceAwarder,
};
pub use error::EngagementError;
pub use id::Id;
pub use time::{Clock, FixedClock, SystemClock};

/// Crate-wide `Result` alias, wrapping every operation in `EngagementError`.
pub type Result<T> = std::result::Result<T, EngagementError>;

pub const ENGAGEMENT_CORE_VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_alias_compiles() {
        let ok: Result<u32> = Ok(1);
        assert_eq!(ok.unwrap(), 1);
    }
}
