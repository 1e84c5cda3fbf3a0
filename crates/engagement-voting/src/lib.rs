//! Vote/VoteOption/VoteBallot model: scoped votes with
//! timed open/close windows and single/multi/ranked/approval tallying.

pub mod service;
pub mod tally;
pub mod types;

pub use service::VotingService;
pub use tally::tally as tally_ballots;
pub use types::*;
