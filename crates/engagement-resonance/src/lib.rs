//! C5 — Resonance Ledger: additive-only reputation with mutual-verification
//! gating, per-stat daily caps, and monthly Nexus recomputation.

pub mod ledger;
pub mod metrics;
pub mod nexus;
pub mod types;

pub use ledger::ResonanceLedger;
pub use nexus::{compute_nexus, GuildActivity};
pub use types::*;
