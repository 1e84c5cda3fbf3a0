//! C8 — Trust & Moderation: anchored trust ratings, endorsements, and
//! escalating moderation actions.

pub mod service;
pub mod types;

pub use service::TrustService;
pub use types::*;
