//! C2 — Engagement Graph: Guild/Adventure/Event/Rideshare/Forum entities
//! and cascading visibility.

pub mod graph;
pub mod types;

pub use graph::EngagementGraph;
pub use types::*;
