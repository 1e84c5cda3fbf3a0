//! C4 — Compatibility Engine: pairwise scoring, bias profiles, and
//! Donut-style pool matching.

pub mod engine;
pub mod types;

pub use engine::CompatEngine;
pub use types::*;
