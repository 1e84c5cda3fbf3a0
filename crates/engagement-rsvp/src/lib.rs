//! C3 — RSVP, Admission & Role Assignment State Machine.

pub mod admission;
pub mod service;
pub mod state_machine;
pub mod types;

pub use admission::AdmissionService;
pub use service::RsvpService;
pub use types::*;
