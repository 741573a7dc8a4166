//! TrialGuard admission engine.
//!
//! Turns a stream of trial-tier usage events into per-user behavioral
//! fingerprints, abuse and ROI scores, and one of four admission decisions.
//! All state is in memory and owned by [`engine::AdmissionEngine`].

pub mod clock;
pub mod decision;
pub mod engine;
pub mod error;
pub mod events;
pub mod policy;
pub mod pricing;
pub mod profile;
pub mod resources;
pub mod scoring;
pub mod stats;
