//! Assignment recommendation engine for tracked issues.
//!
//! The engine scores every assignable candidate against an issue's historical activity,
//! ranks them deterministically, and walks the ranking until the tracker accepts an
//! assignment. Declines are recorded per issue so later calls skip rejected candidates.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
