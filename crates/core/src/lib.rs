//! Crowd detection and analytics core.
//!
//! Periodically samples a live camera feed, detects faces with a local
//! cascade classifier or a remote vision service, reduces per-face
//! attributes to crowd-level statistics, and hands them to a telemetry
//! sink. The presentation layer consumes push events; it never polls.

pub mod analytics;
pub mod capture;
pub mod detection;
pub mod scheduler;
pub mod shared;
pub mod telemetry;
