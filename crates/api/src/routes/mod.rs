//! HTTP handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod params;
pub mod stats;
