//! Simulation results.
//!
//! `Statistics` is what the engine hands back for one simulated day and what
//! the chain carries over into the next day.

mod customer;
mod statistics;

pub use customer::CustomerStats;
pub use statistics::Statistics;
