//! Chained multi-day simulation.
//!
//! A chain is an ordered list of days. Each day simulates a model whose
//! input is enriched with what the previous day left behind: customers
//! still queued at cutoff, customers planning to call again, and the
//! statistically expected retries of those who abandoned.

mod builder;
mod carryover;
mod document;
mod error;
mod orchestrator;
mod runner;
mod spec;

pub use builder::{BuildError, CallerOverrides, RunModel, build_run_model};
pub use carryover::{PhysicalCarryover, apply_extra_arrivals, physical_carryover, statistical_add};
pub use document::{
    CarryoverRecord, CarryoverTable, ChainDocument, DayRecord, ExtraArrivalRecord,
    TypeChangeRecord,
};
pub use error::ChainError;
pub use orchestrator::{CancelToken, ChainOptions, ChainOrchestrator};
pub use runner::{ChainState, DayPlan, DayRunner, DayState, DayStep};
pub use spec::{CarryoverRule, CarryoverShape, ChainSpec, DaySpec, ExtraArrival, ModelRef};
