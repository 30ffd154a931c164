//! Reactive derived-state engine.
//!
//! Joins the transaction and category snapshots published by storage, applies
//! the user's [`FilterState`], aggregates the result and publishes one
//! consistent [`DerivedView`] per recompute.

use chrono::Weekday;

pub mod aggregate;
pub mod filter;
pub mod graph;
pub mod handler;
pub mod period;
pub mod source;
pub mod view;

pub use aggregate::{aggregate, BalancePoint, CategoryTotal, Summary};
pub use filter::{apply, DateFilter, FilterState, SortOrder, TransactionType};
pub use graph::{DerivedStateGraph, EngineHandle, EngineState, EngineStatus, Subscription};
pub use period::{resolve, Clock, DateRange, FixedClock, LocalClock, Period};
pub use source::{MemorySource, SnapshotSource};
pub use view::{join, DerivedView, TransactionView, YearMonth};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Computation failed: {0}")]
    Computation(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Engine has stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// First day of the week used by [`Period::ThisWeek`].
    pub week_start: Weekday,
    /// Snapshots larger than this are filtered and aggregated on the blocking pool.
    pub offload_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
            offload_threshold: 5_000,
        }
    }
}
