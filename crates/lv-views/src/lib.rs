//! Linked views: derived view data and the interaction coordinator
//!
//! The [`Coordinator`] owns the interaction state, rate-limits input through
//! the effect scheduler, recomputes the [`DerivedModel`] when something
//! relevant changed, and drives the feedback bus. View adapters only read
//! what it produces.

mod coordinator;
pub mod derived;
mod view;

pub use coordinator::{Coordinator, CoordinatorStats, Readiness};
pub use derived::{derive, Bin, DerivedModel, HoverDetail, LayoutPoint, Metrics, MetricsCache, RankingRow};
pub use view::{ViewAdapter, ViewFrame};
