//! Core functionality for the linked-view coordinator
//!
//! This crate owns everything that does not depend on the dataset itself:
//! the year axis, the interaction state and its per-control phases, the
//! effect scheduler that rate-limits pointer input, and the feedback bus
//! that views subscribe to.

pub mod config;
pub mod events;
pub mod navigation;
pub mod scheduler;
pub mod state;

// Re-export commonly used types
pub use config::{CoordinatorConfig, ConfigError, FeedbackConfig, LayoutConfig, ModelConfig, SchedulerConfig};
pub use events::{
    ControlValue, FeedbackBus, FeedbackEvent, FeedbackHandler, FeedbackPhase, FeedbackSnapshot,
    PreviewTarget, handler_from_fn,
};
pub use navigation::{YearAxis, YearWindow};
pub use scheduler::{EffectScheduler, Fired, FrameInput, Millis, Task};
pub use state::{
    Control, ControlPhase, ControlPhases, DetailLevel, FilterSettings, InteractionState,
    Representation, SortMode, StateBounds, ValueDomain,
};
