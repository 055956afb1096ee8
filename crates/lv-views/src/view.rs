//! Read-only view adapter surface

use serde::Serialize;

use lv_core::{Control, ControlPhase, FeedbackSnapshot, InteractionState};

use crate::DerivedModel;

/// Everything a view may read after a recompute
#[derive(Debug, Clone, Serialize)]
pub struct ViewFrame<'a> {
    pub state: &'a InteractionState,
    pub model: &'a DerivedModel,
    /// What-if output while a control option is hovered
    pub preview: Option<&'a DerivedModel>,
    pub feedback: FeedbackSnapshot,
    /// Controls that are not idle
    pub phases: Vec<(Control, ControlPhase)>,
}

/// A panel that renders coordinator output. Adapters never mutate the
/// coordinator; user input goes back through the coordinator operations.
pub trait ViewAdapter: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Called after every recompute
    fn render(&mut self, frame: &ViewFrame<'_>);
}
