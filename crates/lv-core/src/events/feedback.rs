//! Feedback event payloads

use serde::Serialize;

use crate::navigation::YearWindow;
use crate::scheduler::Millis;
use crate::state::{Control, DetailLevel, FilterSettings, Representation, SortMode};

/// The three independently switchable feedback phases. Each one has its own
/// subscriber list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPhase {
    /// Hover-driven, advisory and instantly reversible
    Preview,
    /// Repeated while a drag or scrub is active
    InGesture,
    /// Commit, settle and confirmation of a committed change
    PostCommit,
}

/// The value of a control as carried by feedback events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlValue {
    Selection(Option<String>),
    FocusYear(i32),
    Window(YearWindow),
    Filter(FilterSettings),
    SortMode(SortMode),
    Representation(Representation),
    DetailLevel(DetailLevel),
}

/// What a preview is about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewTarget {
    Datum(String),
    Control { control: Control, value: ControlValue },
}

impl PreviewTarget {
    pub fn control(&self) -> Option<Control> {
        match self {
            PreviewTarget::Datum(_) => None,
            PreviewTarget::Control { control, .. } => Some(*control),
        }
    }
}

/// Transient highlight raised by an in-gesture update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pulse {
    pub control: Control,
    pub value: ControlValue,
    pub expires_at: Millis,
}

/// Post-commit confirmation badge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub control: Control,
    pub message: String,
    /// Set when the badge is displayed
    pub expires_at: Option<Millis>,
}

/// Which transient payload ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    Pulse,
    Confirmation,
}

/// Everything the bus dispatches
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackEvent {
    Preview { target: PreviewTarget, active: bool },
    Gesture(Pulse),
    Commit { control: Control, value: ControlValue },
    Settle { control: Control, value: ControlValue },
    Confirmation(Confirmation),
    Expired { what: Expiry },
}

impl FeedbackEvent {
    pub fn phase(&self) -> FeedbackPhase {
        match self {
            FeedbackEvent::Preview { .. } => FeedbackPhase::Preview,
            FeedbackEvent::Gesture(_) => FeedbackPhase::InGesture,
            FeedbackEvent::Expired { what: Expiry::Pulse } => FeedbackPhase::InGesture,
            FeedbackEvent::Commit { .. }
            | FeedbackEvent::Settle { .. }
            | FeedbackEvent::Confirmation(_)
            | FeedbackEvent::Expired { what: Expiry::Confirmation } => FeedbackPhase::PostCommit,
        }
    }
}

/// What the views should currently show for feedback
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackSnapshot {
    pub datum_preview: Option<String>,
    pub control_preview: Option<PreviewTarget>,
    pub pulse: Option<Pulse>,
    pub confirmation: Option<Confirmation>,
    pub queued_confirmations: usize,
}
