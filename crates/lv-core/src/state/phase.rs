//! Per-control interaction phases
//!
//! Every control moves independently through
//! `Idle -> Previewing -> Committing -> Settled -> Idle`. Previewing is only
//! entered from Idle and only ever returns to Idle.

use ahash::AHashMap;
use serde::Serialize;

use super::Control;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPhase {
    #[default]
    Idle,
    Previewing,
    Committing,
    Settled,
}

/// Phase of every control; controls not present are idle
#[derive(Debug, Clone, Default)]
pub struct ControlPhases {
    phases: AHashMap<Control, ControlPhase>,
}

impl ControlPhases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, control: Control) -> ControlPhase {
        self.phases.get(&control).copied().unwrap_or_default()
    }

    fn set(&mut self, control: Control, phase: ControlPhase) {
        if phase == ControlPhase::Idle {
            self.phases.remove(&control);
        } else {
            self.phases.insert(control, phase);
        }
    }

    /// Idle -> Previewing
    pub fn begin_preview(&mut self, control: Control) -> bool {
        if self.get(control) == ControlPhase::Idle {
            self.set(control, ControlPhase::Previewing);
            true
        } else {
            false
        }
    }

    /// Previewing -> Idle
    pub fn end_preview(&mut self, control: Control) -> bool {
        if self.get(control) == ControlPhase::Previewing {
            self.set(control, ControlPhase::Idle);
            true
        } else {
            false
        }
    }

    /// Any phase -> Committing
    pub fn commit(&mut self, control: Control) {
        self.set(control, ControlPhase::Committing);
    }

    /// Committing -> Settled
    pub fn settle(&mut self, control: Control) -> bool {
        if self.get(control) == ControlPhase::Committing {
            self.set(control, ControlPhase::Settled);
            true
        } else {
            false
        }
    }

    /// Settled -> Idle
    pub fn release(&mut self, control: Control) -> bool {
        if self.get(control) == ControlPhase::Settled {
            self.set(control, ControlPhase::Idle);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.phases.clear();
    }

    /// Controls that are not idle, in `Control` order
    pub fn active(&self) -> Vec<(Control, ControlPhase)> {
        let mut active: Vec<_> = self.phases.iter().map(|(c, p)| (*c, *p)).collect();
        active.sort_by_key(|(control, _)| *control);
        active
    }
}
