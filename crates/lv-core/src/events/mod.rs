//! Three-phase feedback bus
//!
//! Views and audio/toast collaborators subscribe to one phase each. The
//! bus keeps the currently visible feedback (preview target, pulse, badge)
//! and expires transient payloads through the effect scheduler.

mod feedback;

pub use feedback::{
    Confirmation, ControlValue, Expiry, FeedbackEvent, FeedbackPhase, FeedbackSnapshot,
    PreviewTarget, Pulse,
};

use std::collections::VecDeque;

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::FeedbackConfig;
use crate::scheduler::{EffectScheduler, Millis, Task};
use crate::state::Control;

/// Handler trait for feedback subscribers
pub trait FeedbackHandler: Send {
    fn handle(&mut self, event: &FeedbackEvent);
}

/// Helper struct for creating feedback handlers from closures
pub struct ClosureFeedbackHandler<F> {
    handler: F,
}

impl<F> FeedbackHandler for ClosureFeedbackHandler<F>
where
    F: FnMut(&FeedbackEvent) + Send,
{
    fn handle(&mut self, event: &FeedbackEvent) {
        (self.handler)(event);
    }
}

/// Create a feedback handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn FeedbackHandler>
where
    F: FnMut(&FeedbackEvent) + Send + 'static,
{
    Box::new(ClosureFeedbackHandler { handler: f })
}

/// Typed observer hub for the preview, in-gesture and post-commit phases
pub struct FeedbackBus {
    config: FeedbackConfig,
    handlers: Mutex<AHashMap<FeedbackPhase, Vec<Box<dyn FeedbackHandler>>>>,
    current: FeedbackSnapshot,
    queue: VecDeque<Confirmation>,
    release_open: bool,
    emitted: AHashMap<FeedbackPhase, u64>,
}

impl FeedbackBus {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            handlers: Mutex::new(AHashMap::new()),
            current: FeedbackSnapshot::default(),
            queue: VecDeque::new(),
            release_open: true,
            emitted: AHashMap::new(),
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    pub fn is_enabled(&self, phase: FeedbackPhase) -> bool {
        match phase {
            FeedbackPhase::Preview => self.config.preview_enabled,
            FeedbackPhase::InGesture => self.config.in_gesture_enabled,
            FeedbackPhase::PostCommit => self.config.post_commit_enabled,
        }
    }

    /// Subscribe to one phase
    pub fn subscribe(&self, phase: FeedbackPhase, handler: Box<dyn FeedbackHandler>) {
        self.handlers.lock().entry(phase).or_default().push(handler);
    }

    /// Subscribe a closure to one phase
    pub fn subscribe_fn<F>(&self, phase: FeedbackPhase, f: F)
    where
        F: FnMut(&FeedbackEvent) + Send + 'static,
    {
        self.subscribe(phase, handler_from_fn(f));
    }

    /// Current feedback to display
    pub fn snapshot(&self) -> FeedbackSnapshot {
        let mut snapshot = self.current.clone();
        snapshot.queued_confirmations = self.queue.len();
        snapshot
    }

    /// Number of events dispatched in a phase since creation
    pub fn emitted(&self, phase: FeedbackPhase) -> u64 {
        self.emitted.get(&phase).copied().unwrap_or(0)
    }

    fn emit(&mut self, event: FeedbackEvent) {
        let phase = event.phase();
        if !self.is_enabled(phase) {
            return;
        }
        trace!("Feedback {:?}", event);
        *self.emitted.entry(phase).or_insert(0) += 1;
        let mut handlers = self.handlers.lock();
        if let Some(phase_handlers) = handlers.get_mut(&phase) {
            for handler in phase_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }

    /// Hover entered or left a datum
    pub fn preview_datum(&mut self, key: Option<String>) {
        if self.current.datum_preview == key || !self.config.preview_enabled {
            return;
        }
        if let Some(previous) = self.current.datum_preview.take() {
            self.emit(FeedbackEvent::Preview {
                target: PreviewTarget::Datum(previous),
                active: false,
            });
        }
        if let Some(key) = key {
            self.current.datum_preview = Some(key.clone());
            self.emit(FeedbackEvent::Preview {
                target: PreviewTarget::Datum(key),
                active: true,
            });
        }
    }

    /// Hover entered a control option
    pub fn preview_control(&mut self, control: Control, value: ControlValue) {
        if !self.config.preview_enabled {
            return;
        }
        let target = PreviewTarget::Control { control, value };
        if self.current.control_preview.as_ref() == Some(&target) {
            return;
        }
        if let Some(previous) = self.current.control_preview.take() {
            self.emit(FeedbackEvent::Preview {
                target: previous,
                active: false,
            });
        }
        self.current.control_preview = Some(target.clone());
        self.emit(FeedbackEvent::Preview { target, active: true });
    }

    /// Hover left `control`. A preview of another control is left alone.
    pub fn end_control_preview(&mut self, control: Control) {
        let previewing = self.current.control_preview.as_ref().and_then(PreviewTarget::control);
        if previewing != Some(control) {
            return;
        }
        if let Some(target) = self.current.control_preview.take() {
            self.emit(FeedbackEvent::Preview { target, active: false });
        }
    }

    /// In-gesture update: raise a pulse that expires on its own
    pub fn gesture(&mut self, control: Control, value: ControlValue, now: Millis, scheduler: &mut EffectScheduler) {
        if !self.config.in_gesture_enabled {
            return;
        }
        let pulse = Pulse {
            control,
            value,
            expires_at: now + self.config.pulse_ms,
        };
        self.current.pulse = Some(pulse.clone());
        scheduler.schedule(Task::PulseExpire, self.config.pulse_ms, now);
        self.emit(FeedbackEvent::Gesture(pulse));
    }

    pub fn commit(&mut self, control: Control, value: ControlValue) {
        self.emit(FeedbackEvent::Commit { control, value });
    }

    /// A commit has settled: announce it and queue its confirmation badge
    pub fn settle(
        &mut self,
        control: Control,
        value: ControlValue,
        message: String,
        now: Millis,
        scheduler: &mut EffectScheduler,
    ) {
        if !self.config.post_commit_enabled {
            return;
        }
        self.emit(FeedbackEvent::Settle { control, value });

        // Latest confirmation per control wins
        self.queue.retain(|queued| queued.control != control);
        self.queue.push_back(Confirmation {
            control,
            message,
            expires_at: None,
        });
        while self.queue.len() > self.config.max_pending_confirmations {
            if let Some(dropped) = self.queue.pop_front() {
                debug!("Dropping queued confirmation for {}", dropped.control.label());
            }
        }
        if self.release_open {
            self.release_next(now, scheduler);
        }
    }

    fn release_next(&mut self, now: Millis, scheduler: &mut EffectScheduler) {
        let Some(mut confirmation) = self.queue.pop_front() else {
            self.release_open = true;
            return;
        };
        confirmation.expires_at = Some(now + self.config.confirmation_ms);
        self.current.confirmation = Some(confirmation.clone());
        self.release_open = false;
        scheduler.schedule(Task::ConfirmationExpire, self.config.confirmation_ms, now);
        scheduler.schedule(Task::ConfirmationRelease, self.config.confirmation_throttle_ms, now);
        self.emit(FeedbackEvent::Confirmation(confirmation));
    }

    /// Handle a scheduler task that belongs to the bus. Returns false for
    /// tasks owned by someone else.
    pub fn on_task(&mut self, task: &Task, now: Millis, scheduler: &mut EffectScheduler) -> bool {
        match task {
            Task::PulseExpire => {
                if self.current.pulse.take().is_some() {
                    self.emit(FeedbackEvent::Expired { what: Expiry::Pulse });
                }
                true
            }
            Task::ConfirmationExpire => {
                if self.current.confirmation.take().is_some() {
                    self.emit(FeedbackEvent::Expired {
                        what: Expiry::Confirmation,
                    });
                }
                true
            }
            Task::ConfirmationRelease => {
                self.release_next(now, scheduler);
                true
            }
            _ => false,
        }
    }

    /// Drop all visible and queued feedback without emitting anything.
    /// Subscribers stay registered.
    pub fn clear(&mut self) {
        self.current = FeedbackSnapshot::default();
        self.queue.clear();
        self.release_open = true;
    }
}

impl Default for FeedbackBus {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl std::fmt::Debug for FeedbackBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackBus")
            .field("config", &self.config)
            .field("current", &self.current)
            .field("queued", &self.queue.len())
            .finish()
    }
}
