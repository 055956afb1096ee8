//! Effect scheduler
//!
//! Bounds how often pointer input reaches the interaction state:
//!
//! - hover and drag input is buffered and released once per animation
//!   frame (last value wins per channel)
//! - drag updates that reach the state pass a per-control throttle before
//!   they produce in-gesture feedback
//! - settle timers are debounced per control: a new commit reschedules the
//!   pending settle instead of adding a second one
//!
//! The scheduler never reads a wall clock. Every call takes `now` and the
//! owner drains due work with [`EffectScheduler::pop_due`], which keeps the
//! whole thing deterministic under test.

mod frame;
mod timers;

pub use frame::{FrameChannel, FrameInput};
pub use timers::TimerId;

use ahash::AHashMap;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::state::Control;
use frame::FrameBuffer;
use timers::TimerQueue;

/// Milliseconds on the host's clock
pub type Millis = u64;

/// Deferred work handed back to the owner when it comes due
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Task {
    /// Release the buffered pointer input
    Frame,
    /// A control has been quiet for its settle period
    Settle(Control),
    /// The in-gesture highlight pulse ran out
    PulseExpire,
    /// The displayed confirmation badge ran out
    ConfirmationExpire,
    /// The confirmation throttle window closed
    ConfirmationRelease,
    /// A settled control returns to idle
    PhaseRelease(Control),
}

/// Something the owner has to act on
#[derive(Debug, Clone, PartialEq)]
pub enum Fired {
    Frame(Vec<FrameInput>),
    Task(Task),
}

/// Rate limiter and timer wheel for the coordinator
#[derive(Debug)]
pub struct EffectScheduler {
    config: SchedulerConfig,
    timers: TimerQueue,
    frame: FrameBuffer,
    last_accepted: AHashMap<Control, Millis>,
    frames_fired: u64,
}

impl EffectScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            timers: TimerQueue::default(),
            frame: FrameBuffer::default(),
            last_accepted: AHashMap::new(),
            frames_fired: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Buffer pointer input for the next frame, requesting one if none is
    /// pending.
    pub fn request_frame(&mut self, input: FrameInput, now: Millis) {
        self.frame.push(input);
        if !self.timers.is_pending(&Task::Frame) {
            self.timers.schedule(Task::Frame, now + self.config.frame_interval_ms);
        }
    }

    /// The value a channel will have after the next frame, if any is buffered
    pub fn pending_input(&self, channel: FrameChannel) -> Option<&FrameInput> {
        self.frame.latest(channel)
    }

    /// Drop buffered input for one channel. The frame request is withdrawn
    /// when nothing is left to deliver.
    pub fn discard_input(&mut self, channel: FrameChannel) -> bool {
        let discarded = self.frame.discard(channel);
        if self.frame.is_empty() {
            self.timers.cancel(&Task::Frame);
        }
        discarded
    }

    /// Whether a drag update on `control` may emit in-gesture feedback now
    pub fn throttle(&mut self, control: Control, now: Millis) -> bool {
        let accepted = match self.last_accepted.get(&control) {
            Some(last) => now.saturating_sub(*last) >= self.config.drag_throttle_ms,
            None => true,
        };
        if accepted {
            self.last_accepted.insert(control, now);
        }
        accepted
    }

    /// Forget the throttle history of a finished gesture
    pub fn end_gesture(&mut self, control: Control) {
        self.last_accepted.remove(&control);
    }

    /// Settle delay for a control
    pub fn settle_delay(&self, control: Control) -> Millis {
        if control == Control::Selection {
            self.config.selection_settle_ms
        } else if control.settles_immediately() {
            0
        } else {
            self.config.settle_quiet_ms
        }
    }

    /// (Re)start the settle timer of `control`. At most one is ever pending
    /// per control.
    pub fn schedule_settle(&mut self, control: Control, now: Millis) -> TimerId {
        let delay = self.settle_delay(control);
        self.timers.cancel(&Task::PhaseRelease(control));
        self.timers.schedule(Task::Settle(control), now + delay)
    }

    pub fn schedule(&mut self, task: Task, delay: Millis, now: Millis) -> TimerId {
        self.timers.schedule(task, now + delay)
    }

    /// Cancel everything a new gesture on `control` invalidates
    pub fn cancel_control(&mut self, control: Control) {
        self.timers.cancel(&Task::Settle(control));
        self.timers.cancel(&Task::PhaseRelease(control));
        self.last_accepted.remove(&control);
    }

    pub fn is_pending(&self, task: &Task) -> bool {
        self.timers.is_pending(task)
    }

    /// Number of timers and frame requests that have not fired
    pub fn pending(&self) -> usize {
        self.timers.pending()
    }

    pub fn frames_fired(&self) -> u64 {
        self.frames_fired
    }

    /// Next piece of work due at or before `now`, earliest first
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired> {
        let task = self.timers.pop_due(now)?;
        match task {
            Task::Frame => {
                self.frames_fired += 1;
                Some(Fired::Frame(self.frame.take()))
            }
            task => Some(Fired::Task(task)),
        }
    }

    /// Cancel every timer and frame request and drop buffered input. Nothing
    /// scheduled before this call fires afterwards.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.timers.clear();
        self.frame.take();
        self.last_accepted.clear();
        if cancelled > 0 {
            debug!("Cancelled {} pending timers", cancelled);
        }
        cancelled
    }
}
