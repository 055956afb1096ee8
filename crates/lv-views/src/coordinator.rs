//! Linked-view interaction coordinator
//!
//! Input flows `operation -> scheduler -> state -> derive -> feedback`.
//! Hover and drag input is coalesced per animation frame, drag feedback is
//! throttled, and every commit settles after its control has been quiet. All operations
//! take the host's clock reading; work that came due since the last call
//! is processed before the new input is applied.

use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use lv_core::scheduler::FrameChannel;
use lv_core::{
    Control, ControlPhase, ControlPhases, ControlValue, CoordinatorConfig, DetailLevel, EffectScheduler,
    FeedbackBus, FeedbackSnapshot, FilterSettings, Fired, FrameInput, InteractionState, Millis,
    Representation, SortMode, StateBounds, Task,
};
use lv_data::{DataIndex, FeedConfig, LoadError};

use crate::derived::{derive, DerivedModel, MetricsCache};
use crate::view::{ViewAdapter, ViewFrame};

/// Whether the dataset is available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Readiness {
    NotReady,
    Failed(String),
    Ready,
}

/// Counters for how much work input caused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    /// Accepted interaction state mutations
    pub state_updates: u64,
    /// Recomputes of the committed model
    pub recomputes: u64,
    /// Recomputes of the preview model
    pub preview_recomputes: u64,
    /// Animation frames that delivered pointer input
    pub frames: u64,
    /// Settle events processed
    pub settles: u64,
}

/// Owns the interaction state and keeps every view consistent with it
pub struct Coordinator {
    config: CoordinatorConfig,
    readiness: Readiness,
    index: Arc<DataIndex>,
    bounds: StateBounds,
    state: InteractionState,
    phases: ControlPhases,
    scheduler: EffectScheduler,
    bus: FeedbackBus,
    cache: MetricsCache,
    model: DerivedModel,
    preview: Option<DerivedModel>,
    derived_from: Option<InteractionState>,
    preview_from: Option<InteractionState>,
    gesture: Option<Control>,
    views: Vec<Box<dyn ViewAdapter>>,
    stats: CoordinatorStats,
}

impl Coordinator {
    /// A coordinator without data. Operations are ignored until a dataset
    /// is loaded or attached.
    pub fn new(config: CoordinatorConfig) -> Self {
        let index = Arc::new(DataIndex::default());
        let bounds = index.bounds(config.model.domain());
        let state = InteractionState::new(&bounds);
        let mut coordinator = Self {
            scheduler: EffectScheduler::new(config.scheduler.clone()),
            bus: FeedbackBus::new(config.feedback.clone()),
            config,
            readiness: Readiness::NotReady,
            index,
            bounds,
            state,
            phases: ControlPhases::new(),
            cache: MetricsCache::new(),
            model: DerivedModel::default(),
            preview: None,
            derived_from: None,
            preview_from: None,
            gesture: None,
            views: Vec::new(),
            stats: CoordinatorStats::default(),
        };
        coordinator.refresh();
        coordinator
    }

    /// Load both feeds and attach the result. A failure is kept as the
    /// readiness state and returned once; it is not retried.
    pub fn load<S: Read, R: Read>(&mut self, series: S, regions: R, feed: &FeedConfig) -> Result<(), LoadError> {
        match DataIndex::load(series, regions, feed) {
            Ok(index) => {
                self.attach(index);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load dataset: {}", e);
                self.readiness = Readiness::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Attach a loaded dataset and start over from default state
    pub fn attach(&mut self, index: DataIndex) {
        self.scheduler.cancel_all();
        self.bus.clear();
        self.phases.reset();
        self.gesture = None;
        self.cache.invalidate();
        self.derived_from = None;
        self.preview_from = None;

        self.bounds = index.bounds(self.config.model.domain());
        self.index = Arc::new(index);
        self.state = InteractionState::new(&self.bounds);
        self.readiness = Readiness::Ready;
        info!(
            "Dataset ready: {} countries, {} years, {} regions",
            self.index.len(),
            self.index.years().len(),
            self.bounds.regions.len()
        );
        self.refresh();
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn index(&self) -> &DataIndex {
        &self.index
    }

    pub fn bounds(&self) -> &StateBounds {
        &self.bounds
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn model(&self) -> &DerivedModel {
        &self.model
    }

    /// What-if output of the hovered control option, if any
    pub fn preview(&self) -> Option<&DerivedModel> {
        self.preview.as_ref()
    }

    pub fn feedback(&self) -> FeedbackSnapshot {
        self.bus.snapshot()
    }

    /// The bus, for subscribing to feedback phases
    pub fn bus(&self) -> &FeedbackBus {
        &self.bus
    }

    pub fn phase(&self, control: Control) -> ControlPhase {
        self.phases.get(control)
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            frames: self.scheduler.frames_fired(),
            ..self.stats
        }
    }

    /// Timers and frame requests that have not fired yet
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Control being dragged or scrubbed, if any
    pub fn active_gesture(&self) -> Option<Control> {
        self.gesture
    }

    pub fn frame(&self) -> ViewFrame<'_> {
        ViewFrame {
            state: &self.state,
            model: &self.model,
            preview: self.preview.as_ref(),
            feedback: self.bus.snapshot(),
            phases: self.phases.active(),
        }
    }

    pub fn register_view(&mut self, view: Box<dyn ViewAdapter>) {
        debug!("Registered view '{}'", view.name());
        self.views.push(view);
    }

    /// Process everything that came due up to `now`
    pub fn advance(&mut self, now: Millis) {
        self.drain(now);
    }

    // Selection

    /// Toggle the selection of `key` (a code or a country name). Clears the
    /// hover tooltip.
    pub fn select(&mut self, key: &str, now: Millis) {
        if !self.begin_operation("select", now) {
            return;
        }
        let Some(key) = self.index.resolve_key(key).map(str::to_string) else {
            warn!("Ignoring selection of unknown key '{}'", key);
            return;
        };
        self.scheduler.discard_input(FrameChannel::Datum);
        self.state.set_hovered(None);
        self.bus.preview_datum(None);
        self.state.toggle_selection(&key);
        self.stats.state_updates += 1;
        self.refresh();
        self.commit(Control::Selection, now);
        self.drain(now);
    }

    // Hover

    pub fn hover_enter(&mut self, key: &str, now: Millis) {
        if !self.begin_operation("hover", now) {
            return;
        }
        let Some(key) = self.index.resolve_key(key).map(str::to_string) else {
            return;
        };
        self.scheduler.request_frame(FrameInput::Hover(Some(key)), now);
    }

    /// Pointer left `key`. Ignored when the pointer has already moved on to
    /// another datum.
    pub fn hover_leave(&mut self, key: &str, now: Millis) {
        if !self.begin_operation("hover", now) {
            return;
        }
        let key = self.index.resolve_key(key).map(str::to_string);
        let target = match self.scheduler.pending_input(FrameChannel::Datum) {
            Some(FrameInput::Hover(pending)) => pending.clone(),
            _ => self.state.hovered_key().map(str::to_string),
        };
        if target.is_some() && target == key {
            self.scheduler.request_frame(FrameInput::Hover(None), now);
        }
    }

    // Gestures

    /// One step of a window brush. The last position of each frame reaches
    /// the window; the in-gesture feedback is throttled on top of that.
    pub fn drag_window(&mut self, start: i32, end: i32, now: Millis) {
        if !self.begin_operation("drag window", now) {
            return;
        }
        self.begin_gesture(Control::Window, now);
        self.scheduler.request_frame(FrameInput::Window(start, end), now);
    }

    /// One step of scrubbing the focus year
    pub fn scrub_focus(&mut self, year: i32, now: Millis) {
        if !self.begin_operation("scrub focus", now) {
            return;
        }
        self.begin_gesture(Control::FocusYear, now);
        self.scheduler.request_frame(FrameInput::FocusYear(year), now);
    }

    /// Release the active drag or scrub, committing its final value. A
    /// position still waiting for its frame is applied first.
    pub fn end_drag(&mut self, now: Millis) {
        self.drain(now);
        if let Some(control) = self.gesture.take() {
            self.finish_gesture(control, now);
        }
        self.drain(now);
    }

    // Committed controls

    pub fn set_focus_year(&mut self, year: i32, now: Millis) {
        if !self.begin_operation("set focus year", now) {
            return;
        }
        self.interrupt_gesture(now);
        if self.state.set_focus_year(year, &self.bounds) {
            self.stats.state_updates += 1;
            self.refresh();
            self.commit(Control::FocusYear, now);
        }
        self.drain(now);
    }

    /// Apply the filter panel. Each control that changed commits on its own,
    /// so text and slider input debounce while toggles settle at once.
    pub fn set_filter(&mut self, settings: FilterSettings, now: Millis) {
        if !self.begin_operation("set filter", now) {
            return;
        }
        let changed = self.state.set_filter(settings, &self.bounds);
        if changed.is_empty() {
            return;
        }
        self.stats.state_updates += 1;
        self.refresh();
        for control in changed {
            self.commit(control, now);
        }
        self.drain(now);
    }

    pub fn set_sort_mode(&mut self, mode: SortMode, now: Millis) {
        if !self.begin_operation("set sort mode", now) {
            return;
        }
        let had_preview = self.state.preview_sort_mode().is_some();
        let changed = self.state.set_sort_mode(mode);
        self.commit_choice(Control::SortMode, changed, had_preview, now);
    }

    pub fn set_representation(&mut self, representation: Representation, now: Millis) {
        if !self.begin_operation("set representation", now) {
            return;
        }
        let had_preview = self.state.preview_representation().is_some();
        let changed = self.state.set_representation(representation);
        self.commit_choice(Control::Representation, changed, had_preview, now);
    }

    pub fn set_detail_level(&mut self, level: DetailLevel, now: Millis) {
        if !self.begin_operation("set detail level", now) {
            return;
        }
        let had_preview = self.state.preview_detail_level().is_some();
        let changed = self.state.set_detail_level(level);
        self.commit_choice(Control::DetailLevel, changed, had_preview, now);
    }

    // Control previews

    /// Hover over a sort option (`Some`) or off the sort control (`None`)
    pub fn preview_sort_mode(&mut self, mode: Option<SortMode>, now: Millis) {
        if self.begin_operation("preview sort mode", now) {
            self.scheduler.request_frame(FrameInput::SortPreview(mode), now);
        }
    }

    pub fn preview_representation(&mut self, representation: Option<Representation>, now: Millis) {
        if self.begin_operation("preview representation", now) {
            self.scheduler
                .request_frame(FrameInput::RepresentationPreview(representation), now);
        }
    }

    pub fn preview_detail_level(&mut self, level: Option<DetailLevel>, now: Millis) {
        if self.begin_operation("preview detail level", now) {
            self.scheduler.request_frame(FrameInput::DetailPreview(level), now);
        }
    }

    // Lifecycle

    /// Restore every field to its default, cancel all pending timers and
    /// drop all feedback. Nothing scheduled before the reset fires after it.
    pub fn reset_all(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.bus.clear();
        self.phases.reset();
        self.gesture = None;
        self.state.reset(&self.bounds);
        self.stats.state_updates += 1;
        self.refresh();
        info!("Interaction state reset, {} pending timers cancelled", cancelled);
    }

    /// Cancel everything and detach the views. Safe to call more than once.
    pub fn teardown(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.bus.clear();
        self.gesture = None;
        self.views.clear();
        debug!("Coordinator torn down, {} pending timers cancelled", cancelled);
    }

    // Internals

    /// Catch up with the clock and report whether the operation may run
    fn begin_operation(&mut self, operation: &str, now: Millis) -> bool {
        self.drain(now);
        if !self.is_ready() {
            debug!("Ignoring {} before the dataset is ready", operation);
            return false;
        }
        true
    }

    fn drain(&mut self, now: Millis) {
        while let Some(fired) = self.scheduler.pop_due(now) {
            match fired {
                Fired::Frame(inputs) => self.apply_frame(inputs, now),
                Fired::Task(Task::Settle(control)) => self.settle(control, now),
                Fired::Task(Task::PhaseRelease(control)) => {
                    self.phases.release(control);
                    // Hovered while the commit was confirming
                    if self.state.has_preview_for(control) {
                        self.phases.begin_preview(control);
                    }
                }
                Fired::Task(task) => {
                    self.bus.on_task(&task, now, &mut self.scheduler);
                }
            }
        }
    }

    fn apply_frame(&mut self, inputs: Vec<FrameInput>, now: Millis) {
        let mut changed = false;
        let mut moved = Vec::new();
        for input in inputs {
            if let Some(control) = self.gesture_control(&input) {
                if self.apply_input(input) {
                    moved.push(control);
                    changed = true;
                }
            } else {
                changed |= self.apply_input(input);
            }
        }
        if changed {
            self.stats.state_updates += 1;
            self.refresh();
        }
        for control in moved {
            if self.scheduler.throttle(control, now) {
                let value = self.control_value(control);
                self.bus.gesture(control, value, now, &mut self.scheduler);
            }
        }
    }

    /// The gesture a drag input belongs to
    fn gesture_control(&self, input: &FrameInput) -> Option<Control> {
        match input {
            FrameInput::Window(..) => Some(Control::Window),
            FrameInput::FocusYear(_) => Some(Control::FocusYear),
            _ => None,
        }
    }

    /// Write one buffered input into the state. Returns whether it changed.
    fn apply_input(&mut self, input: FrameInput) -> bool {
        match input {
            FrameInput::Hover(key) => {
                let changed = self.state.set_hovered(key.clone());
                if changed {
                    self.bus.preview_datum(key);
                }
                changed
            }
            FrameInput::SortPreview(mode) => {
                let changed = self.state.set_preview_sort_mode(mode);
                if changed {
                    self.control_preview(Control::SortMode, mode.map(ControlValue::SortMode));
                }
                changed
            }
            FrameInput::RepresentationPreview(representation) => {
                let changed = self.state.set_preview_representation(representation);
                if changed {
                    self.control_preview(
                        Control::Representation,
                        representation.map(ControlValue::Representation),
                    );
                }
                changed
            }
            FrameInput::DetailPreview(level) => {
                let changed = self.state.set_preview_detail_level(level);
                if changed {
                    self.control_preview(Control::DetailLevel, level.map(ControlValue::DetailLevel));
                }
                changed
            }
            FrameInput::Window(start, end) => self.state.set_window(start, end, &self.bounds),
            FrameInput::FocusYear(year) => self.state.set_focus_year(year, &self.bounds),
        }
    }

    fn control_preview(&mut self, control: Control, value: Option<ControlValue>) {
        match value {
            Some(value) => {
                self.phases.begin_preview(control);
                self.bus.preview_control(control, value);
            }
            None => {
                self.phases.end_preview(control);
                self.bus.end_control_preview(control);
            }
        }
    }

    fn begin_gesture(&mut self, control: Control, now: Millis) {
        if self.gesture == Some(control) {
            return;
        }
        if let Some(previous) = self.gesture.take() {
            self.finish_gesture(previous, now);
        }
        // A new gesture supersedes whatever the control still had pending
        self.scheduler.cancel_control(control);
        self.phases.release(control);
        self.gesture = Some(control);
        debug!("Gesture started on {}", control.label());
    }

    fn finish_gesture(&mut self, control: Control, now: Millis) {
        let channel = FrameChannel::Control(control);
        if let Some(input) = self.scheduler.pending_input(channel).cloned() {
            self.scheduler.discard_input(channel);
            if self.apply_input(input) {
                self.stats.state_updates += 1;
                self.refresh();
            }
        }
        self.scheduler.end_gesture(control);
        debug!("Gesture ended on {}", control.label());
        self.commit(control, now);
    }

    /// A committed click on a gesture control ends any drag in progress
    fn interrupt_gesture(&mut self, now: Millis) {
        if let Some(control) = self.gesture.take() {
            self.finish_gesture(control, now);
        }
    }

    fn commit_choice(&mut self, control: Control, changed: bool, had_preview: bool, now: Millis) {
        self.scheduler.discard_input(FrameChannel::Control(control));
        if had_preview {
            self.phases.end_preview(control);
            self.bus.end_control_preview(control);
        }
        if changed || had_preview {
            self.stats.state_updates += 1;
            self.refresh();
        }
        if changed {
            self.commit(control, now);
        }
        self.drain(now);
    }

    fn commit(&mut self, control: Control, now: Millis) {
        self.phases.commit(control);
        let value = self.control_value(control);
        debug!("Committed {}: {:?}", control.label(), value);
        self.bus.commit(control, value);
        self.scheduler.schedule_settle(control, now);
    }

    fn settle(&mut self, control: Control, now: Millis) {
        if !self.phases.settle(control) {
            debug!("Skipping settle of {}, not committing", control.label());
            return;
        }
        self.stats.settles += 1;
        let value = self.control_value(control);
        let message = self.describe(control);
        info!("Settled {}: {}", control.label(), message);
        self.bus.settle(control, value, message, now, &mut self.scheduler);
        let confirmation_ms = self.bus.config().confirmation_ms;
        self.scheduler
            .schedule(Task::PhaseRelease(control), confirmation_ms, now);
    }

    fn control_value(&self, control: Control) -> ControlValue {
        match control {
            Control::Selection => ControlValue::Selection(self.state.selected_key().map(str::to_string)),
            Control::FocusYear => ControlValue::FocusYear(self.state.focus_year()),
            Control::Window => ControlValue::Window(self.state.window()),
            Control::ValueRange | Control::NamePrefix | Control::Regions | Control::Context => {
                ControlValue::Filter(self.state.filter())
            }
            Control::SortMode => ControlValue::SortMode(self.state.sort_mode()),
            Control::Representation => ControlValue::Representation(self.state.representation()),
            Control::DetailLevel => ControlValue::DetailLevel(self.state.detail_level()),
        }
    }

    /// Confirmation badge text
    fn describe(&self, control: Control) -> String {
        match control {
            Control::Selection => match self.state.selected_key() {
                Some(key) => {
                    let name = self.index.country_by_key(key).map(|c| c.entity.as_str()).unwrap_or(key);
                    format!("Selected {}", name)
                }
                None => "Selection cleared".to_string(),
            },
            Control::FocusYear => format!("Year {}", self.state.focus_year()),
            Control::Window => {
                let window = self.state.window();
                format!("Window {}-{}", window.start, window.end)
            }
            Control::ValueRange | Control::NamePrefix | Control::Regions | Control::Context => {
                match self.model.active.len() {
                    1 => "1 country matches".to_string(),
                    n => format!("{} countries match", n),
                }
            }
            Control::SortMode => format!("Sorted by {}", self.state.sort_mode().label()),
            Control::Representation => format!("Showing {}", self.state.representation().label()),
            Control::DetailLevel => format!("Detail level {}", self.state.detail_level().get()),
        }
    }

    /// Bring the derived output up to date and notify views if it moved
    fn refresh(&mut self) {
        let mut dirty = self.recompute();

        if let Some(selected) = self.state.selected_key() {
            if !self.model.is_active(selected) {
                info!("Clearing selection of '{}', it is no longer active", selected);
                self.state.clear_selection();
                self.stats.state_updates += 1;
                dirty |= self.recompute();
            }
        }

        dirty |= self.recompute_preview();
        if dirty {
            self.notify_views();
        }
    }

    fn recompute(&mut self) -> bool {
        let mut committed = self.state.clone();
        committed.clear_previews();
        if self.derived_from.as_ref() == Some(&committed) {
            return false;
        }
        self.model = derive(&self.index, &committed, &self.config.model, &mut self.cache);
        self.derived_from = Some(committed);
        self.stats.recomputes += 1;
        true
    }

    fn recompute_preview(&mut self) -> bool {
        if !self.state.has_preview() {
            self.preview_from = None;
            return self.preview.take().is_some();
        }
        let variant = self.state.preview_variant();
        if self.preview_from.as_ref() == Some(&variant) {
            return false;
        }
        self.preview = Some(derive(&self.index, &variant, &self.config.model, &mut self.cache));
        self.preview_from = Some(variant);
        self.stats.preview_recomputes += 1;
        true
    }

    fn notify_views(&mut self) {
        if self.views.is_empty() {
            return;
        }
        let frame = ViewFrame {
            state: &self.state,
            model: &self.model,
            preview: self.preview.as_ref(),
            feedback: self.bus.snapshot(),
            phases: self.phases.active(),
        };
        for view in self.views.iter_mut() {
            view.render(&frame);
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("readiness", &self.readiness)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("pending_timers", &self.scheduler.pending())
            .field("views", &self.views.len())
            .finish()
    }
}
