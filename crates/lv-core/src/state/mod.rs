//! Interaction state shared by every linked view
//!
//! `InteractionState` is the single source of truth for the adjustable
//! parameters. Fields are only changed through the methods below, and each
//! of them re-establishes the invariants before returning:
//!
//! - `window_start <= window_end`, both real years
//! - `focus_year` inside the window
//! - `value_min <= value_max`, both inside the value domain
//! - `detail_level` within `0..=2`

mod phase;

pub use phase::{ControlPhase, ControlPhases};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::navigation::{YearAxis, YearWindow};

/// Visual encoding used by the distribution panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    #[default]
    Distribution,
    Scatter,
}

impl Representation {
    pub fn label(&self) -> &'static str {
        match self {
            Representation::Distribution => "distribution",
            Representation::Scatter => "scatter",
        }
    }
}

/// Metric the ranking panel orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Value,
    Growth,
    Volatility,
}

impl SortMode {
    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Value => "value",
            SortMode::Growth => "growth",
            SortMode::Volatility => "volatility",
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" => Ok(SortMode::Value),
            "growth" => Ok(SortMode::Growth),
            "volatility" => Ok(SortMode::Volatility),
            other => Err(format!("Unknown sort mode '{}'", other)),
        }
    }
}

/// Level of detail, always within `0..=2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DetailLevel(u8);

impl DetailLevel {
    pub const MAX: u8 = 2;

    /// Clamp any requested level into range
    pub fn new(level: i64) -> Self {
        Self(level.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        Self(1)
    }
}

/// The controls a user can manipulate. Each one carries its own phase,
/// its own settle timer and its own drag throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Selection,
    FocusYear,
    Window,
    ValueRange,
    NamePrefix,
    Regions,
    Context,
    SortMode,
    Representation,
    DetailLevel,
}

impl Control {
    pub const ALL: [Control; 10] = [
        Control::Selection,
        Control::FocusYear,
        Control::Window,
        Control::ValueRange,
        Control::NamePrefix,
        Control::Regions,
        Control::Context,
        Control::SortMode,
        Control::Representation,
        Control::DetailLevel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Control::Selection => "selection",
            Control::FocusYear => "focus year",
            Control::Window => "time window",
            Control::ValueRange => "value range",
            Control::NamePrefix => "name filter",
            Control::Regions => "regions",
            Control::Context => "context",
            Control::SortMode => "sort mode",
            Control::Representation => "representation",
            Control::DetailLevel => "detail level",
        }
    }

    /// Checkbox and button style controls settle without a quiet period;
    /// sliders, text fields and drags wait for input to stop.
    pub fn settles_immediately(&self) -> bool {
        matches!(
            self,
            Control::Regions
                | Control::Context
                | Control::SortMode
                | Control::Representation
                | Control::DetailLevel
        )
    }
}

/// Closed interval of the value axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueDomain {
    pub min: f64,
    pub max: f64,
}

impl ValueDomain {
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Clamp into the domain; NaN falls back to `fallback`
    pub fn clamp_or(&self, value: f64, fallback: f64) -> f64 {
        if value.is_nan() {
            fallback
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for ValueDomain {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

/// Parameters set together by the filter panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub value_min: f64,
    pub value_max: f64,
    pub name_prefix: String,
    pub regions_enabled: BTreeSet<String>,
    pub show_context: bool,
}

/// What the state needs to know about the dataset to keep its invariants
#[derive(Debug, Clone, Default)]
pub struct StateBounds {
    pub axis: YearAxis,
    pub domain: ValueDomain,
    pub regions: BTreeSet<String>,
}

/// The single source of truth for every adjustable parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionState {
    focus_year: i32,
    window: YearWindow,
    representation: Representation,
    sort_mode: SortMode,
    detail_level: DetailLevel,
    value_min: f64,
    value_max: f64,
    name_prefix: String,
    regions_enabled: BTreeSet<String>,
    show_context: bool,
    selected_key: Option<String>,

    // Ephemeral
    hovered_key: Option<String>,
    preview_sort_mode: Option<SortMode>,
    preview_representation: Option<Representation>,
    preview_detail_level: Option<DetailLevel>,
}

impl InteractionState {
    /// Documented defaults: the full window, focus on the latest year, the
    /// whole value domain and every region enabled.
    pub fn new(bounds: &StateBounds) -> Self {
        let window = bounds.axis.full_window();
        Self {
            focus_year: window.end,
            window,
            representation: Representation::default(),
            sort_mode: SortMode::default(),
            detail_level: DetailLevel::default(),
            value_min: bounds.domain.min,
            value_max: bounds.domain.max,
            name_prefix: String::new(),
            regions_enabled: bounds.regions.clone(),
            show_context: true,
            selected_key: None,
            hovered_key: None,
            preview_sort_mode: None,
            preview_representation: None,
            preview_detail_level: None,
        }
    }

    pub fn reset(&mut self, bounds: &StateBounds) {
        *self = Self::new(bounds);
    }

    pub fn focus_year(&self) -> i32 {
        self.focus_year
    }

    pub fn window(&self) -> YearWindow {
        self.window
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn detail_level(&self) -> DetailLevel {
        self.detail_level
    }

    pub fn value_min(&self) -> f64 {
        self.value_min
    }

    pub fn value_max(&self) -> f64 {
        self.value_max
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn regions_enabled(&self) -> &BTreeSet<String> {
        &self.regions_enabled
    }

    pub fn show_context(&self) -> bool {
        self.show_context
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn hovered_key(&self) -> Option<&str> {
        self.hovered_key.as_deref()
    }

    pub fn preview_sort_mode(&self) -> Option<SortMode> {
        self.preview_sort_mode
    }

    pub fn preview_representation(&self) -> Option<Representation> {
        self.preview_representation
    }

    pub fn preview_detail_level(&self) -> Option<DetailLevel> {
        self.preview_detail_level
    }

    pub fn filter(&self) -> FilterSettings {
        FilterSettings {
            value_min: self.value_min,
            value_max: self.value_max,
            name_prefix: self.name_prefix.clone(),
            regions_enabled: self.regions_enabled.clone(),
            show_context: self.show_context,
        }
    }

    /// Toggle the selection: selecting the selected key clears it. Hover is
    /// cleared either way. Returns the new selection.
    pub fn toggle_selection(&mut self, key: &str) -> Option<&str> {
        self.hovered_key = None;
        if self.selected_key.as_deref() == Some(key) {
            self.selected_key = None;
        } else {
            self.selected_key = Some(key.to_string());
        }
        self.selected_key.as_deref()
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selected_key.take().is_some()
    }

    pub fn set_hovered(&mut self, key: Option<String>) -> bool {
        if self.hovered_key == key {
            return false;
        }
        self.hovered_key = key;
        true
    }

    /// Set the time window. Bounds are ordered and snapped to real years and
    /// the focus year is pulled inside the new window.
    pub fn set_window(&mut self, start: i32, end: i32, bounds: &StateBounds) -> bool {
        let window = bounds.axis.clamp_window(start, end);
        let focus_year = bounds.axis.clamp_into(self.focus_year, &window);
        let changed = window != self.window || focus_year != self.focus_year;
        self.window = window;
        self.focus_year = focus_year;
        changed
    }

    /// Set the point in time, snapped and clamped into the current window
    pub fn set_focus_year(&mut self, year: i32, bounds: &StateBounds) -> bool {
        let focus_year = bounds.axis.clamp_into(year, &self.window);
        let changed = focus_year != self.focus_year;
        self.focus_year = focus_year;
        changed
    }

    /// Apply the filter panel. Returns the controls whose value changed, in
    /// `Control` order.
    pub fn set_filter(&mut self, settings: FilterSettings, bounds: &StateBounds) -> Vec<Control> {
        let domain = bounds.domain;
        let a = domain.clamp_or(settings.value_min, domain.min);
        let b = domain.clamp_or(settings.value_max, domain.max);
        let (value_min, value_max) = if a <= b { (a, b) } else { (b, a) };
        // A trailing space is part of the prefix
        let name_prefix = settings.name_prefix.trim_start().to_string();

        let mut changed = Vec::new();
        if value_min != self.value_min || value_max != self.value_max {
            changed.push(Control::ValueRange);
        }
        if name_prefix != self.name_prefix {
            changed.push(Control::NamePrefix);
        }
        if settings.regions_enabled != self.regions_enabled {
            changed.push(Control::Regions);
        }
        if settings.show_context != self.show_context {
            changed.push(Control::Context);
        }

        self.value_min = value_min;
        self.value_max = value_max;
        self.name_prefix = name_prefix;
        self.regions_enabled = settings.regions_enabled;
        self.show_context = settings.show_context;
        changed
    }

    /// Commit a sort mode. A pending preview of the same control is done.
    pub fn set_sort_mode(&mut self, mode: SortMode) -> bool {
        self.preview_sort_mode = None;
        let changed = self.sort_mode != mode;
        self.sort_mode = mode;
        changed
    }

    pub fn set_representation(&mut self, representation: Representation) -> bool {
        self.preview_representation = None;
        let changed = self.representation != representation;
        self.representation = representation;
        changed
    }

    pub fn set_detail_level(&mut self, level: DetailLevel) -> bool {
        self.preview_detail_level = None;
        let changed = self.detail_level != level;
        self.detail_level = level;
        changed
    }

    pub fn set_preview_sort_mode(&mut self, mode: Option<SortMode>) -> bool {
        let changed = self.preview_sort_mode != mode;
        self.preview_sort_mode = mode;
        changed
    }

    pub fn set_preview_representation(&mut self, representation: Option<Representation>) -> bool {
        let changed = self.preview_representation != representation;
        self.preview_representation = representation;
        changed
    }

    pub fn set_preview_detail_level(&mut self, level: Option<DetailLevel>) -> bool {
        let changed = self.preview_detail_level != level;
        self.preview_detail_level = level;
        changed
    }

    /// Whether a preview of `control` is live
    pub fn has_preview_for(&self, control: Control) -> bool {
        match control {
            Control::SortMode => self.preview_sort_mode.is_some(),
            Control::Representation => self.preview_representation.is_some(),
            Control::DetailLevel => self.preview_detail_level.is_some(),
            _ => false,
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview_sort_mode.is_some()
            || self.preview_representation.is_some()
            || self.preview_detail_level.is_some()
    }

    pub fn clear_previews(&mut self) -> bool {
        let had = self.has_preview();
        self.preview_sort_mode = None;
        self.preview_representation = None;
        self.preview_detail_level = None;
        had
    }

    /// The hypothetical state the preview fields describe: committed fields
    /// overridden by the previews, with no preview fields left. `self` is
    /// not touched.
    pub fn preview_variant(&self) -> InteractionState {
        let mut variant = self.clone();
        if let Some(mode) = variant.preview_sort_mode.take() {
            variant.sort_mode = mode;
        }
        if let Some(representation) = variant.preview_representation.take() {
            variant.representation = representation;
        }
        if let Some(level) = variant.preview_detail_level.take() {
            variant.detail_level = level;
        }
        variant
    }

    /// Verify the structural invariants against `bounds`
    pub fn check_invariants(&self, bounds: &StateBounds) -> Result<(), String> {
        let axis = &bounds.axis;
        if self.window.start > self.window.end {
            return Err(format!("window {}..{} is reversed", self.window.start, self.window.end));
        }
        if !axis.is_empty() && !(axis.contains(self.window.start) && axis.contains(self.window.end)) {
            return Err(format!("window {}..{} is not on the year axis", self.window.start, self.window.end));
        }
        if !self.window.contains(self.focus_year) {
            return Err(format!("focus year {} is outside the window", self.focus_year));
        }
        if !axis.is_empty() && !axis.contains(self.focus_year) {
            return Err(format!("focus year {} is not on the year axis", self.focus_year));
        }
        if self.value_min > self.value_max {
            return Err(format!("value range {}..{} is reversed", self.value_min, self.value_max));
        }
        if !bounds.domain.contains(self.value_min) || !bounds.domain.contains(self.value_max) {
            return Err(format!("value range {}..{} leaves the domain", self.value_min, self.value_max));
        }
        if self.detail_level.get() > DetailLevel::MAX {
            return Err(format!("detail level {} out of range", self.detail_level.get()));
        }
        Ok(())
    }
}
