//! End-to-end behaviour of the coordinator on a virtual clock

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use lv_core::{
    Control, ControlPhase, ControlValue, CoordinatorConfig, DetailLevel, FeedbackEvent, FeedbackPhase,
    InteractionState, Representation, SortMode,
};
use lv_data::{CountrySeries, DataIndex, FeedConfig, RegionMap};
use lv_views::{Coordinator, Readiness, ViewAdapter, ViewFrame};

const SERIES: &str = "\
Entity,Code,Year,Renewables share
Alpha,AAA,1990,4
Alpha,AAA,2000,10
Alpha,AAA,2010,16
Bravo,BBB,1990,12
Bravo,BBB,2000,12
Bravo,BBB,2010,13
Charlie,CCC,1990,20
Charlie,CCC,2000,50
Charlie,CCC,2010,62
Delta,DDD,1990,13
Delta,DDD,2000,11
Delta,DDD,2010,9
World,OWID_WRL,2000,18
";

const REGIONS: &str = "\
Entity,Code,Year,Continent
Alpha,AAA,2015,Europe
Bravo,BBB,2015,Europe
Charlie,CCC,2015,Asia
Delta,DDD,2015,Asia
";

fn coordinator() -> Coordinator {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default());
    coordinator
        .load(SERIES.as_bytes(), REGIONS.as_bytes(), &FeedConfig::default())
        .unwrap();
    coordinator
}

fn record(coordinator: &Coordinator, phase: FeedbackPhase) -> Arc<Mutex<Vec<FeedbackEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    coordinator
        .bus()
        .subscribe_fn(phase, move |event| sink.lock().push(event.clone()));
    events
}

#[test]
fn test_load_drops_aggregates_and_defaults_state() {
    let coordinator = coordinator();
    assert_eq!(coordinator.readiness(), &Readiness::Ready);
    assert_eq!(coordinator.index().len(), 4);
    assert!(coordinator.index().resolve_key("OWID_WRL").is_none());

    let state = coordinator.state();
    assert_eq!(state.window().start, 1990);
    assert_eq!(state.window().end, 2010);
    assert_eq!(state.focus_year(), 2010);
    assert_eq!(state.regions_enabled().len(), 2);
    assert_eq!(coordinator.model().active, vec!["AAA", "BBB", "CCC", "DDD"]);
}

#[test]
fn test_related_nearest_by_focus_value() {
    let mut coordinator = coordinator();
    coordinator.set_focus_year(2000, 0);
    coordinator.select("AAA", 1);

    let config = CoordinatorConfig {
        model: lv_core::ModelConfig {
            related_count: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut narrow = Coordinator::new(config);
    narrow
        .load(SERIES.as_bytes(), REGIONS.as_bytes(), &FeedConfig::default())
        .unwrap();
    narrow.set_focus_year(2000, 0);
    narrow.select("Alpha", 1);

    assert_eq!(coordinator.model().related, vec!["DDD", "BBB", "CCC"]);
    assert_eq!(narrow.model().related, vec!["DDD", "BBB"]);
}

#[test]
fn test_fifty_hovers_in_one_frame() {
    let mut coordinator = coordinator();
    let previews = record(&coordinator, FeedbackPhase::Preview);
    let before = coordinator.stats();

    let keys = ["AAA", "BBB", "CCC", "DDD"];
    for i in 0..50u64 {
        coordinator.hover_enter(keys[(i % 4) as usize], i * 15 / 50);
    }
    coordinator.advance(16);

    let after = coordinator.stats();
    assert_eq!(after.frames - before.frames, 1);
    assert_eq!(after.state_updates - before.state_updates, 1);
    assert_eq!(after.recomputes - before.recomputes, 1);
    // 49 % 4 == 1
    assert_eq!(coordinator.state().hovered_key(), Some("BBB"));
    assert_eq!(previews.lock().len(), 1);
}

#[test]
fn test_ten_slider_commits_settle_once() {
    let mut coordinator = coordinator();
    let events = record(&coordinator, FeedbackPhase::PostCommit);

    for i in 0..10u64 {
        let mut filter = coordinator.state().filter();
        filter.value_min = i as f64;
        coordinator.set_filter(filter, i * 100);
    }
    coordinator.advance(900 + 299);
    let settled = |events: &[FeedbackEvent]| {
        events
            .iter()
            .filter_map(|event| match event {
                FeedbackEvent::Settle {
                    control: Control::ValueRange,
                    value: ControlValue::Filter(filter),
                } => Some(filter.value_min),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert!(settled(&events.lock()).is_empty());

    coordinator.advance(900 + 300);
    assert_eq!(settled(&events.lock()), vec![9.0]);
    let commits = events
        .lock()
        .iter()
        .filter(|e| matches!(e, FeedbackEvent::Commit { .. }))
        .count();
    assert_eq!(commits, 9);
}

#[test]
fn test_preview_changes_nothing_committed() {
    let mut coordinator = coordinator();
    coordinator.select("CCC", 0);
    let committed = coordinator.model().clone();
    let state = coordinator.state().clone();

    coordinator.preview_sort_mode(Some(SortMode::Volatility), 10);
    coordinator.preview_representation(Some(Representation::Scatter), 11);
    coordinator.preview_detail_level(Some(DetailLevel::new(0)), 12);
    coordinator.advance(30);

    assert_eq!(coordinator.model(), &committed);
    assert_eq!(coordinator.state().selected_key(), state.selected_key());
    assert_eq!(coordinator.state().sort_mode(), state.sort_mode());
    let preview = coordinator.preview().unwrap();
    assert_eq!(preview.active, committed.active);
    assert_eq!(preview.related, committed.related);
    assert_ne!(preview.rankings, committed.rankings);

    coordinator.preview_sort_mode(None, 40);
    coordinator.preview_representation(None, 41);
    coordinator.preview_detail_level(None, 42);
    coordinator.advance(60);
    assert!(coordinator.preview().is_none());
    assert_eq!(coordinator.state(), &state);
}

#[test]
fn test_selection_cleared_by_region_filter() {
    let mut coordinator = coordinator();
    coordinator.select("CCC", 0);
    assert_eq!(coordinator.state().selected_key(), Some("CCC"));

    let mut filter = coordinator.state().filter();
    filter.regions_enabled.remove("Asia");
    coordinator.set_filter(filter, 10);

    assert!(coordinator.state().selected_key().is_none());
    assert!(coordinator.model().related.is_empty());
    assert_eq!(coordinator.model().active, vec!["AAA", "BBB"]);
    coordinator
        .state()
        .check_invariants(coordinator.bounds())
        .unwrap();
}

#[test]
fn test_context_toggle_controls_bin_members() {
    let mut coordinator = coordinator();
    let mut filter = coordinator.state().filter();
    filter.name_prefix = "a".to_string();
    filter.show_context = false;
    coordinator.set_filter(filter, 0);

    let members: usize = coordinator.model().bins.iter().map(|b| b.members.len()).sum();
    let total: usize = coordinator.model().bins.iter().map(|b| b.total_count).sum();
    assert_eq!(members, 1);
    assert_eq!(total, 4);
    assert_eq!(coordinator.model().layout.len(), 1);

    let mut filter = coordinator.state().filter();
    filter.show_context = true;
    coordinator.set_filter(filter, 10);
    let members: usize = coordinator.model().bins.iter().map(|b| b.members.len()).sum();
    assert_eq!(members, 4);
    assert_eq!(coordinator.model().layout.iter().filter(|p| p.active).count(), 1);
}

#[test]
fn test_reset_leaves_nothing_behind() {
    let mut coordinator = coordinator();
    let events = Arc::new(Mutex::new(0usize));
    for phase in [FeedbackPhase::Preview, FeedbackPhase::InGesture, FeedbackPhase::PostCommit] {
        let sink = events.clone();
        coordinator.bus().subscribe_fn(phase, move |_| *sink.lock() += 1);
    }

    coordinator.select("AAA", 0);
    coordinator.set_sort_mode(SortMode::Growth, 1);
    coordinator.drag_window(1990, 2000, 2);
    coordinator.drag_window(2000, 2010, 50);
    coordinator.hover_enter("DDD", 60);
    coordinator.preview_representation(Some(Representation::Scatter), 61);
    let mut filter = coordinator.state().filter();
    filter.name_prefix = "b".to_string();
    coordinator.set_filter(filter, 62);
    assert!(coordinator.pending_timers() > 0);

    coordinator.reset_all();
    let emitted = *events.lock();

    assert_eq!(coordinator.pending_timers(), 0);
    assert_eq!(coordinator.state(), &InteractionState::new(coordinator.bounds()));
    assert!(coordinator.preview().is_none());
    assert!(coordinator.feedback().confirmation.is_none());
    assert!(coordinator.feedback().pulse.is_none());
    for control in Control::ALL {
        assert_eq!(coordinator.phase(control), ControlPhase::Idle);
    }

    coordinator.advance(60_000);
    assert_eq!(*events.lock(), emitted);
    assert_eq!(coordinator.pending_timers(), 0);
}

#[test]
fn test_confirmations_are_throttled() {
    let mut coordinator = coordinator();
    let confirmations = record(&coordinator, FeedbackPhase::PostCommit);

    coordinator.set_sort_mode(SortMode::Growth, 0);
    coordinator.set_representation(Representation::Scatter, 1);
    coordinator.set_detail_level(DetailLevel::new(2), 2);

    let shown = |events: &[FeedbackEvent]| {
        events
            .iter()
            .filter_map(|e| match e {
                FeedbackEvent::Confirmation(c) => Some(c.message.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(shown(&confirmations.lock()), vec!["Sorted by growth"]);
    assert_eq!(coordinator.feedback().queued_confirmations, 2);

    coordinator.advance(400);
    coordinator.advance(800);
    assert_eq!(
        shown(&confirmations.lock()),
        vec!["Sorted by growth", "Showing scatter", "Detail level 2"]
    );
}

#[test]
fn test_disabled_phases_stay_silent() {
    let mut config = CoordinatorConfig::default();
    config.feedback.post_commit_enabled = false;
    config.feedback.in_gesture_enabled = false;
    let mut coordinator = Coordinator::new(config);
    coordinator
        .load(SERIES.as_bytes(), REGIONS.as_bytes(), &FeedConfig::default())
        .unwrap();
    let post = record(&coordinator, FeedbackPhase::PostCommit);
    let gesture = record(&coordinator, FeedbackPhase::InGesture);

    coordinator.select("AAA", 0);
    coordinator.drag_window(1990, 2000, 10);
    coordinator.end_drag(20);
    coordinator.advance(5_000);

    assert!(post.lock().is_empty());
    assert!(gesture.lock().is_empty());
    // State changes are not gated by feedback capabilities
    assert_eq!(coordinator.state().selected_key(), Some("AAA"));
    assert_eq!(coordinator.state().window().end, 2000);
}

#[test]
fn test_empty_dataset() {
    let mut coordinator = Coordinator::new(CoordinatorConfig::default());
    coordinator.attach(DataIndex::from_parts(Vec::<CountrySeries>::new(), &RegionMap::new()));
    assert!(coordinator.is_ready());

    coordinator.select("AAA", 0);
    coordinator.set_focus_year(2000, 1);
    coordinator.advance(1_000);

    let model = coordinator.model();
    assert!(model.active.is_empty());
    assert!(model.rankings.is_empty());
    assert!(model.layout.is_empty());
    assert!(model.bins.iter().all(|b| b.total_count == 0));
    assert_eq!(coordinator.state().focus_year(), 0);
}

struct CountingView {
    renders: Arc<Mutex<Vec<(usize, bool)>>>,
}

impl ViewAdapter for CountingView {
    fn name(&self) -> &str {
        "counting"
    }

    fn render(&mut self, frame: &ViewFrame<'_>) {
        self.renders
            .lock()
            .push((frame.model.rankings.len(), frame.preview.is_some()));
    }
}

#[test]
fn test_views_see_every_recompute() {
    let mut coordinator = coordinator();
    let renders = Arc::new(Mutex::new(Vec::new()));
    coordinator.register_view(Box::new(CountingView {
        renders: renders.clone(),
    }));

    coordinator.preview_sort_mode(Some(SortMode::Growth), 0);
    coordinator.advance(16);
    coordinator.set_sort_mode(SortMode::Growth, 20);

    assert_eq!(renders.lock().as_slice(), &[(4, true), (4, false)]);
    let frame = coordinator.frame();
    assert!(frame
        .phases
        .iter()
        .any(|&(control, phase)| control == Control::SortMode && phase == ControlPhase::Settled));
}

#[derive(Debug, Clone)]
enum Op {
    Select(usize),
    HoverEnter(usize),
    HoverLeave(usize),
    DragWindow(i32, i32),
    EndDrag,
    Scrub(i32),
    FocusYear(i32),
    Prefix(usize),
    ValueRange(f64, f64),
    ToggleRegion(bool),
    Sort(u8),
    PreviewSort(Option<u8>),
    Representation(bool),
    Detail(i64),
    Reset,
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..5).prop_map(Op::Select),
        (0usize..5).prop_map(Op::HoverEnter),
        (0usize..5).prop_map(Op::HoverLeave),
        (1980i32..2020, 1980i32..2020).prop_map(|(a, b)| Op::DragWindow(a, b)),
        Just(Op::EndDrag),
        (1980i32..2020).prop_map(Op::Scrub),
        (1980i32..2020).prop_map(Op::FocusYear),
        (0usize..4).prop_map(Op::Prefix),
        (-20.0f64..120.0, -20.0f64..120.0).prop_map(|(a, b)| Op::ValueRange(a, b)),
        any::<bool>().prop_map(Op::ToggleRegion),
        (0u8..3).prop_map(Op::Sort),
        proptest::option::of(0u8..3).prop_map(Op::PreviewSort),
        any::<bool>().prop_map(Op::Representation),
        (-1i64..4).prop_map(Op::Detail),
        Just(Op::Reset),
        (0u64..500).prop_map(Op::Wait),
    ]
}

fn sort(n: u8) -> SortMode {
    match n {
        0 => SortMode::Value,
        1 => SortMode::Growth,
        _ => SortMode::Volatility,
    }
}

proptest! {
    #[test]
    fn prop_state_invariants_hold(ops in proptest::collection::vec(op(), 1..60)) {
        let keys = ["AAA", "BBB", "CCC", "DDD", "ZZZ"];
        let prefixes = ["", "a", "b", "x"];
        let mut coordinator = coordinator();
        let mut now = 0u64;

        for op in ops {
            now += 7;
            match op {
                Op::Select(i) => coordinator.select(keys[i], now),
                Op::HoverEnter(i) => coordinator.hover_enter(keys[i], now),
                Op::HoverLeave(i) => coordinator.hover_leave(keys[i], now),
                Op::DragWindow(a, b) => coordinator.drag_window(a, b, now),
                Op::EndDrag => coordinator.end_drag(now),
                Op::Scrub(year) => coordinator.scrub_focus(year, now),
                Op::FocusYear(year) => coordinator.set_focus_year(year, now),
                Op::Prefix(i) => {
                    let mut filter = coordinator.state().filter();
                    filter.name_prefix = prefixes[i].to_string();
                    coordinator.set_filter(filter, now);
                }
                Op::ValueRange(a, b) => {
                    let mut filter = coordinator.state().filter();
                    filter.value_min = a;
                    filter.value_max = b;
                    coordinator.set_filter(filter, now);
                }
                Op::ToggleRegion(asia) => {
                    let region = if asia { "Asia" } else { "Europe" };
                    let mut filter = coordinator.state().filter();
                    if !filter.regions_enabled.remove(region) {
                        filter.regions_enabled.insert(region.to_string());
                    }
                    coordinator.set_filter(filter, now);
                }
                Op::Sort(n) => coordinator.set_sort_mode(sort(n), now),
                Op::PreviewSort(n) => coordinator.preview_sort_mode(n.map(sort), now),
                Op::Representation(scatter) => {
                    let representation = if scatter { Representation::Scatter } else { Representation::Distribution };
                    coordinator.set_representation(representation, now);
                }
                Op::Detail(level) => coordinator.set_detail_level(DetailLevel::new(level), now),
                Op::Reset => coordinator.reset_all(),
                Op::Wait(ms) => {
                    now += ms;
                    coordinator.advance(now);
                }
            }

            let state = coordinator.state();
            prop_assert!(state.check_invariants(coordinator.bounds()).is_ok());
            let model = coordinator.model();
            if let Some(selected) = state.selected_key() {
                prop_assert!(model.is_active(selected));
                prop_assert!(!model.related.iter().any(|k| k == selected));
            }
            for key in &model.related {
                prop_assert!(model.is_active(key));
            }
            for bin in &model.bins {
                prop_assert!(bin.active_count <= bin.total_count);
            }
            // Every country with a value at the focus year lands in exactly one bin
            let defined = coordinator
                .index()
                .countries()
                .filter(|c| c.value_at(state.focus_year()).is_some())
                .count();
            prop_assert_eq!(model.bins.iter().map(|b| b.total_count).sum::<usize>(), defined);
            prop_assert_eq!(model.bins.len(), coordinator.config().model.bin_count);
            prop_assert!(coordinator.feedback().queued_confirmations
                <= coordinator.config().feedback.max_pending_confirmations);
        }

        coordinator.end_drag(now);
        coordinator.reset_all();
        coordinator.advance(now + 60_000);
        prop_assert_eq!(coordinator.pending_timers(), 0);
    }
}
