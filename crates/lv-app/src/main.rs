//! Command line driver for the linked-view coordinator
//!
//! Loads the two feeds, replays the requested interactions on a virtual
//! clock and prints the resulting frame.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lv_core::{CoordinatorConfig, Millis, SortMode};
use lv_data::FeedConfig;
use lv_views::{Coordinator, ViewAdapter, ViewFrame};

#[derive(Parser, Debug)]
#[command(name = "linked-views", about = "Linked-view interaction coordinator")]
struct Args {
    /// Per-country time series CSV (Entity, Code, Year, value)
    #[arg(long)]
    series: PathBuf,

    /// Country to region CSV
    #[arg(long)]
    regions: PathBuf,

    /// JSON file with coordinator tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the value column, when the series feed has several
    #[arg(long)]
    value_column: Option<String>,

    /// Country code or name to select
    #[arg(long)]
    select: Option<String>,

    /// Ranking order: value, growth or volatility
    #[arg(long)]
    sort: Option<SortMode>,

    /// Time window
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    window: Option<Vec<i32>>,

    /// Focus year inside the window
    #[arg(long)]
    year: Option<i32>,

    /// Only keep countries whose name starts with this
    #[arg(long)]
    prefix: Option<String>,

    /// Print the full frame as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(long)]
    verbose: bool,
}

/// Logs each recompute it is shown
struct LogView;

impl ViewAdapter for LogView {
    fn name(&self) -> &str {
        "log"
    }

    fn render(&mut self, frame: &ViewFrame<'_>) {
        debug!(
            "Frame: {} active, {} related, preview {}",
            frame.model.active.len(),
            frame.model.related.len(),
            frame.preview.is_some()
        );
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<CoordinatorConfig> {
    match path {
        Some(path) => CoordinatorConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(CoordinatorConfig::default()),
    }
}

/// Replay the requested interactions, one frame apart
fn run_session(coordinator: &mut Coordinator, args: &Args) -> Result<Millis> {
    let frame_ms = coordinator.config().scheduler.frame_interval_ms;
    let mut now: Millis = 0;

    if let Some(window) = &args.window {
        let [start, end] = window.as_slice() else {
            bail!("--window takes a start and an end year");
        };
        coordinator.drag_window(*start, *end, now);
        now += frame_ms;
        coordinator.end_drag(now);
        now += frame_ms;
    }
    if let Some(year) = args.year {
        coordinator.set_focus_year(year, now);
        now += frame_ms;
    }
    if let Some(prefix) = &args.prefix {
        let mut filter = coordinator.state().filter();
        filter.name_prefix = prefix.clone();
        coordinator.set_filter(filter, now);
        now += frame_ms;
    }
    if let Some(mode) = args.sort {
        coordinator.set_sort_mode(mode, now);
        now += frame_ms;
    }
    if let Some(key) = &args.select {
        if !coordinator.index().contains_key(key) {
            bail!("unknown country '{}'", key);
        }
        coordinator.select(key, now);
        now += frame_ms;
    }

    // Let every pending commit settle
    let scheduler = &coordinator.config().scheduler;
    now += scheduler.settle_quiet_ms.max(scheduler.selection_settle_ms);
    coordinator.advance(now);
    Ok(now)
}

fn print_summary(coordinator: &Coordinator) {
    let state = coordinator.state();
    let model = coordinator.model();
    let window = state.window();

    println!(
        "{} of {} countries active, year {} in {}-{}",
        model.active.len(),
        coordinator.index().len(),
        state.focus_year(),
        window.start,
        window.end
    );
    if let Some(selected) = state.selected_key() {
        println!("Selected {}, related: {}", selected, model.related.join(", "));
    }
    println!("Ranking by {}:", state.sort_mode().label());
    for row in model.rankings.iter().filter(|row| row.active).take(10) {
        let metric = row
            .metric
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>3}. {:<32} {:<16} {}", row.rank, row.entity, row.region, metric);
    }
    if let Some(confirmation) = coordinator.feedback().confirmation {
        println!("[{}]", confirmation.message);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_ref())?;
    let feed = FeedConfig {
        value_column: args.value_column.clone(),
        ..FeedConfig::default()
    };

    let mut coordinator = Coordinator::new(config);
    coordinator.register_view(Box::new(LogView));

    let series = File::open(&args.series)
        .with_context(|| format!("failed to open {}", args.series.display()))?;
    let regions = File::open(&args.regions)
        .with_context(|| format!("failed to open {}", args.regions.display()))?;
    coordinator
        .load(BufReader::new(series), BufReader::new(regions), &feed)
        .context("failed to load dataset")?;

    let now = run_session(&mut coordinator, &args)?;
    info!("Session finished at {}ms, {:?}", now, coordinator.stats());

    if args.json {
        let frame = coordinator.frame();
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        print_summary(&coordinator);
    }

    coordinator.teardown();
    Ok(())
}
