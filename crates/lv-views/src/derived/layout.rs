//! Deterministic 2D layout of the distribution view
//!
//! The swarm layout is an iterative force relaxation: every point is pulled
//! toward its value-axis position, mildly pulled toward the cross-axis
//! center, and pushed out of any point it overlaps. Collision-only passes
//! follow, and a last placement pass moves whatever still overlaps to the
//! nearest free spot along the cross axis. Starting positions come from a
//! phyllotaxis spiral and all pass counts are bounded, so identical inputs
//! always produce identical positions.

use serde::Serialize;

use lv_core::{LayoutConfig, ValueDomain};

/// Position of one key in the distribution view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPoint {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub active: bool,
}

/// Parameters of one relaxation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxParams {
    pub center_y: f64,
    pub radius: f64,
    pub iterations: usize,
    pub value_strength: f64,
    pub center_strength: f64,
}

impl RelaxParams {
    pub fn from_config(config: &LayoutConfig, detail: usize) -> Self {
        Self {
            center_y: config.height / 2.0,
            radius: config.radii[detail.min(config.radii.len() - 1)],
            iterations: config.iterations,
            value_strength: config.value_strength,
            center_strength: config.center_strength,
        }
    }
}

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Upper bound on collision-only passes after the force iterations
const SEPARATION_PASSES: usize = 50;

/// Slack allowed when testing circles for overlap
const TOUCH_EPSILON: f64 = 1e-9;

/// Relax points toward their value-axis targets without overlapping: no two
/// centers end up closer than one diameter. Pure: the output depends on
/// nothing but the arguments.
pub fn relax(targets: &[f64], params: &RelaxParams) -> Vec<(f64, f64)> {
    let n = targets.len();
    let radius = params.radius.max(f64::EPSILON);
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for (i, &target) in targets.iter().enumerate() {
        let r = radius * (0.5 + i as f64).sqrt();
        let angle = i as f64 * GOLDEN_ANGLE;
        xs.push(target + r * angle.cos());
        ys.push(params.center_y + r * angle.sin());
    }

    let diameter = 2.0 * radius;
    let mut order: Vec<usize> = (0..n).collect();
    for _ in 0..params.iterations {
        for i in 0..n {
            xs[i] += (targets[i] - xs[i]) * params.value_strength;
            ys[i] += (params.center_y - ys[i]) * params.center_strength;
        }
        separate(&mut xs, &mut ys, &mut order, diameter);
    }

    // The pulls above undo part of every push; resolve collisions alone
    for _ in 0..SEPARATION_PASSES {
        if !separate(&mut xs, &mut ys, &mut order, diameter) {
            break;
        }
    }
    place_free(&xs, &mut ys, &mut order, diameter);

    xs.into_iter().zip(ys).collect()
}

/// Push apart every overlapping pair once. Returns whether any pair overlapped.
fn separate(xs: &mut [f64], ys: &mut [f64], order: &mut [usize], diameter: f64) -> bool {
    // Sweep along x so only neighbours within one diameter are compared
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]).then(a.cmp(&b)));
    let mut overlapped = false;
    for (pos, &a) in order.iter().enumerate() {
        for &b in &order[pos + 1..] {
            let dx = xs[b] - xs[a];
            if dx > diameter {
                break;
            }
            let dy = ys[b] - ys[a];
            let distance = (dx * dx + dy * dy).sqrt();
            if distance >= diameter - TOUCH_EPSILON {
                continue;
            }
            overlapped = true;
            let (ux, uy) = if distance > 1e-9 {
                (dx / distance, dy / distance)
            } else if a < b {
                (0.0, 1.0)
            } else {
                (0.0, -1.0)
            };
            let push = (diameter - distance) / 2.0;
            xs[a] -= ux * push;
            ys[a] -= uy * push;
            xs[b] += ux * push;
            ys[b] += uy * push;
        }
    }
    overlapped
}

/// Place points left to right with x fixed. Each one keeps its y when that
/// is clear of the points already placed, otherwise it moves to the closest
/// y that is.
fn place_free(xs: &[f64], ys: &mut [f64], order: &mut [usize], diameter: f64) {
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]).then(a.cmp(&b)));
    for pos in 0..order.len() {
        let a = order[pos];
        // Half-height of the band each placed neighbour blocks around its y
        let blocked: Vec<(f64, f64)> = order[..pos]
            .iter()
            .rev()
            .take_while(|&&b| xs[a] - xs[b] < diameter)
            .map(|&b| {
                let dx = xs[a] - xs[b];
                (ys[b], (diameter * diameter - dx * dx).max(0.0).sqrt())
            })
            .collect();
        let is_free = |y: f64| blocked.iter().all(|&(yb, h)| (y - yb).abs() >= h - TOUCH_EPSILON);
        if is_free(ys[a]) {
            continue;
        }

        let current = ys[a];
        let mut candidates: Vec<f64> = blocked.iter().flat_map(|&(yb, h)| [yb - h, yb + h]).collect();
        candidates.sort_by(|p, q| (p - current).abs().total_cmp(&(q - current).abs()).then(p.total_cmp(q)));
        // The highest band edge is always clear, so a candidate is found
        if let Some(y) = candidates.into_iter().find(|&y| is_free(y)) {
            ys[a] = y;
        }
    }
}

/// Horizontal position of a value on a view `width` pixels wide
pub fn value_to_x(value: f64, domain: &ValueDomain, width: f64) -> f64 {
    if domain.width() <= 0.0 {
        return width / 2.0;
    }
    (domain.clamp_or(value, domain.min) - domain.min) / domain.width() * width
}

/// One point to place
#[derive(Debug, Clone)]
pub struct LayoutItem<'a> {
    pub key: &'a str,
    pub value: f64,
    pub growth: Option<f64>,
    pub active: bool,
}

/// Force-relaxed swarm for the distribution representation
pub fn swarm_layout(items: &[LayoutItem<'_>], domain: &ValueDomain, config: &LayoutConfig, detail: usize) -> Vec<LayoutPoint> {
    let params = RelaxParams::from_config(config, detail);
    let targets: Vec<f64> = items.iter().map(|item| value_to_x(item.value, domain, config.width)).collect();
    relax(&targets, &params)
        .into_iter()
        .zip(items)
        .map(|((x, y), item)| LayoutPoint {
            key: item.key.to_string(),
            x,
            y,
            radius: params.radius,
            active: item.active,
        })
        .collect()
}

/// Direct placement for the scatter representation: x from the focus value,
/// y from growth normalized over the items (higher growth is higher up).
pub fn scatter_layout(items: &[LayoutItem<'_>], domain: &ValueDomain, config: &LayoutConfig, detail: usize) -> Vec<LayoutPoint> {
    let radius = RelaxParams::from_config(config, detail).radius;
    let growths = items.iter().filter_map(|item| item.growth);
    let (low, high) = growths.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| (lo.min(g), hi.max(g)));
    let center = config.height / 2.0;

    items
        .iter()
        .map(|item| {
            let y = match item.growth {
                Some(g) if high > low => config.height - (g - low) / (high - low) * config.height,
                _ => center,
            };
            LayoutPoint {
                key: item.key.to_string(),
                x: value_to_x(item.value, domain, config.width),
                y,
                radius,
                active: item.active,
            }
        })
        .collect()
}
