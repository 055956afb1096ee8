//! Fixed partition of the value domain

use ahash::AHashSet;
use serde::Serialize;

use lv_core::ValueDomain;

use super::Entry;

/// One equal-width slice of the value domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    /// Every entry with a defined focus value that falls here
    pub total_count: usize,
    /// The active ones among them
    pub active_count: usize,
    /// Active keys, plus the inactive ones when context is shown
    pub members: Vec<String>,
}

/// Bin index of a value. Values outside the domain land in the edge bins
/// and the upper bound belongs to the last bin.
pub fn bin_index(value: f64, domain: &ValueDomain, count: usize) -> usize {
    if count == 0 || domain.width() <= 0.0 {
        return 0;
    }
    let clamped = domain.clamp_or(value, domain.min);
    let position = ((clamped - domain.min) / domain.width() * count as f64).floor();
    (position as usize).min(count - 1)
}

/// Partition the domain into `count` bins. The total counts always add up
/// to the number of entries with a defined focus value.
pub fn bins(
    entries: &[Entry<'_>],
    active: &AHashSet<&str>,
    show_context: bool,
    domain: &ValueDomain,
    count: usize,
) -> Vec<Bin> {
    let width = if count == 0 { 0.0 } else { domain.width() / count as f64 };
    let mut bins: Vec<Bin> = (0..count)
        .map(|index| Bin {
            index,
            start: domain.min + width * index as f64,
            end: if index + 1 == count {
                domain.max
            } else {
                domain.min + width * (index + 1) as f64
            },
            total_count: 0,
            active_count: 0,
            members: Vec::new(),
        })
        .collect();
    if bins.is_empty() {
        return bins;
    }

    for entry in entries {
        let Some(value) = entry.metrics.focus_value else {
            continue;
        };
        let bin = &mut bins[bin_index(value, domain, count)];
        bin.total_count += 1;
        let is_active = active.contains(entry.key);
        if is_active {
            bin.active_count += 1;
        }
        if is_active || show_context {
            bin.members.push(entry.key.to_string());
        }
    }
    bins
}
