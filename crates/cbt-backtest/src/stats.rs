//! Per-window reduction of event samples.
//!
//! [`WindowStats::from_samples`] is the only reducer. The aggregator calls it
//! and so can anyone holding a [`crate::BacktestResult`], which is what makes
//! the published statistics re-derivable from `samples`.
//!
//! Rules:
//! - only defined returns count, for numerator and denominator alike
//! - a win is a return strictly above zero; zero is not a win
//! - positive / negative means are over `> 0` / `< 0` subsets

use std::collections::BTreeMap;

use crate::types::{EventSample, WindowStats};

impl WindowStats {
    /// Reduce `samples` for one window length.
    pub fn from_samples(window: u32, samples: &[EventSample]) -> Self {
        let values: Vec<f64> = samples.iter().filter_map(|s| s.return_for(window)).collect();

        let positives: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
        let negatives: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();

        let win_rate_percent = if values.is_empty() {
            None
        } else {
            Some(100.0 * positives.len() as f64 / values.len() as f64)
        };

        Self {
            window,
            sample_count: values.len(),
            mean_percent: mean(&values),
            median_percent: median(&values),
            win_rate_percent,
            mean_positive_percent: mean(&positives),
            mean_negative_percent: mean(&negatives),
        }
    }
}

/// Stats for every window in `windows`, keyed by window length.
pub fn compute_window_stats(windows: &[u32], samples: &[EventSample]) -> BTreeMap<u32, WindowStats> {
    windows
        .iter()
        .map(|w| (*w, WindowStats::from_samples(*w, samples)))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
