//! Frequency scaling onto a bounded font-size range

use crate::input::FrequencyTable;
use log::debug;
use serde::Serialize;

/// Inclusive visual size range in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

/// A word with the font size it should be drawn at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledWord {
    pub text: String,
    pub size: f64,
}

/// Map every entry's weight to a font size.
///
/// With `normalize` the weight is log-interpolated between the smallest and
/// largest weight in the table. When all weights are equal every word gets
/// `range.max`. Zero weights have no logarithm and are skipped.
///
/// Without `normalize` the raw weight is used as the size unchanged.
pub fn scale(table: &FrequencyTable, normalize: bool, range: SizeRange) -> Vec<ScaledWord> {
    if !normalize {
        return table
            .entries()
            .iter()
            .map(|e| ScaledWord {
                text: e.text.clone(),
                size: e.weight,
            })
            .collect();
    }

    let positive = || table.entries().iter().filter(|e| e.weight > 0.0);

    let (min_freq, max_freq) = positive().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.weight), hi.max(e.weight))
    });
    if !min_freq.is_finite() {
        return Vec::new();
    }

    let (ln_min, ln_max) = (min_freq.ln(), max_freq.ln());
    let span = ln_max - ln_min;

    let skipped = table.len() - positive().count();
    if skipped > 0 {
        debug!("skipping {} zero-weight words during normalization", skipped);
    }

    positive()
        .map(|e| {
            let size = if span > 0.0 {
                range.min + (range.max - range.min) * (e.weight.ln() - ln_min) / span
            } else {
                range.max
            };
            ScaledWord {
                text: e.text.clone(),
                size,
            }
        })
        .collect()
}
