//! Extreme-GC window detection
//!
//! Slides a fixed window across the sequence and flags windows whose GC
//! fraction falls outside `[gc_min, gc_max]`. Flagged windows that overlap
//! or abut are merged into one feature.

use serde::{Deserialize, Serialize};

use crate::error::NegFeatError;
use crate::feature::{Feature, FeatureKind};

/// Source label for GC features
pub const GC_SOURCE: &str = "internal_gc";

/// Sliding-window GC settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcParams {
    /// Window length in bases
    pub window: usize,
    /// Distance between window starts
    pub step: usize,
    /// Lowest acceptable GC fraction
    pub gc_min: f64,
    /// Highest acceptable GC fraction
    pub gc_max: f64,
}

impl Default for GcParams {
    fn default() -> Self {
        Self {
            window: 50,
            step: 10,
            gc_min: 0.30,
            gc_max: 0.70,
        }
    }
}

impl GcParams {
    /// Check ranges before any scanning
    pub fn validate(&self) -> Result<(), NegFeatError> {
        if self.window == 0 {
            return Err(NegFeatError::invalid_parameter("gc_window", "must be >= 1"));
        }
        if self.step == 0 {
            return Err(NegFeatError::invalid_parameter("gc_step", "must be >= 1"));
        }
        for (name, value) in [("gc_min", self.gc_min), ("gc_max", self.gc_max)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NegFeatError::invalid_parameter(
                    name,
                    format!("{} is outside [0, 1]", value),
                ));
            }
        }
        if self.gc_min > self.gc_max {
            return Err(NegFeatError::invalid_parameter(
                "gc_min",
                format!("gc_min {} exceeds gc_max {}", self.gc_min, self.gc_max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct FlaggedWindow {
    start: usize,
    end: usize,
    gc: f64,
    low: bool,
}

/// Evaluate every window and keep the ones outside the GC bounds
///
/// Window starts are multiples of `step`; the window that first reaches the
/// end of the sequence is the last one, and if it is shorter than `window`
/// its GC fraction uses its real length.
fn flagged_windows(sequence: &[u8], params: &GcParams) -> Vec<FlaggedWindow> {
    let n = sequence.len();
    if n == 0 {
        return Vec::new();
    }
    let window = params.window.max(1);
    let step = params.step.max(1);

    // prefix[i] = number of G/C bases in sequence[..i]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0usize);
    for &b in sequence {
        let is_gc = matches!(b, b'G' | b'C' | b'g' | b'c');
        let last = prefix.last().copied().unwrap_or(0);
        prefix.push(last + usize::from(is_gc));
    }

    let mut flagged = Vec::new();
    let mut start = 0usize;
    while start < n {
        let end = (start + window).min(n);
        let gc = (prefix[end] - prefix[start]) as f64 / (end - start) as f64;
        if gc < params.gc_min || gc > params.gc_max {
            flagged.push(FlaggedWindow {
                start,
                end,
                gc,
                low: gc < params.gc_min,
            });
        }
        if end == n {
            break;
        }
        start += step;
    }
    flagged
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Detect extreme-GC features
///
/// `offset` is the absolute position of `sequence[0]`.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::scan::gc::{scan_extreme_gc, GcParams};
///
/// let seq = "A".repeat(150);
/// let params = GcParams { window: 100, step: 50, gc_min: 0.3, gc_max: 0.7 };
/// let features = scan_extreme_gc(&seq, 1000, &params);
/// assert_eq!(features.len(), 1);
/// assert_eq!((features[0].start, features[0].end), (1000, 1150));
/// ```
pub fn scan_extreme_gc(sequence: &str, offset: u64, params: &GcParams) -> Vec<Feature> {
    let windows = flagged_windows(sequence.as_bytes(), params);

    struct Run {
        start: usize,
        end: usize,
        min_gc: f64,
        max_gc: f64,
        any_low: bool,
        any_high: bool,
        windows: u64,
    }

    let mut runs: Vec<Run> = Vec::new();
    for w in windows {
        match runs.last_mut() {
            Some(run) if w.start <= run.end => {
                run.end = run.end.max(w.end);
                run.min_gc = run.min_gc.min(w.gc);
                run.max_gc = run.max_gc.max(w.gc);
                run.any_low |= w.low;
                run.any_high |= !w.low;
                run.windows += 1;
            }
            _ => runs.push(Run {
                start: w.start,
                end: w.end,
                min_gc: w.gc,
                max_gc: w.gc,
                any_low: w.low,
                any_high: !w.low,
                windows: 1,
            }),
        }
    }

    runs.into_iter()
        .map(|run| {
            let direction = match (run.any_low, run.any_high) {
                (true, false) => "low",
                (false, true) => "high",
                _ => "mixed",
            };
            Feature::new(
                FeatureKind::ExtremeGc,
                offset + run.start as u64,
                offset + run.end as u64,
                GC_SOURCE,
            )
            .with_attr("direction", direction)
            .with_attr("min_gc", round4(run.min_gc))
            .with_attr("max_gc", round4(run.max_gc))
            .with_attr("windows", run.windows)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::AttrValue;

    fn params(window: usize, step: usize) -> GcParams {
        GcParams {
            window,
            step,
            gc_min: 0.3,
            gc_max: 0.7,
        }
    }

    #[test]
    fn test_adjacent_low_windows_merge() {
        let seq = "AT".repeat(75);
        let features = scan_extreme_gc(&seq, 0, &params(100, 50));
        assert_eq!(features.len(), 1);
        assert_eq!((features[0].start, features[0].end), (0, 150));
        assert_eq!(features[0].attr("direction"), Some(&AttrValue::from("low")));
        assert_eq!(features[0].attr("windows"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn test_step_longer_than_window_stops_at_end() {
        let seq = "A".repeat(50);
        let features = scan_extreme_gc(&seq, 0, &params(10, 100));
        assert_eq!(features.len(), 1);
        assert_eq!((features[0].start, features[0].end), (0, 10));

        let features = scan_extreme_gc(&"A".repeat(120), 0, &params(10, 100));
        let spans: Vec<(u64, u64)> = features.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(spans, vec![(0, 10), (100, 110)]);
    }

    #[test]
    fn test_balanced_sequence_not_flagged() {
        let seq = "ACGT".repeat(100);
        assert!(scan_extreme_gc(&seq, 0, &GcParams::default()).is_empty());
    }

    #[test]
    fn test_separate_regions_stay_separate() {
        // low block, balanced block, high block
        let seq = format!("{}{}{}", "A".repeat(50), "ACGT".repeat(25), "G".repeat(50));
        let features = scan_extreme_gc(&seq, 100, &params(50, 50));
        assert_eq!(features.len(), 2);
        assert_eq!((features[0].start, features[0].end), (100, 150));
        assert_eq!((features[1].start, features[1].end), (250, 300));
        assert_eq!(features[1].attr("direction"), Some(&AttrValue::from("high")));
        assert_eq!(features[1].attr("max_gc"), Some(&AttrValue::Float(1.0)));
    }

    #[test]
    fn test_mixed_direction() {
        let seq = format!("{}{}", "A".repeat(50), "G".repeat(50));
        let features = scan_extreme_gc(&seq, 0, &params(50, 50));
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].attr("direction"), Some(&AttrValue::from("mixed")));
        assert_eq!(features[0].attr("min_gc"), Some(&AttrValue::Float(0.0)));
    }

    #[test]
    fn test_final_partial_window_uses_actual_length() {
        // 100 balanced bases then 10 G: the tail window [100, 110) is pure GC
        let seq = format!("{}{}", "ACGT".repeat(25), "G".repeat(10));
        let features = scan_extreme_gc(&seq, 0, &params(100, 100));
        assert_eq!(features.len(), 1);
        assert_eq!((features[0].start, features[0].end), (100, 110));
    }

    #[test]
    fn test_sequence_shorter_than_window() {
        let features = scan_extreme_gc("GGGG", 0, &params(50, 10));
        assert_eq!(features.len(), 1);
        assert_eq!((features[0].start, features[0].end), (0, 4));
    }

    #[test]
    fn test_lowercase_counts_as_gc() {
        let features = scan_extreme_gc("gcgcgcgcgc", 0, &params(10, 10));
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(scan_extreme_gc("", 0, &GcParams::default()).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(GcParams::default().validate().is_ok());
        assert!(params(0, 1).validate().is_err());
        assert!(params(1, 0).validate().is_err());
        let inverted = GcParams {
            gc_min: 0.8,
            gc_max: 0.2,
            ..GcParams::default()
        };
        assert!(inverted.validate().is_err());
        let out_of_range = GcParams {
            gc_max: 70.0,
            ..GcParams::default()
        };
        assert!(out_of_range.validate().is_err());
    }
}
