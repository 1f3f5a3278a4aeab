//! Homopolymer run detection

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, FeatureKind};

/// Source label for homopolymer features
pub const HOMOPOLYMER_SOURCE: &str = "internal_homopolymer";

/// Minimum run lengths per base class; 0 disables the class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomopolymerParams {
    pub at_threshold: usize,
    pub gc_threshold: usize,
}

impl Default for HomopolymerParams {
    fn default() -> Self {
        Self {
            at_threshold: 5,
            gc_threshold: 4,
        }
    }
}

impl HomopolymerParams {
    /// Threshold and class label for a base, `None` for non-ACGT bases
    fn threshold_for(&self, base: u8) -> Option<(usize, &'static str)> {
        match base {
            b'A' | b'T' => Some((self.at_threshold, "AT")),
            b'G' | b'C' => Some((self.gc_threshold, "GC")),
            _ => None,
        }
    }
}

/// Detect runs of one repeated base
///
/// Bases are compared case-insensitively. Each maximal run of a single base
/// is reported when it reaches its class threshold; ambiguous symbols end a
/// run and never form one.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::scan::homopolymer::{scan_homopolymers, HomopolymerParams};
///
/// let params = HomopolymerParams { at_threshold: 5, gc_threshold: 4 };
/// let features = scan_homopolymers("CAAAAACGGGGT", 100, &params);
/// assert_eq!(features.len(), 2);
/// assert_eq!((features[0].start, features[0].end), (101, 106));
/// assert_eq!((features[1].start, features[1].end), (107, 111));
/// ```
pub fn scan_homopolymers(sequence: &str, offset: u64, params: &HomopolymerParams) -> Vec<Feature> {
    let bytes = sequence.as_bytes();
    let mut features = Vec::new();
    let mut run_start = 0usize;

    for i in 1..=bytes.len() {
        let run_continues =
            i < bytes.len() && bytes[i].eq_ignore_ascii_case(&bytes[run_start]);
        if run_continues {
            continue;
        }
        let base = bytes[run_start].to_ascii_uppercase();
        let length = i - run_start;
        if let Some((threshold, class)) = params.threshold_for(base) {
            if threshold > 0 && length >= threshold {
                features.push(
                    Feature::new(
                        FeatureKind::Homopolymer,
                        offset + run_start as u64,
                        offset + i as u64,
                        HOMOPOLYMER_SOURCE,
                    )
                    .with_attr("base", (base as char).to_string())
                    .with_attr("base_class", class)
                    .with_attr("length", length as u64),
                );
            }
        }
        run_start = i;
    }
    features
}
