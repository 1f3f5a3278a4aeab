//! Ambiguous base detection

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::collections::BTreeSet;

use crate::feature::{Feature, FeatureKind};

/// Source label for ambiguous-base features
pub const AMBIGUOUS_SOURCE: &str = "internal_ambiguous";

/// Maximal runs of anything other than A, C, G or T
static AMBIGUOUS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^ACGTacgt]+").unwrap());

/// Report every run of non-ACGT symbols
///
/// ```
/// use ferro_negfeat::scan::ambiguous::scan_ambiguous;
///
/// let features = scan_ambiguous("ACNNGTRA", 0);
/// assert_eq!(features.len(), 2);
/// assert_eq!((features[0].start, features[0].end), (2, 4));
/// assert_eq!((features[1].start, features[1].end), (6, 7));
/// ```
pub fn scan_ambiguous(sequence: &str, offset: u64) -> Vec<Feature> {
    AMBIGUOUS_RUN
        .find_iter(sequence.as_bytes())
        .map(|m| {
            let symbols: BTreeSet<char> = m
                .as_bytes()
                .iter()
                .map(|b| b.to_ascii_uppercase() as char)
                .collect();
            Feature::new(
                FeatureKind::Ambiguous,
                offset + m.start() as u64,
                offset + m.end() as u64,
                AMBIGUOUS_SOURCE,
            )
            .with_attr("length", (m.end() - m.start()) as u64)
            .with_attr("symbols", symbols.into_iter().collect::<String>())
        })
        .collect()
}
