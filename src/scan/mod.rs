//! Sequence-intrinsic feature detectors
//!
//! Three independent scanners work directly on the window sequence:
//!
//! - [`gc`]: sliding-window extreme GC content
//! - [`homopolymer`]: runs of one repeated base
//! - [`ambiguous`]: runs of non-ACGT symbols
//!
//! Every scanner reports absolute coordinates given the window offset.

pub mod ambiguous;
pub mod gc;
pub mod homopolymer;

use serde::{Deserialize, Serialize};

use crate::error::NegFeatError;
use crate::feature::{Feature, FeatureKind, FeatureSelection};
use crate::flank::FlankedRegion;

pub use ambiguous::scan_ambiguous;
pub use gc::{scan_extreme_gc, GcParams};
pub use homopolymer::{scan_homopolymers, HomopolymerParams};

/// Settings for all sequence scanners
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub gc: GcParams,
    pub homopolymer: HomopolymerParams,
}

impl ScanParams {
    pub fn validate(&self) -> Result<(), NegFeatError> {
        self.gc.validate()
    }
}

/// Run the scanners enabled in `selection` over a region
pub fn scan_region(
    region: &FlankedRegion,
    selection: &FeatureSelection,
    params: &ScanParams,
) -> Vec<Feature> {
    let mut features = Vec::new();
    let offset = region.ext_start;

    if selection.contains(FeatureKind::ExtremeGc) {
        let found = scan_extreme_gc(&region.sequence, offset, &params.gc);
        log::debug!("extreme_gc: {} features", found.len());
        features.extend(found);
    }
    if selection.contains(FeatureKind::Homopolymer) {
        let found = scan_homopolymers(&region.sequence, offset, &params.homopolymer);
        log::debug!("homopolymer: {} features", found.len());
        features.extend(found);
    }
    if selection.contains(FeatureKind::Ambiguous) {
        let found = scan_ambiguous(&region.sequence, offset);
        log::debug!("ambiguous: {} features", found.len());
        features.extend(found);
    }
    features
}
