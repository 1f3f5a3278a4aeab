//! Provider record normalization
//!
//! Converts an [`AnnotationBatch`] into engine features over the window:
//! re-bases coordinates, clips to the window, applies the repeat mask mode
//! and the minor-allele-frequency filter to variant records.

use serde::{Deserialize, Serialize};

use crate::annotation::{AnnotationBatch, MaskMode, RawFeature, DEFAULT_MAF_THRESHOLD};
use crate::coords::GenomicInterval;
use crate::error::NegFeatError;
use crate::feature::{AttrValue, Feature, FeatureKind};

/// Attribute keys that describe placement rather than the feature itself
const PLACEMENT_KEYS: &[&str] = &[
    "start",
    "end",
    "seq_region_start",
    "seq_region_end",
    "seq_region_name",
    "assembly_name",
    "feature_type",
    "strand",
];

/// Keys providers use for minor-allele frequency, in lookup order
const MAF_KEYS: &[&str] = &["minor_allele_frequency", "MAF", "maf"];

/// Filters applied while normalizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeParams {
    pub mask: MaskMode,
    pub maf_threshold: f64,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            mask: MaskMode::default(),
            maf_threshold: DEFAULT_MAF_THRESHOLD,
        }
    }
}

impl NormalizeParams {
    pub fn validate(&self) -> Result<(), NegFeatError> {
        if !(0.0..=1.0).contains(&self.maf_threshold) {
            return Err(NegFeatError::invalid_parameter(
                "maf_threshold",
                format!("{} is outside [0, 1]", self.maf_threshold),
            ));
        }
        Ok(())
    }
}

/// Minor-allele frequency of a record, if it carries a usable one
pub fn record_maf(record: &RawFeature) -> Option<f64> {
    MAF_KEYS
        .iter()
        .filter_map(|key| record.attributes.get(*key))
        .filter_map(AttrValue::from_json)
        .find_map(|value| value.as_f64())
}

/// Resolve the kind of one record
///
/// A record without its own label takes the batch kind. A labelled record
/// whose label is unknown yields `None`.
fn record_kind(batch_kind: FeatureKind, record: &RawFeature) -> Option<FeatureKind> {
    match &record.kind {
        None => Some(batch_kind),
        Some(label) => FeatureKind::from_provider_label(label),
    }
}

/// Normalize one batch against the window
///
/// # Examples
///
/// ```
/// use ferro_negfeat::annotation::{normalize_batch, AnnotationBatch, MaskMode, NormalizeParams, RawFeature};
/// use ferro_negfeat::coords::{CoordinateBasis, GenomicInterval};
/// use ferro_negfeat::feature::FeatureKind;
///
/// let batch = AnnotationBatch::new(
///     "fixture",
///     FeatureKind::Repeat,
///     CoordinateBasis::OneBasedClosed,
///     vec![RawFeature::new(991, 1010)],
/// );
/// let window = GenomicInterval::new(1000, 2000).unwrap();
/// let params = NormalizeParams { mask: MaskMode::Soft, maf_threshold: 0.01 };
/// let features = normalize_batch(&batch, window, &params);
/// assert_eq!((features[0].start, features[0].end), (1000, 1010));
/// ```
pub fn normalize_batch(
    batch: &AnnotationBatch,
    window: GenomicInterval,
    params: &NormalizeParams,
) -> Vec<Feature> {
    let mut features = Vec::with_capacity(batch.records.len());
    let mut dropped_outside = 0usize;
    let mut dropped_maf = 0usize;

    for record in &batch.records {
        let Some(kind) = record_kind(batch.kind, record) else {
            log::debug!(
                "{}: ignoring record with unsupported kind {:?}",
                batch.provider(),
                record.kind
            );
            continue;
        };

        if kind == FeatureKind::Repeat && params.mask == MaskMode::None {
            continue;
        }

        let Some(interval) = batch.basis.to_interval(record.start, record.end) else {
            log::debug!(
                "{}: ignoring record with invalid span {}..{}",
                batch.provider(),
                record.start,
                record.end
            );
            continue;
        };
        let Some(clipped) = interval.intersect(&window) else {
            dropped_outside += 1;
            continue;
        };

        // Simple variants need a frequency; structural variants only when they carry one
        let maf = record_maf(record);
        let passes_maf = match (kind, maf) {
            (FeatureKind::SimpleVariant | FeatureKind::StructuralVariant, Some(value)) => {
                value >= params.maf_threshold
            }
            (FeatureKind::SimpleVariant, None) => false,
            _ => true,
        };
        if !passes_maf {
            dropped_maf += 1;
            continue;
        }

        let mut feature = Feature::new(kind, clipped.start(), clipped.end(), batch.provider());
        for (key, value) in &record.attributes {
            if PLACEMENT_KEYS.contains(&key.as_str()) || MAF_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(attr) = AttrValue::from_json(value) {
                feature.attributes.insert(key.clone(), attr);
            }
        }
        if let Some(value) = maf {
            feature.attributes.insert("maf".to_string(), AttrValue::Float(value));
        }
        if clipped != interval {
            feature.attributes.insert("clipped".to_string(), AttrValue::Bool(true));
        }
        if kind == FeatureKind::Repeat && params.mask == MaskMode::Hard {
            feature.attributes.insert("exclude".to_string(), AttrValue::Bool(true));
        }
        features.push(feature);
    }

    log::debug!(
        "{} {}: kept {} of {} records ({} outside window, {} below MAF {})",
        batch.provider(),
        batch.kind,
        features.len(),
        batch.records.len(),
        dropped_outside,
        dropped_maf,
        params.maf_threshold
    );
    features
}
