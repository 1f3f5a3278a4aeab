//! External annotation interface
//!
//! Repeats, simple variants and structural variants come from providers
//! outside the engine. A provider answers a region query with an
//! [`AnnotationBatch`] of [`RawFeature`] records in its own coordinate
//! convention; [`normalize`] turns those into engine [`Feature`]s.
//!
//! [`Feature`]: crate::feature::Feature

pub mod mock;
pub mod normalize;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::coords::CoordinateBasis;
use crate::error::NegFeatError;
use crate::feature::FeatureKind;

pub use mock::MockAnnotationProvider;
pub use normalize::{normalize_batch, NormalizeParams};

/// Default minimum minor-allele frequency for simple variants
pub const DEFAULT_MAF_THRESHOLD: f64 = 0.01;

/// How repeat annotations are carried into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    /// Drop all repeat records
    None,
    /// Keep repeats as annotation only
    #[default]
    Soft,
    /// Keep repeats and mark them `exclude = true`
    Hard,
}

impl MaskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskMode::None => "none",
            MaskMode::Soft => "soft",
            MaskMode::Hard => "hard",
        }
    }
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaskMode {
    type Err = NegFeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MaskMode::None),
            "soft" => Ok(MaskMode::Soft),
            "hard" => Ok(MaskMode::Hard),
            other => Err(NegFeatError::invalid_parameter(
                "mask",
                format!("unknown mask mode '{}', expected none, soft or hard", other),
            )),
        }
    }
}

/// One record as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    pub start: i64,
    pub end: i64,
    /// Provider's own kind label, if the record carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl RawFeature {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            kind: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Region being annotated, 0-based half-open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationQuery {
    pub assembly: String,
    pub contig: String,
    pub start: u64,
    pub end: u64,
    /// Species for providers that key on it (e.g., homo_sapiens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

/// Where a batch of annotations came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: String,
    pub kind: FeatureKind,
    /// Dataset or release identifier, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// RFC 3339 time the underlying response was retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_at: Option<String>,
    /// True if every response came from the local cache
    #[serde(default)]
    pub from_cache: bool,
    pub records: usize,
}

/// Records for one kind over one region
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationBatch {
    pub kind: FeatureKind,
    pub basis: CoordinateBasis,
    pub records: Vec<RawFeature>,
    pub provenance: Provenance,
}

impl AnnotationBatch {
    /// Create a batch; provenance record count follows `records`
    pub fn new(
        provider: impl Into<String>,
        kind: FeatureKind,
        basis: CoordinateBasis,
        records: Vec<RawFeature>,
    ) -> Self {
        let provenance = Provenance {
            provider: provider.into(),
            kind,
            dataset: None,
            retrieved_at: None,
            from_cache: false,
            records: records.len(),
        };
        Self {
            kind,
            basis,
            records,
            provenance,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provenance.provider
    }
}

/// Trait for repeat and variant annotation sources
///
/// Implementations might include:
/// - MockAnnotationProvider for fixtures and tests
/// - EnsemblAnnotationProvider for the Ensembl overlap endpoint
pub trait AnnotationProvider {
    /// Short provider name used for sources and provenance
    fn name(&self) -> &str;

    /// Repeat elements overlapping the query
    fn fetch_repeats(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError>;

    /// Short variants overlapping the query
    fn fetch_variants(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError>;

    /// Structural variants overlapping the query
    fn fetch_structural_variants(
        &self,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError>;

    /// Dispatch on kind
    ///
    /// Sequence-derived kinds have no provider and yield
    /// [`NegFeatError::InvalidParameter`].
    fn fetch(
        &self,
        kind: FeatureKind,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError> {
        match kind {
            FeatureKind::Repeat => self.fetch_repeats(query),
            FeatureKind::SimpleVariant => self.fetch_variants(query),
            FeatureKind::StructuralVariant => self.fetch_structural_variants(query),
            other => Err(NegFeatError::invalid_parameter(
                "features",
                format!("{} is not an annotation kind", other),
            )),
        }
    }
}

impl<T: AnnotationProvider + ?Sized> AnnotationProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_repeats(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        (**self).fetch_repeats(query)
    }

    fn fetch_variants(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        (**self).fetch_variants(query)
    }

    fn fetch_structural_variants(
        &self,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError> {
        (**self).fetch_structural_variants(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_mode_parse() {
        assert_eq!("HARD".parse::<MaskMode>().unwrap(), MaskMode::Hard);
        assert_eq!("none".parse::<MaskMode>().unwrap(), MaskMode::None);
        assert!("partial".parse::<MaskMode>().is_err());
        assert_eq!(MaskMode::default(), MaskMode::Soft);
    }

    #[test]
    fn test_raw_feature_deserialize_defaults() {
        let raw: RawFeature = serde_json::from_str(r#"{"start": 1, "end": 5}"#).unwrap();
        assert_eq!(raw.kind, None);
        assert!(raw.attributes.is_empty());
    }

    #[test]
    fn test_batch_provenance_counts_records() {
        let batch = AnnotationBatch::new(
            "fixture",
            FeatureKind::Repeat,
            CoordinateBasis::ZeroBasedHalfOpen,
            vec![RawFeature::new(0, 5), RawFeature::new(10, 20)],
        );
        assert_eq!(batch.provenance.records, 2);
        assert_eq!(batch.provider(), "fixture");
    }

    #[test]
    fn test_fetch_rejects_sequence_kinds() {
        let provider = MockAnnotationProvider::new();
        let query = AnnotationQuery {
            assembly: "GRCh38".to_string(),
            contig: "1".to_string(),
            start: 0,
            end: 10,
            species: None,
        };
        assert!(provider.fetch(FeatureKind::ExtremeGc, &query).is_err());
        assert!(provider.fetch(FeatureKind::Repeat, &query).is_ok());
    }
}
