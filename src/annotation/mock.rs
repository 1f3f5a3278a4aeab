//! Fixture annotation provider for testing and offline runs

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::annotation::{AnnotationBatch, AnnotationProvider, AnnotationQuery, RawFeature};
use crate::coords::CoordinateBasis;
use crate::error::NegFeatError;
use crate::feature::FeatureKind;

/// On-disk fixture layout
#[derive(Debug, Deserialize)]
struct AnnotationFixture {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    basis: CoordinateBasis,
    #[serde(default)]
    dataset: Option<String>,
    #[serde(default)]
    repeat: Vec<RawFeature>,
    #[serde(default)]
    simple_variant: Vec<RawFeature>,
    #[serde(default)]
    structural_variant: Vec<RawFeature>,
}

/// Annotation provider backed by in-memory record lists
#[derive(Debug, Clone)]
pub struct MockAnnotationProvider {
    name: String,
    basis: CoordinateBasis,
    dataset: Option<String>,
    records: HashMap<FeatureKind, Vec<RawFeature>>,
    unavailable: BTreeSet<FeatureKind>,
}

impl MockAnnotationProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self {
            name: "fixture".to_string(),
            basis: CoordinateBasis::ZeroBasedHalfOpen,
            dataset: None,
            records: HashMap::new(),
            unavailable: BTreeSet::new(),
        }
    }

    /// Load records from a JSON fixture
    ///
    /// ```json
    /// { "basis": "one_based_closed",
    ///   "repeat": [ { "start": 101, "end": 250, "attributes": { "description": "AluY" } } ],
    ///   "simple_variant": [ { "start": 500, "end": 500,
    ///                         "attributes": { "id": "rs1", "minor_allele_frequency": 0.2 } } ] }
    /// ```
    pub fn from_json(path: &Path) -> Result<Self, NegFeatError> {
        let content = std::fs::read_to_string(path)?;
        let fixture: AnnotationFixture = serde_json::from_str(&content)?;
        let mut provider = Self::new().with_basis(fixture.basis);
        if let Some(name) = fixture.name {
            provider.name = name;
        }
        provider.dataset = fixture.dataset;
        provider.records.insert(FeatureKind::Repeat, fixture.repeat);
        provider
            .records
            .insert(FeatureKind::SimpleVariant, fixture.simple_variant);
        provider
            .records
            .insert(FeatureKind::StructuralVariant, fixture.structural_variant);
        Ok(provider)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_basis(mut self, basis: CoordinateBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Add one record for a kind
    pub fn add_record(&mut self, kind: FeatureKind, record: RawFeature) {
        self.records.entry(kind).or_default().push(record);
    }

    /// Make every fetch of `kind` fail with `ProviderUnavailable`
    pub fn set_unavailable(&mut self, kind: FeatureKind) {
        self.unavailable.insert(kind);
    }

    fn batch(&self, kind: FeatureKind, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        if self.unavailable.contains(&kind) {
            return Err(NegFeatError::provider(
                &self.name,
                format!("{} unavailable for {}:{}-{}", kind, query.contig, query.start, query.end),
            ));
        }
        let records = self.records.get(&kind).cloned().unwrap_or_default();
        let mut batch = AnnotationBatch::new(&self.name, kind, self.basis, records);
        batch.provenance.dataset = self.dataset.clone();
        Ok(batch)
    }
}

impl Default for MockAnnotationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationProvider for MockAnnotationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_repeats(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        self.batch(FeatureKind::Repeat, query)
    }

    fn fetch_variants(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        self.batch(FeatureKind::SimpleVariant, query)
    }

    fn fetch_structural_variants(
        &self,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError> {
        self.batch(FeatureKind::StructuralVariant, query)
    }
}
