//! Ensembl overlap endpoint as an annotation provider

use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::client::HttpClient;
use super::{
    build_chunks, region_string, DEFAULT_SPECIES, ENSEMBL_REST_URL, JSON, MAX_OVERLAP_REGION,
    OVERLAP_CHUNK,
};
use crate::annotation::{AnnotationBatch, AnnotationProvider, AnnotationQuery, RawFeature};
use crate::coords::{CoordinateBasis, GenomicInterval};
use crate::error::NegFeatError;
use crate::feature::FeatureKind;

const PROVIDER: &str = "ensembl";

/// Overlap `feature=` value for an annotation kind
pub fn overlap_feature(kind: FeatureKind) -> Option<&'static str> {
    match kind {
        FeatureKind::Repeat => Some("repeat"),
        FeatureKind::SimpleVariant => Some("variation"),
        FeatureKind::StructuralVariant => Some("structural_variation"),
        _ => None,
    }
}

/// Turn one overlap response item into a raw record
///
/// Items without integer `start`/`end` are skipped. The item's
/// `feature_type` becomes the record kind; every other field is kept as an
/// attribute.
pub fn record_from_item(item: &Value) -> Option<RawFeature> {
    let object = item.as_object()?;
    let start = object.get("start").and_then(Value::as_i64)?;
    let end = object.get("end").and_then(Value::as_i64)?;
    let mut record = RawFeature::new(start, end);
    if let Some(label) = object.get("feature_type").and_then(Value::as_str) {
        record = record.with_kind(label);
    }
    for (key, value) in object {
        if key == "start" || key == "end" || key == "feature_type" || value.is_null() {
            continue;
        }
        record.attributes.insert(key.clone(), value.clone());
    }
    Some(record)
}

/// Annotation provider backed by `/overlap/region`
pub struct EnsemblAnnotationProvider {
    client: Arc<HttpClient>,
    base_url: String,
    species: String,
    release: OnceCell<Option<String>>,
}

impl EnsemblAnnotationProvider {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ENSEMBL_REST_URL.to_string(),
            species: DEFAULT_SPECIES.to_string(),
            release: OnceCell::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = species.into();
        self
    }

    /// Ensembl data release, looked up once per provider
    ///
    /// Provenance only; failures are logged and yield `None`.
    fn release(&self) -> Option<String> {
        self.release
            .get_or_init(|| {
                let url = format!("{}/info/data", self.base_url);
                match self.client.get(PROVIDER, &url, &[], JSON) {
                    Ok(Some(fetched)) => fetched
                        .json()
                        .ok()
                        .and_then(|v| v.get("releases")?.as_array()?.first().cloned())
                        .map(|release| format!("ensembl-{}", release)),
                    Ok(None) => None,
                    Err(e) => {
                        log::debug!("no Ensembl release information: {}", e);
                        None
                    }
                }
            })
            .clone()
    }

    fn fetch_kind(
        &self,
        kind: FeatureKind,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError> {
        let feature = overlap_feature(kind).ok_or_else(|| {
            NegFeatError::invalid_parameter("features", format!("{} is not an annotation kind", kind))
        })?;
        let window = GenomicInterval::new(query.start, query.end).ok_or_else(|| {
            NegFeatError::invalid_parameter(
                "region",
                format!("empty query region {}..{}", query.start, query.end),
            )
        })?;
        let species = query.species.as_deref().unwrap_or(&self.species);
        let chunks = if window.len() > MAX_OVERLAP_REGION {
            build_chunks(window, OVERLAP_CHUNK)
        } else {
            vec![window]
        };

        let mut records = Vec::new();
        let mut seen: BTreeSet<(String, i64, i64)> = BTreeSet::new();
        let mut all_cached = true;
        let mut retrieved_at = None;
        for chunk in chunks {
            let url = format!(
                "{}/overlap/region/{}/{}",
                self.base_url,
                species,
                region_string(&query.contig, chunk)
            );
            let Some(fetched) = self.client.get(PROVIDER, &url, &[("feature", feature)], JSON)? else {
                log::debug!("{} returned no data for {}", url, feature);
                continue;
            };
            all_cached &= fetched.from_cache;
            retrieved_at = match retrieved_at {
                Some(earliest) if earliest <= fetched.retrieved_at => Some(earliest),
                _ => Some(fetched.retrieved_at),
            };

            let payload = fetched.json()?;
            let items = payload.as_array().ok_or_else(|| {
                NegFeatError::provider(PROVIDER, format!("{} did not return a list", url))
            })?;
            for item in items {
                let Some(record) = record_from_item(item) else {
                    continue;
                };
                // Items spanning a chunk boundary come back once per chunk
                let id = record
                    .attributes
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if seen.insert((id, record.start, record.end)) {
                    records.push(record);
                }
            }
        }

        log::info!(
            "{}: {} {} records for {}:{}-{}",
            PROVIDER,
            records.len(),
            kind,
            query.contig,
            query.start,
            query.end
        );
        let mut batch = AnnotationBatch::new(PROVIDER, kind, CoordinateBasis::OneBasedClosed, records);
        batch.provenance.from_cache = all_cached && retrieved_at.is_some();
        batch.provenance.retrieved_at = retrieved_at.map(|t| t.to_rfc3339());
        batch.provenance.dataset = self.release();
        Ok(batch)
    }
}

impl AnnotationProvider for EnsemblAnnotationProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch_repeats(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        self.fetch_kind(FeatureKind::Repeat, query)
    }

    fn fetch_variants(&self, query: &AnnotationQuery) -> Result<AnnotationBatch, NegFeatError> {
        self.fetch_kind(FeatureKind::SimpleVariant, query)
    }

    fn fetch_structural_variants(
        &self,
        query: &AnnotationQuery,
    ) -> Result<AnnotationBatch, NegFeatError> {
        self.fetch_kind(FeatureKind::StructuralVariant, query)
    }
}
