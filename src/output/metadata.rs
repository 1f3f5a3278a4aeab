//! JSON run descriptor written next to the GenBank record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::annotation::{MaskMode, Provenance};
use crate::error::NegFeatError;
use crate::feature::{FeatureKind, FeatureSelection};
use crate::flank::{FlankConfig, FlankedRegion};
use crate::locus::LocusContext;

/// Window placement as written to the sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub contig: String,
    /// 0-based, inclusive
    pub ext_start: u64,
    /// 0-based, exclusive
    pub ext_end: u64,
    pub length: u64,
}

impl From<&FlankedRegion> for RegionSummary {
    fn from(region: &FlankedRegion) -> Self {
        Self {
            contig: region.contig.clone(),
            ext_start: region.ext_start,
            ext_end: region.ext_end,
            length: region.len(),
        }
    }
}

/// Detection parameters in effect for the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub features: FeatureSelection,
    pub mask: MaskMode,
    pub maf_threshold: f64,
    pub gc_window: usize,
    pub gc_step: usize,
    pub gc_min: f64,
    pub gc_max: f64,
    pub homopolymer_at: usize,
    pub homopolymer_gc: usize,
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Everything needed to reproduce a run
///
/// Holds no wall-clock time of its own; times appear only inside
/// provenance, where they describe when provider data was retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub accession: String,
    pub assembly: String,
    pub locus: LocusContext,
    pub region: RegionSummary,
    pub flank: FlankConfig,
    /// Final counts, zero for enabled kinds with no features
    pub feature_counts: BTreeMap<FeatureKind, usize>,
    pub parameters: RunParameters,
    pub provenance: Vec<Provenance>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// File name of the companion GenBank record
    pub record_file: String,
    #[serde(default)]
    pub tool: ToolInfo,
}

/// Pretty-printed JSON with a trailing newline
pub fn render_metadata(metadata: &RunMetadata) -> Result<Vec<u8>, NegFeatError> {
    let mut buffer = serde_json::to_vec_pretty(metadata).map_err(|e| NegFeatError::Serialization {
        msg: format!("failed to render metadata: {}", e),
    })?;
    buffer.push(b'\n');
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{GenomicInterval, Strand};
    use crate::flank::FlankMode;

    fn sample() -> RunMetadata {
        let locus = LocusContext::new("GRCh38", "17", Strand::Plus, 100, 200).unwrap();
        let region =
            FlankedRegion::new("17", GenomicInterval::new(90, 210).unwrap(), "A".repeat(120))
                .unwrap();
        let mut counts = BTreeMap::new();
        counts.insert(FeatureKind::Repeat, 0);
        counts.insert(FeatureKind::Homopolymer, 1);
        RunMetadata {
            accession: "P12345".to_string(),
            assembly: "GRCh38".to_string(),
            locus,
            region: RegionSummary::from(&region),
            flank: FlankConfig::new(10, FlankMode::Genomic),
            feature_counts: counts,
            parameters: RunParameters {
                features: FeatureSelection::all(),
                mask: MaskMode::Soft,
                maf_threshold: 0.01,
                gc_window: 50,
                gc_step: 10,
                gc_min: 0.3,
                gc_max: 0.7,
                homopolymer_at: 5,
                homopolymer_gc: 4,
                offline: false,
            },
            provenance: vec![],
            warnings: vec![],
            record_file: "P12345.GRCh38.17_90_210.negfeatures.gb".to_string(),
            tool: ToolInfo::default(),
        }
    }

    #[test]
    fn test_render_metadata_shape() {
        let bytes = render_metadata(&sample()).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["region"]["length"], 120);
        assert_eq!(value["feature_counts"]["repeat"], 0);
        assert_eq!(value["feature_counts"]["homopolymer"], 1);
        assert_eq!(value["flank"]["mode"], "genomic");
        assert_eq!(value["parameters"]["mask"], "soft");
        assert_eq!(value["locus"]["strand"], "+");
    }

    #[test]
    fn test_metadata_roundtrip() {
        let metadata = sample();
        let bytes = render_metadata(&metadata).unwrap();
        let parsed: RunMetadata = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, metadata);
    }
}
