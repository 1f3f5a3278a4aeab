//! Fixture locus resolver for testing and offline runs

use std::collections::HashMap;
use std::path::Path;

use crate::error::NegFeatError;
use crate::locus::{LocusContext, LocusResolver, ResolvedLocus};

/// Locus resolver backed by an in-memory accession table
#[derive(Debug, Clone, Default)]
pub struct MockLocusResolver {
    loci: HashMap<String, LocusContext>,
}

impl MockLocusResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Load loci from a JSON object keyed by accession
    ///
    /// ```json
    /// { "P04637": { "assembly": "GRCh38", "contig": "17", "strand": "-",
    ///               "gene_start": 7661778, "gene_end": 7687538 } }
    /// ```
    pub fn from_json(path: &Path) -> Result<Self, NegFeatError> {
        let content = std::fs::read_to_string(path)?;
        let loci: HashMap<String, LocusContext> = serde_json::from_str(&content)?;
        for (accession, locus) in &loci {
            if locus.gene_start >= locus.gene_end {
                return Err(NegFeatError::LocusUnresolved {
                    accession: accession.clone(),
                    msg: format!(
                        "fixture gene span [{}, {}) is empty",
                        locus.gene_start, locus.gene_end
                    ),
                });
            }
        }
        Ok(Self { loci })
    }

    /// Register a locus for an accession
    pub fn add_locus(&mut self, accession: impl Into<String>, locus: LocusContext) {
        self.loci.insert(accession.into(), locus);
    }
}

impl LocusResolver for MockLocusResolver {
    fn resolve(&self, accession: &str) -> Result<ResolvedLocus, NegFeatError> {
        self.loci
            .get(accession)
            .cloned()
            .map(ResolvedLocus::from)
            .ok_or_else(|| NegFeatError::LocusUnresolved {
                accession: accession.to_string(),
                msg: "accession not present in fixture".to_string(),
            })
    }
}
