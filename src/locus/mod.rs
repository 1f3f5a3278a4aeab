//! Gene locus model and resolver interface
//!
//! A [`LocusContext`] is the resolved position of the gene behind a protein
//! accession. It is produced once per run by a [`LocusResolver`] and never
//! modified afterwards.

pub mod mock;

use serde::{Deserialize, Serialize};

use crate::coords::{GenomicInterval, Strand};
use crate::error::NegFeatError;

pub use mock::MockLocusResolver;

/// Resolved genomic locus of a gene
///
/// `gene_start`/`gene_end` are 0-based, half-open and absolute on `contig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocusContext {
    pub assembly: String,
    pub contig: String,
    pub strand: Strand,
    pub gene_start: u64,
    pub gene_end: u64,
    /// Stable gene identifier (e.g., ENSG00000141510)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_id: Option<String>,
    /// Gene symbol (e.g., TP53)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_name: Option<String>,
    /// Species name as used by the provider (e.g., homo_sapiens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl LocusContext {
    /// Create a new locus, rejecting empty or inverted gene spans
    ///
    /// # Examples
    ///
    /// ```
    /// use ferro_negfeat::coords::Strand;
    /// use ferro_negfeat::locus::LocusContext;
    ///
    /// let locus = LocusContext::new("GRCh38", "17", Strand::Minus, 7661778, 7687538).unwrap();
    /// assert_eq!(locus.gene_len(), 25760);
    /// assert!(LocusContext::new("GRCh38", "17", Strand::Plus, 10, 10).is_err());
    /// ```
    pub fn new(
        assembly: impl Into<String>,
        contig: impl Into<String>,
        strand: Strand,
        gene_start: u64,
        gene_end: u64,
    ) -> Result<Self, NegFeatError> {
        if gene_start >= gene_end {
            return Err(NegFeatError::invalid_parameter(
                "locus",
                format!("gene span [{}, {}) is empty", gene_start, gene_end),
            ));
        }
        Ok(Self {
            assembly: assembly.into(),
            contig: contig.into(),
            strand,
            gene_start,
            gene_end,
            gene_id: None,
            gene_name: None,
            species: None,
        })
    }

    pub fn with_gene_id(mut self, gene_id: impl Into<String>) -> Self {
        self.gene_id = Some(gene_id.into());
        self
    }

    pub fn with_gene_name(mut self, gene_name: impl Into<String>) -> Self {
        self.gene_name = Some(gene_name.into());
        self
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    /// The gene span as an interval, `None` if the span was emptied after construction
    pub fn gene_interval(&self) -> Option<GenomicInterval> {
        GenomicInterval::new(self.gene_start, self.gene_end)
    }

    pub fn gene_len(&self) -> u64 {
        self.gene_end.saturating_sub(self.gene_start)
    }
}

/// Locus plus the non-fatal remarks collected while resolving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocus {
    pub locus: LocusContext,
    pub warnings: Vec<String>,
}

impl From<LocusContext> for ResolvedLocus {
    fn from(locus: LocusContext) -> Self {
        Self {
            locus,
            warnings: Vec::new(),
        }
    }
}

/// Trait for mapping a protein accession to a gene locus
///
/// Implementations might include:
/// - MockLocusResolver for fixtures and tests
/// - EnsemblLocusResolver for the EBI / UniProt / Ensembl REST chain
pub trait LocusResolver {
    /// Resolve an accession to its gene locus
    ///
    /// # Arguments
    ///
    /// * `accession` - Protein accession (e.g., "P04637")
    ///
    /// # Errors
    ///
    /// Returns [`NegFeatError::LocusUnresolved`] when no locus can be found.
    fn resolve(&self, accession: &str) -> Result<ResolvedLocus, NegFeatError>;
}

impl<T: LocusResolver + ?Sized> LocusResolver for Box<T> {
    fn resolve(&self, accession: &str) -> Result<ResolvedLocus, NegFeatError> {
        (**self).resolve(accession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locus_builder() {
        let locus = LocusContext::new("GRCh38", "17", Strand::Minus, 100, 200)
            .unwrap()
            .with_gene_id("ENSG00000141510")
            .with_gene_name("TP53")
            .with_species("homo_sapiens");
        assert_eq!(locus.gene_id.as_deref(), Some("ENSG00000141510"));
        assert_eq!(locus.gene_name.as_deref(), Some("TP53"));
        assert_eq!(locus.gene_interval(), GenomicInterval::new(100, 200));
    }

    #[test]
    fn test_locus_rejects_inverted_span() {
        let err = LocusContext::new("GRCh38", "1", Strand::Plus, 200, 100).unwrap_err();
        assert!(matches!(err, NegFeatError::InvalidParameter { .. }));
    }

    #[test]
    fn test_locus_serde_skips_missing_optionals() {
        let locus = LocusContext::new("GRCh38", "1", Strand::Plus, 0, 10).unwrap();
        let json = serde_json::to_string(&locus).unwrap();
        assert!(!json.contains("gene_id"));
        assert!(json.contains("\"strand\":\"+\""));
    }
}
