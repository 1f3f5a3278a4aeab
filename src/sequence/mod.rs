//! Genomic sequence sources
//!
//! A [`SequenceSource`] supplies contig lengths and window sequences.
//! Implementations:
//!
//! - [`FastaSequenceSource`]: indexed local FASTA
//! - [`MockSequenceSource`]: in-memory contigs for tests
//! - `EnsemblSequenceSource` (in [`crate::ensembl`]): Ensembl REST

pub mod fasta;
pub mod mock;

use crate::coords::GenomicInterval;
use crate::error::NegFeatError;

pub use fasta::FastaSequenceSource;
pub use mock::MockSequenceSource;

/// Trait for retrieving genomic sequence
pub trait SequenceSource {
    /// Short name used in errors and provenance
    fn name(&self) -> &str;

    /// Length of a contig in bases
    fn contig_length(&self, assembly: &str, contig: &str) -> Result<u64, NegFeatError>;

    /// Forward-strand sequence of a window
    ///
    /// # Arguments
    ///
    /// * `assembly` - Assembly name (e.g., "GRCh38")
    /// * `contig` - Contig name (e.g., "17", "chr17")
    /// * `window` - 0-based half-open interval
    fn fetch_sequence(
        &self,
        assembly: &str,
        contig: &str,
        window: GenomicInterval,
    ) -> Result<String, NegFeatError>;
}

impl<T: SequenceSource + ?Sized> SequenceSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn contig_length(&self, assembly: &str, contig: &str) -> Result<u64, NegFeatError> {
        (**self).contig_length(assembly, contig)
    }

    fn fetch_sequence(
        &self,
        assembly: &str,
        contig: &str,
        window: GenomicInterval,
    ) -> Result<String, NegFeatError> {
        (**self).fetch_sequence(assembly, contig, window)
    }
}
