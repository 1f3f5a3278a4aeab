//! Ensembl REST providers
//!
//! Implementations of the locus, annotation and sequence traits backed by
//! the Ensembl REST API, the EBI Proteins coordinate service and UniProt.
//! All requests go through one shared [`HttpClient`], which applies the
//! retry policy and the response cache.
//!
//! Network access requires the `remote` feature (on by default). Without it
//! only cached responses can be served.

pub mod cache;
pub mod client;
pub mod overlap;
pub mod resolver;
pub mod sequence;

use crate::coords::GenomicInterval;

pub use cache::{CachedResponse, ResponseCache};
pub use client::{ClientConfig, Fetched, HttpClient};
pub use overlap::EnsemblAnnotationProvider;
pub use resolver::EnsemblLocusResolver;
pub use sequence::EnsemblSequenceSource;

/// Ensembl REST base URL
pub const ENSEMBL_REST_URL: &str = "https://rest.ensembl.org";

/// EBI Proteins API base URL
pub const EBI_PROTEINS_URL: &str = "https://www.ebi.ac.uk/proteins/api";

/// UniProt REST base URL
pub const UNIPROT_REST_URL: &str = "https://rest.uniprot.org";

/// Species used when the locus does not name one
pub const DEFAULT_SPECIES: &str = "homo_sapiens";

/// Largest region the overlap endpoint accepts in one request
pub const MAX_OVERLAP_REGION: u64 = 5_000_000;

/// Chunk size used once a region exceeds [`MAX_OVERLAP_REGION`]
pub const OVERLAP_CHUNK: u64 = 4_500_000;

/// Chunk size for sequence downloads
pub const SEQUENCE_CHUNK: u64 = 9_500_000;

pub(crate) const JSON: &str = "application/json";

/// Split a window into consecutive chunks of at most `chunk` bases
///
/// # Examples
///
/// ```
/// use ferro_negfeat::coords::GenomicInterval;
/// use ferro_negfeat::ensembl::build_chunks;
///
/// let window = GenomicInterval::new(0, 10).unwrap();
/// let chunks = build_chunks(window, 4);
/// let spans: Vec<_> = chunks.iter().map(|c| (c.start(), c.end())).collect();
/// assert_eq!(spans, vec![(0, 4), (4, 8), (8, 10)]);
/// ```
pub fn build_chunks(window: GenomicInterval, chunk: u64) -> Vec<GenomicInterval> {
    let chunk = chunk.max(1);
    let mut chunks = Vec::new();
    let mut start = window.start();
    while start < window.end() {
        let end = (start + chunk).min(window.end());
        if let Some(piece) = GenomicInterval::new(start, end) {
            chunks.push(piece);
        }
        start = end;
    }
    chunks
}

/// Ensembl region string, 1-based closed: `17:1001..2000`
pub(crate) fn region_string(contig: &str, window: GenomicInterval) -> String {
    let (start, end) = window.to_one_based_closed();
    format!("{}:{}..{}", contig, start, end)
}
