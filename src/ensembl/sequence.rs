//! Ensembl sequence and assembly endpoints as a sequence source

use std::sync::Arc;

use super::client::HttpClient;
use super::{build_chunks, region_string, DEFAULT_SPECIES, ENSEMBL_REST_URL, JSON, SEQUENCE_CHUNK};
use crate::coords::GenomicInterval;
use crate::error::NegFeatError;
use crate::sequence::SequenceSource;

const PROVIDER: &str = "ensembl";

/// Strip FASTA headers and line breaks from a sequence response
///
/// ```
/// use ferro_negfeat::ensembl::sequence::strip_fasta;
///
/// assert_eq!(strip_fasta(">chromosome:GRCh38:17\nACGT\nNN\n"), "ACGTNN");
/// assert_eq!(strip_fasta("acgt\r\n"), "acgt");
/// ```
pub fn strip_fasta(body: &str) -> String {
    body.lines()
        .filter(|line| !line.starts_with('>'))
        .map(str::trim)
        .collect()
}

/// Sequence source backed by `/sequence/region` and `/info/assembly`
pub struct EnsemblSequenceSource {
    client: Arc<HttpClient>,
    base_url: String,
    species: String,
}

impl EnsemblSequenceSource {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ENSEMBL_REST_URL.to_string(),
            species: DEFAULT_SPECIES.to_string(),
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

    fn fetch_chunk(&self, contig: &str, chunk: GenomicInterval) -> Result<String, NegFeatError> {
        let url = format!(
            "{}/sequence/region/{}/{}:1",
            self.base_url,
            self.species,
            region_string(contig, chunk)
        );
        let fetched = self
            .client
            .get(PROVIDER, &url, &[], "text/plain")?
            .ok_or_else(|| NegFeatError::provider(PROVIDER, format!("no sequence for {}", url)))?;
        let sequence = strip_fasta(&fetched.body);
        if sequence.len() as u64 != chunk.len() {
            return Err(NegFeatError::provider(
                PROVIDER,
                format!(
                    "expected {} bases for {}, got {}",
                    chunk.len(),
                    url,
                    sequence.len()
                ),
            ));
        }
        Ok(sequence)
    }
}

impl SequenceSource for EnsemblSequenceSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn contig_length(&self, assembly: &str, contig: &str) -> Result<u64, NegFeatError> {
        let url = format!("{}/info/assembly/{}/{}", self.base_url, self.species, contig);
        let fetched = self.client.get(PROVIDER, &url, &[], JSON)?.ok_or_else(|| {
            NegFeatError::provider(PROVIDER, format!("unknown contig {} in {}", contig, assembly))
        })?;
        fetched
            .json()?
            .get("length")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                NegFeatError::provider(PROVIDER, format!("{} reported no length", url))
            })
    }

    fn fetch_sequence(
        &self,
        _assembly: &str,
        contig: &str,
        window: GenomicInterval,
    ) -> Result<String, NegFeatError> {
        let mut sequence = String::with_capacity(window.len() as usize);
        for chunk in build_chunks(window, SEQUENCE_CHUNK) {
            sequence.push_str(&self.fetch_chunk(contig, chunk)?);
        }
        log::debug!("fetched {} bases of {} from Ensembl", sequence.len(), contig);
        Ok(sequence)
    }
}
