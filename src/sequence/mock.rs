//! In-memory sequence source for testing

use std::collections::HashMap;

use crate::coords::GenomicInterval;
use crate::error::NegFeatError;
use crate::sequence::SequenceSource;

/// Sequence source holding whole contigs in memory
#[derive(Debug, Clone, Default)]
pub struct MockSequenceSource {
    contigs: HashMap<String, String>,
}

impl MockSequenceSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contig sequence
    pub fn add_contig(&mut self, contig: impl Into<String>, sequence: impl Into<String>) {
        self.contigs.insert(contig.into(), sequence.into());
    }

    fn contig(&self, contig: &str) -> Result<&String, NegFeatError> {
        self.contigs
            .get(contig)
            .ok_or_else(|| NegFeatError::provider("mock", format!("unknown contig {}", contig)))
    }
}

impl SequenceSource for MockSequenceSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn contig_length(&self, _assembly: &str, contig: &str) -> Result<u64, NegFeatError> {
        Ok(self.contig(contig)?.len() as u64)
    }

    fn fetch_sequence(
        &self,
        _assembly: &str,
        contig: &str,
        window: GenomicInterval,
    ) -> Result<String, NegFeatError> {
        let sequence = self.contig(contig)?;
        sequence
            .get(window.start() as usize..window.end() as usize)
            .map(str::to_string)
            .ok_or_else(|| {
                NegFeatError::provider(
                    "mock",
                    format!("{} is outside {} ({} bases)", window, contig, sequence.len()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_window() {
        let mut source = MockSequenceSource::new();
        source.add_contig("1", "ACGTACGTAC");
        assert_eq!(source.contig_length("GRCh38", "1").unwrap(), 10);
        let window = GenomicInterval::new(2, 6).unwrap();
        assert_eq!(source.fetch_sequence("GRCh38", "1", window).unwrap(), "GTAC");
    }

    #[test]
    fn test_errors() {
        let mut source = MockSequenceSource::new();
        source.add_contig("1", "ACGT");
        assert!(source.contig_length("GRCh38", "2").is_err());
        let window = GenomicInterval::new(2, 6).unwrap();
        assert!(source.fetch_sequence("GRCh38", "1", window).is_err());
    }
}
