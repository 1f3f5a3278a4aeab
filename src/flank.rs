//! Flanked window computation
//!
//! Turns a gene locus plus flank settings into the absolute window that is
//! extracted and annotated. Two modes exist:
//!
//! - [`FlankMode::Genomic`]: the left flank is always subtracted from the
//!   gene start and the right flank added to the gene end.
//! - [`FlankMode::StrandRelative`]: flanks are expressed as upstream and
//!   downstream of transcription, so on the minus strand the upstream flank
//!   lies past the gene end.
//!
//! With one `flank_bp` used on both sides the two modes produce the same
//! window; they diverge once upstream and downstream differ.
//!
//! # Examples
//!
//! ```
//! use ferro_negfeat::coords::Strand;
//! use ferro_negfeat::flank::{compute_window, FlankConfig, FlankMode};
//! use ferro_negfeat::locus::LocusContext;
//!
//! let locus = LocusContext::new("GRCh38", "1", Strand::Plus, 0, 1000).unwrap();
//! let config = FlankConfig::new(500, FlankMode::Genomic);
//! let window = compute_window(&locus, &config, 10_000).unwrap();
//! assert_eq!((window.start(), window.end()), (0, 1500));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coords::{GenomicInterval, Strand};
use crate::error::NegFeatError;
use crate::locus::LocusContext;

/// Default flank on each side of the gene, in bases
pub const DEFAULT_FLANK_BP: u64 = 10_000;

/// How flanks are applied relative to the gene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlankMode {
    #[default]
    Genomic,
    StrandRelative,
}

impl FlankMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlankMode::Genomic => "genomic",
            FlankMode::StrandRelative => "strand_relative",
        }
    }
}

impl fmt::Display for FlankMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FlankMode {
    type Err = NegFeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "genomic" => Ok(FlankMode::Genomic),
            "strand_relative" | "strand-relative" => Ok(FlankMode::StrandRelative),
            other => Err(NegFeatError::invalid_parameter(
                "flank_mode",
                format!("unknown mode '{}', expected genomic or strand_relative", other),
            )),
        }
    }
}

/// Flank settings for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlankConfig {
    pub flank_bp: u64,
    pub mode: FlankMode,
}

impl FlankConfig {
    pub fn new(flank_bp: u64, mode: FlankMode) -> Self {
        Self { flank_bp, mode }
    }
}

impl Default for FlankConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FLANK_BP, FlankMode::Genomic)
    }
}

/// Extend a gene span by upstream/downstream flanks without clamping
///
/// Returns signed `(start, end)` so callers can report how far a window
/// overshoots the contig. In genomic mode `upstream` is the left flank and
/// `downstream` the right flank whatever the strand.
pub fn extend_span(
    gene_start: u64,
    gene_end: u64,
    strand: Strand,
    upstream_bp: u64,
    downstream_bp: u64,
    mode: FlankMode,
) -> (i64, i64) {
    let (left, right) = match (mode, strand) {
        (FlankMode::Genomic, _) | (FlankMode::StrandRelative, Strand::Plus) => {
            (upstream_bp, downstream_bp)
        }
        (FlankMode::StrandRelative, Strand::Minus) => (downstream_bp, upstream_bp),
    };
    let start = to_signed(gene_start).saturating_sub(to_signed(left));
    let end = to_signed(gene_end).saturating_add(to_signed(right));
    (start, end)
}

/// Clamp a signed span to `[0, contig_length)`
///
/// # Errors
///
/// Returns [`NegFeatError::OutOfBounds`] with the unclamped coordinates if
/// nothing remains after clamping.
pub fn clamp_to_contig(
    contig: &str,
    span: (i64, i64),
    contig_length: u64,
) -> Result<GenomicInterval, NegFeatError> {
    let (start, end) = span;
    let clamped_start = start.max(0) as u64;
    let clamped_end = if end < 0 {
        0
    } else {
        (end as u64).min(contig_length)
    };
    GenomicInterval::new(clamped_start, clamped_end).ok_or_else(|| NegFeatError::OutOfBounds {
        contig: contig.to_string(),
        start,
        end,
        contig_length,
    })
}

/// Compute the flanked window for a locus
///
/// The gene must start on the contig; a gene lying past the contig end is
/// reported as [`NegFeatError::OutOfBounds`] even if its flank would reach
/// back onto the contig.
pub fn compute_window(
    locus: &LocusContext,
    config: &FlankConfig,
    contig_length: u64,
) -> Result<GenomicInterval, NegFeatError> {
    let span = extend_span(
        locus.gene_start,
        locus.gene_end,
        locus.strand,
        config.flank_bp,
        config.flank_bp,
        config.mode,
    );
    if locus.gene_start >= contig_length {
        return Err(NegFeatError::OutOfBounds {
            contig: locus.contig.clone(),
            start: span.0,
            end: span.1,
            contig_length,
        });
    }
    let window = clamp_to_contig(&locus.contig, span, contig_length)?;
    log::debug!(
        "flank {} bp ({}) on {}:{}-{} ({}) -> {}",
        config.flank_bp,
        config.mode,
        locus.contig,
        locus.gene_start,
        locus.gene_end,
        locus.strand,
        window
    );
    Ok(window)
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Extracted window: absolute coordinates plus its sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlankedRegion {
    pub contig: String,
    pub ext_start: u64,
    pub ext_end: u64,
    pub sequence: String,
}

impl FlankedRegion {
    /// Pair a window with its sequence, checking the length agrees
    pub fn new(
        contig: impl Into<String>,
        window: GenomicInterval,
        sequence: String,
    ) -> Result<Self, NegFeatError> {
        let contig = contig.into();
        if sequence.len() as u64 != window.len() {
            return Err(NegFeatError::provider(
                "sequence",
                format!(
                    "expected {} bases for {}:{}, received {}",
                    window.len(),
                    contig,
                    window,
                    sequence.len()
                ),
            ));
        }
        Ok(Self {
            contig,
            ext_start: window.start(),
            ext_end: window.end(),
            sequence,
        })
    }

    pub fn interval(&self) -> Option<GenomicInterval> {
        GenomicInterval::new(self.ext_start, self.ext_end)
    }

    pub fn len(&self) -> u64 {
        self.ext_end - self.ext_start
    }

    pub fn is_empty(&self) -> bool {
        self.ext_start >= self.ext_end
    }
}
