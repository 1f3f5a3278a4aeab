// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-negfeat: negative feature annotation for primer design
//!
//! Part of the ferro bioinformatics toolkit. Given a protein accession, the
//! gene locus is resolved, extended by a flank, and every interval that a
//! PCR primer or hybridization oligo should avoid is collected: repeats, common SNPs,
//! structural variants, GC-extreme windows, homopolymers and ambiguous
//! bases. Results are written as a GenBank record with a JSON sidecar.
//!
//! # Example
//!
//! ```
//! use ferro_negfeat::coords::Strand;
//! use ferro_negfeat::locus::{LocusContext, MockLocusResolver};
//! use ferro_negfeat::{run, MockAnnotationProvider, MockSequenceSource, RunConfig};
//!
//! let mut resolver = MockLocusResolver::new();
//! resolver.add_locus("P12345", LocusContext::new("GRCh38", "1", Strand::Plus, 20, 40).unwrap());
//! let mut sequence = MockSequenceSource::new();
//! sequence.add_contig("1", "ACGT".repeat(10) + "AAAAAAAAAA" + &"GCTA".repeat(10));
//!
//! let outdir = tempfile::tempdir().unwrap();
//! let mut config = RunConfig::default();
//! config.outdir = outdir.path().to_path_buf();
//! config.flank.flank_bp = 20;
//!
//! let summary = run("P12345", &config, &resolver, &sequence, &MockAnnotationProvider::new()).unwrap();
//! assert!(summary.paths.record.exists());
//! assert!(summary.paths.metadata.exists());
//! ```

pub mod aggregate;
pub mod annotation;
pub mod cli;
pub mod config;
pub mod coords;
pub mod ensembl;
pub mod error;
pub mod feature;
pub mod flank;
pub mod locus;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod sequence;

// Re-export commonly used types
pub use aggregate::{aggregate, NegativeFeatureSet};
pub use annotation::{AnnotationProvider, MaskMode, MockAnnotationProvider, NormalizeParams};
pub use config::RunConfig;
pub use coords::{CoordinateBasis, GenomicInterval, Strand};
pub use error::{ErrorCode, NegFeatError};
pub use feature::{Feature, FeatureKind, FeatureSelection};
pub use flank::{compute_window, FlankConfig, FlankMode, FlankedRegion};
pub use locus::{LocusContext, LocusResolver};
pub use pipeline::{compute_negative_features, run, RunSummary};
pub use scan::ScanParams;
pub use sequence::{FastaSequenceSource, MockSequenceSource, SequenceSource};

/// Result type alias for ferro-negfeat operations
pub type Result<T> = std::result::Result<T, NegFeatError>;
