//! End-to-end run: accession in, record and sidecar out
//!
//! [`run`] drives one accession through every stage:
//!
//! 1. validate the configuration
//! 2. resolve the locus and contig length
//! 3. compute the flanked window and fetch its sequence
//! 4. fetch annotation batches for the enabled annotation kinds
//! 5. scan, normalize and aggregate ([`compute_negative_features`])
//! 6. render and write both artifacts
//!
//! Collaborators are passed in as trait objects so the same path serves
//! Ensembl-backed runs, local FASTA runs and fixtures.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::aggregate::{aggregate, NegativeFeatureSet};
use crate::annotation::{
    normalize_batch, AnnotationBatch, AnnotationProvider, AnnotationQuery, MaskMode,
    NormalizeParams,
};
use crate::config::RunConfig;
use crate::error::NegFeatError;
use crate::feature::{FeatureKind, FeatureSelection};
use crate::flank::{compute_window, FlankedRegion};
use crate::locus::LocusResolver;
use crate::output::{
    render_metadata, render_record, write_outputs, OutputPaths, RecordContext, RegionSummary,
    RunMetadata, RunParameters, ToolInfo,
};
use crate::scan::{scan_region, ScanParams};
use crate::sequence::SequenceSource;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub paths: OutputPaths,
    pub feature_counts: BTreeMap<FeatureKind, usize>,
    pub total_features: usize,
    pub warnings: Vec<String>,
}

/// Scan, normalize and aggregate one window
///
/// Pure over its inputs: identical arguments give an identical set.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::coords::GenomicInterval;
/// use ferro_negfeat::feature::{FeatureKind, FeatureSelection};
/// use ferro_negfeat::flank::FlankedRegion;
/// use ferro_negfeat::pipeline::compute_negative_features;
///
/// let window = GenomicInterval::new(100, 112).unwrap();
/// let region = FlankedRegion::new("1", window, "ACGAAAAAACGT".to_string()).unwrap();
/// let selection = FeatureSelection::parse("homopolymer").unwrap();
/// let set = compute_negative_features(&region, &selection, &Default::default(), &Default::default(), &[]);
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.features()[0].kind, FeatureKind::Homopolymer);
/// assert_eq!((set.features()[0].start, set.features()[0].end), (103, 109));
/// ```
pub fn compute_negative_features(
    region: &FlankedRegion,
    selection: &FeatureSelection,
    scan: &ScanParams,
    normalize: &NormalizeParams,
    batches: &[AnnotationBatch],
) -> NegativeFeatureSet {
    let mut features = scan_region(region, selection, scan);
    if let Some(window) = region.interval() {
        for batch in batches {
            features.extend(normalize_batch(batch, window, normalize));
        }
    }
    aggregate(features, selection)
}

/// Fetch every enabled annotation kind
///
/// Offline, a provider that reports itself unavailable is skipped with a
/// warning; a cache miss or any online failure aborts the run.
fn fetch_batches<A: AnnotationProvider + ?Sized>(
    annotations: &A,
    query: &AnnotationQuery,
    config: &RunConfig,
    warnings: &mut Vec<String>,
) -> Result<Vec<AnnotationBatch>, NegFeatError> {
    let mut batches = Vec::new();
    for kind in config.features.iter().filter(|k| k.is_annotation()) {
        if kind == FeatureKind::Repeat && config.annotation.mask == MaskMode::None {
            log::debug!("mask=none, skipping repeat fetch");
            continue;
        }
        match annotations.fetch(kind, query) {
            Ok(batch) => batches.push(batch),
            Err(NegFeatError::ProviderUnavailable { provider, msg }) if config.client.offline => {
                let warning = format!("{} skipped offline: {} unavailable ({})", kind, provider, msg);
                log::warn!("{}", warning);
                warnings.push(warning);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(batches)
}

/// Run the full pipeline for one accession
///
/// # Errors
///
/// Returns the first unrecovered error. No output file exists afterwards
/// unless both were written.
pub fn run<R, S, A>(
    accession: &str,
    config: &RunConfig,
    resolver: &R,
    sequence: &S,
    annotations: &A,
) -> Result<RunSummary, NegFeatError>
where
    R: LocusResolver + ?Sized,
    S: SequenceSource + ?Sized,
    A: AnnotationProvider + ?Sized,
{
    let started = Instant::now();
    config.validate()?;

    let resolved = resolver.resolve(accession)?;
    let locus = resolved.locus;
    let mut warnings = resolved.warnings;

    let contig_length = sequence.contig_length(&locus.assembly, &locus.contig)?;
    let window = compute_window(&locus, &config.flank, contig_length)?;
    log::info!(
        "{}: window {}:{} ({} bp, {} flank {})",
        accession,
        locus.contig,
        window,
        window.len(),
        config.flank.mode,
        config.flank.flank_bp
    );
    let bases = sequence.fetch_sequence(&locus.assembly, &locus.contig, window)?;
    let region = FlankedRegion::new(locus.contig.clone(), window, bases)?;

    let query = AnnotationQuery {
        assembly: locus.assembly.clone(),
        contig: locus.contig.clone(),
        start: window.start(),
        end: window.end(),
        species: Some(
            locus
                .species
                .clone()
                .unwrap_or_else(|| config.sources.species.clone()),
        ),
    };
    let batches = fetch_batches(annotations, &query, config, &mut warnings)?;

    let features = compute_negative_features(
        &region,
        &config.features,
        &config.scan,
        &config.annotation,
        &batches,
    );
    let feature_counts = features.counts(&config.features);

    let paths = OutputPaths::new(
        &config.outdir,
        accession,
        &locus.assembly,
        &locus.contig,
        region.ext_start,
        region.ext_end,
    );
    let record = render_record(&RecordContext {
        accession,
        locus: &locus,
        region: &region,
        features: &features,
    })?;
    let metadata = RunMetadata {
        accession: accession.to_string(),
        assembly: locus.assembly.clone(),
        locus: locus.clone(),
        region: RegionSummary::from(&region),
        flank: config.flank,
        feature_counts: feature_counts.clone(),
        parameters: RunParameters {
            features: config.features.clone(),
            mask: config.annotation.mask,
            maf_threshold: config.annotation.maf_threshold,
            gc_window: config.scan.gc.window,
            gc_step: config.scan.gc.step,
            gc_min: config.scan.gc.gc_min,
            gc_max: config.scan.gc.gc_max,
            homopolymer_at: config.scan.homopolymer.at_threshold,
            homopolymer_gc: config.scan.homopolymer.gc_threshold,
            offline: config.client.offline,
        },
        provenance: batches.iter().map(|b| b.provenance.clone()).collect(),
        warnings: warnings.clone(),
        record_file: paths.record_file_name(),
        tool: ToolInfo::default(),
    };
    let metadata = render_metadata(&metadata)?;
    write_outputs(&paths, &record, &metadata)?;

    log::info!(
        "{}: {} negative features in {:.2?}",
        accession,
        features.len(),
        started.elapsed()
    );
    Ok(RunSummary {
        paths,
        total_features: features.len(),
        feature_counts,
        warnings,
    })
}
