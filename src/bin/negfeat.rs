// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! negfeat CLI
//!
//! Command-line interface for annotating negative features around the gene
//! that encodes a protein.

use clap::Parser;
use ferro_negfeat::annotation::MaskMode;
use ferro_negfeat::cli::{
    build_sources, normalize_accession, output_error, output_summary, OutputFormat,
};
use ferro_negfeat::config::{CliOverrides, RunConfig};
use ferro_negfeat::flank::FlankMode;
use ferro_negfeat::{pipeline, NegFeatError};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "negfeat")]
#[command(author, version, about = "Negative feature annotator for protein-coding loci")]
#[command(
    long_about = "Resolve a protein accession to its gene, extend the locus by a flank, and
write every region unsuitable for primer or oligo design as a GenBank record
with a JSON metadata sidecar.

Examples:
  negfeat P04637
  negfeat P04637 --flank 5000 --features repeat,homopolymer --mask hard
  negfeat P04637 --offline --cache-dir ~/.cache/negfeat
  negfeat P12345 --locus-json loci.json --fasta ref.fa --annotations-json ann.json"
)]
struct Cli {
    /// Protein accession (e.g., P04637)
    accession: String,

    /// Output directory
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Flank added on each side of the gene, in bases
    #[arg(long, allow_negative_numbers = true)]
    flank: Option<i64>,

    /// Flank orientation (genomic or strand_relative)
    #[arg(long)]
    flank_mode: Option<FlankMode>,

    /// Comma-separated feature kinds; an empty list disables all
    #[arg(long)]
    features: Option<String>,

    /// Masking policy (none, soft or hard)
    #[arg(long)]
    mask: Option<MaskMode>,

    /// Keep simple variants with minor allele frequency at or above this
    #[arg(long)]
    maf_threshold: Option<f64>,

    /// GC scan window size
    #[arg(long)]
    gc_window: Option<usize>,

    /// GC scan step
    #[arg(long)]
    gc_step: Option<usize>,

    /// Windows below this GC fraction are extreme
    #[arg(long)]
    gc_min: Option<f64>,

    /// Windows above this GC fraction are extreme
    #[arg(long)]
    gc_max: Option<f64>,

    /// Minimum A/T homopolymer run length
    #[arg(long)]
    homopolymer_at: Option<usize>,

    /// Minimum G/C homopolymer run length
    #[arg(long)]
    homopolymer_gc: Option<usize>,

    /// Answer every request from the response cache
    #[arg(long)]
    offline: bool,

    /// Configuration file (default: .negfeat.toml or ~/.config/negfeat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference FASTA used instead of the Ensembl sequence endpoint
    #[arg(long)]
    fasta: Option<PathBuf>,

    /// Response cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// HTTP retries after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// JSON locus table used instead of online resolution
    #[arg(long)]
    locus_json: Option<PathBuf>,

    /// JSON annotation fixture used instead of the Ensembl overlap endpoint
    #[arg(long)]
    annotations_json: Option<PathBuf>,

    /// Log level filter (e.g., info, debug, ferro_negfeat=trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Report format (text or json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            outdir: self.outdir.clone(),
            flank: self.flank,
            flank_mode: self.flank_mode,
            features: self.features.clone(),
            mask: self.mask,
            maf_threshold: self.maf_threshold,
            gc_window: self.gc_window,
            gc_step: self.gc_step,
            gc_min: self.gc_min,
            gc_max: self.gc_max,
            homopolymer_at: self.homopolymer_at,
            homopolymer_gc: self.homopolymer_gc,
            offline: self.offline,
            cache_dir: self.cache_dir.clone(),
            timeout_secs: self.timeout,
            retries: self.retries,
            fasta: self.fasta.clone(),
            locus_fixture: self.locus_json.clone(),
            annotation_fixture: self.annotations_json.clone(),
        }
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    debug!("Tracing initialized with level: {}", level);
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<RunConfig, NegFeatError> {
    let base = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::load().unwrap_or_default(),
    };
    let config = base.merge_with_cli(&cli.overrides())?;
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli, accession: &str) -> Result<pipeline::RunSummary, NegFeatError> {
    let config = resolve_config(cli)?;
    info!(
        "{}: features [{}], flank {} ({}), mask {}{}",
        accession,
        config.features,
        config.flank.flank_bp,
        config.flank.mode,
        config.annotation.mask,
        if config.client.offline { ", offline" } else { "" }
    );
    let sources = build_sources(&config)?;
    pipeline::run(
        accession,
        &config,
        sources.resolver.as_ref(),
        sources.sequence.as_ref(),
        sources.annotations.as_ref(),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let accession = normalize_accession(&cli.accession);
    match run(&cli, &accession) {
        Ok(summary) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            output_summary(&mut out, &accession, &summary, cli.format)?;
            out.flush()?;
            Ok(())
        }
        Err(err) => {
            let stderr = io::stderr();
            let mut out = stderr.lock();
            output_error(&mut out, &accession, &err, cli.format)?;
            out.flush()?;
            std::process::exit(err.exit_code());
        }
    }
}
