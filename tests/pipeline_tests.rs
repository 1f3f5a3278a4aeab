//! Integration tests for the full pipeline
//!
//! Runs go through the fixture collaborators in `tests/fixtures`: a 300 bp
//! synthetic contig, a locus table and a one-based annotation fixture.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferro_negfeat::cli::build_sources;
use ferro_negfeat::config::RunConfig;
use ferro_negfeat::ensembl::{ClientConfig, EnsemblAnnotationProvider, HttpClient};
use ferro_negfeat::{
    run, FeatureKind, FeatureSelection, FlankMode, MaskMode, NegFeatError, RunSummary,
};
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_config(outdir: &Path) -> RunConfig {
    let mut config = RunConfig {
        outdir: outdir.to_path_buf(),
        ..RunConfig::default()
    };
    config.flank.flank_bp = 100;
    config.sources.fasta = Some(fixture("ref.fa"));
    config.sources.locus_fixture = Some(fixture("loci.json"));
    config.sources.annotation_fixture = Some(fixture("annotations.json"));
    config
}

fn run_fixture(accession: &str, config: &RunConfig) -> Result<RunSummary, NegFeatError> {
    let sources = build_sources(config)?;
    run(
        accession,
        config,
        sources.resolver.as_ref(),
        sources.sequence.as_ref(),
        sources.annotations.as_ref(),
    )
}

fn metadata(summary: &RunSummary) -> Value {
    serde_json::from_slice(&fs::read(&summary.paths.metadata).unwrap()).unwrap()
}

fn record_text(summary: &RunSummary) -> String {
    fs::read_to_string(&summary.paths.record).unwrap()
}

#[test]
fn test_fixture_run_finds_every_kind() {
    let dir = TempDir::new().unwrap();
    let summary = run_fixture("P12345", &fixture_config(dir.path())).unwrap();

    assert_eq!(summary.paths.basename, "P12345.GRCh38.1_20_280");
    let counts = &summary.feature_counts;
    assert_eq!(counts[&FeatureKind::Repeat], 1);
    // rs2 falls below the threshold and rs4 carries no frequency
    assert_eq!(counts[&FeatureKind::SimpleVariant], 2);
    assert_eq!(counts[&FeatureKind::StructuralVariant], 1);
    assert_eq!(counts[&FeatureKind::Homopolymer], 1);
    assert_eq!(counts[&FeatureKind::Ambiguous], 1);
    assert!(counts[&FeatureKind::ExtremeGc] >= 1);
    assert!(summary.warnings.is_empty());
}

#[test]
fn test_metadata_describes_the_run() {
    let dir = TempDir::new().unwrap();
    let summary = run_fixture("P12345", &fixture_config(dir.path())).unwrap();
    let meta = metadata(&summary);

    assert_eq!(meta["accession"], "P12345");
    assert_eq!(meta["assembly"], "GRCh38");
    assert_eq!(meta["region"]["ext_start"], 20);
    assert_eq!(meta["region"]["ext_end"], 280);
    assert_eq!(meta["region"]["length"], 260);
    assert_eq!(meta["locus"]["strand"], "-");
    assert_eq!(meta["feature_counts"]["simple_variant"], 2);
    assert_eq!(meta["parameters"]["mask"], "soft");
    assert_eq!(meta["record_file"], "P12345.GRCh38.1_20_280.negfeatures.gb");

    let provenance = meta["provenance"].as_array().unwrap();
    assert_eq!(provenance.len(), 3);
    assert!(provenance.iter().all(|p| p["dataset"] == "fixture-1"));
}

#[test]
fn test_record_layout() {
    let dir = TempDir::new().unwrap();
    let summary = run_fixture("P12345", &fixture_config(dir.path())).unwrap();
    let text = record_text(&summary);

    assert!(text.starts_with("LOCUS"));
    assert!(text.contains("/organism=\"Homo sapiens\""));
    assert!(text.contains("/db_xref=\"UniProtKB:P12345\""));
    assert!(text.contains("/db_xref=\"Ensembl:ENSG00000000001\""));
    // Gene 120..180 on the minus strand, relative to a window starting at 20
    assert!(text.contains("complement(101..160)"));
    assert!(text.contains("/db_xref=\"dbSNP:rs1\""));
    assert!(text.contains("/db_xref=\"dbSNP:rs3\""));
    assert!(!text.contains("rs2"));
    // Structural variant 271..350 clipped at the window end
    assert!(text.contains("251..260"));
    assert!(text.trim_end().ends_with("//"));
}

#[test]
fn test_runs_are_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = run_fixture("P12345", &fixture_config(first.path())).unwrap();
    let b = run_fixture("P12345", &fixture_config(second.path())).unwrap();

    assert_eq!(a.paths.basename, b.paths.basename);
    assert_eq!(fs::read(&a.paths.record).unwrap(), fs::read(&b.paths.record).unwrap());
    assert_eq!(
        fs::read(&a.paths.metadata).unwrap(),
        fs::read(&b.paths.metadata).unwrap()
    );
}

#[test]
fn test_empty_selection_writes_bare_record() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture_config(dir.path());
    config.features = FeatureSelection::none();

    let summary = run_fixture("P12345", &config).unwrap();
    assert_eq!(summary.total_features, 0);
    assert!(summary.feature_counts.is_empty());
    let text = record_text(&summary);
    assert!(text.contains("source"));
    assert!(!text.contains("negfeat_kind"));
}

#[test]
fn test_mask_modes() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture_config(dir.path());
    config.features = FeatureSelection::parse("repeat").unwrap();

    config.annotation.mask = MaskMode::Soft;
    let soft = run_fixture("P12345", &config).unwrap();
    assert_eq!(soft.feature_counts[&FeatureKind::Repeat], 1);
    assert!(!record_text(&soft).contains("/exclude"));

    config.annotation.mask = MaskMode::Hard;
    let hard = run_fixture("P12345", &config).unwrap();
    assert_eq!(hard.feature_counts[&FeatureKind::Repeat], 1);
    assert!(record_text(&hard).contains("/exclude=\"true\""));

    config.annotation.mask = MaskMode::None;
    let none = run_fixture("P12345", &config).unwrap();
    assert_eq!(none.feature_counts[&FeatureKind::Repeat], 0);
}

#[test]
fn test_maf_threshold_is_inclusive() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture_config(dir.path());
    config.features = FeatureSelection::parse("simple_variant").unwrap();

    config.annotation.maf_threshold = 0.2;
    let summary = run_fixture("P12345", &config).unwrap();
    assert_eq!(summary.feature_counts[&FeatureKind::SimpleVariant], 1);

    config.annotation.maf_threshold = 0.0;
    let summary = run_fixture("P12345", &config).unwrap();
    assert_eq!(summary.feature_counts[&FeatureKind::SimpleVariant], 3);
}

#[test]
fn test_window_clamped_at_contig_start() {
    let dir = TempDir::new().unwrap();
    let summary = run_fixture("Q99999", &fixture_config(dir.path())).unwrap();
    assert_eq!(summary.paths.basename, "Q99999.GRCh38.1_0_140");
}

#[test]
fn test_strand_relative_symmetric_flank_matches_genomic() {
    let genomic_dir = TempDir::new().unwrap();
    let relative_dir = TempDir::new().unwrap();
    let genomic = run_fixture("P12345", &fixture_config(genomic_dir.path())).unwrap();

    let mut config = fixture_config(relative_dir.path());
    config.flank.mode = FlankMode::StrandRelative;
    let relative = run_fixture("P12345", &config).unwrap();

    assert_eq!(genomic.paths.basename, relative.paths.basename);
    assert_eq!(genomic.feature_counts, relative.feature_counts);
}

#[test]
fn test_unknown_accession_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let err = run_fixture("O00000", &fixture_config(dir.path())).unwrap_err();
    assert!(matches!(err, NegFeatError::LocusUnresolved { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_offline_cache_miss_aborts_without_outputs() {
    let outdir = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let mut config = fixture_config(outdir.path());
    config.client = ClientConfig {
        offline: true,
        cache_dir: Some(cache.path().to_path_buf()),
        ..ClientConfig::default()
    };

    let sources = build_sources(&config).unwrap();
    let client = Arc::new(HttpClient::new(config.client.clone()).unwrap());
    let annotations = EnsemblAnnotationProvider::new(client);

    let err = run(
        "P12345",
        &config,
        sources.resolver.as_ref(),
        sources.sequence.as_ref(),
        &annotations,
    )
    .unwrap_err();
    assert!(matches!(err, NegFeatError::CacheMiss { .. }));
    assert_eq!(fs::read_dir(outdir.path()).unwrap().count(), 0);
}

#[test]
fn test_sequence_only_run_needs_no_annotations() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture_config(dir.path());
    config.sources.annotation_fixture = None;
    config.client.offline = true;
    config.features = FeatureSelection::parse("homopolymer,ambiguous,extreme_gc").unwrap();

    let summary = run_fixture("P12345", &config).unwrap();
    assert_eq!(summary.feature_counts.len(), 3);
    assert!(!summary.feature_counts.contains_key(&FeatureKind::Repeat));
}
