//! Configuration file support for ferro-negfeat.
//!
//! Run settings can come from a TOML file and from command-line flags.
//! Every section and key is optional; missing values keep their defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! outdir = "results"
//! features = ["repeat", "simple_variant", "homopolymer"]
//!
//! [flank]
//! flank_bp = 5000
//! mode = "strand_relative"
//!
//! [annotation]
//! mask = "hard"
//! maf_threshold = 0.05
//!
//! [scan.gc]
//! window = 100
//! step = 20
//!
//! [client]
//! cache_dir = "~/.cache/negfeat"
//! retries = 3
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.negfeat.toml` in current directory
//! 2. `~/.config/negfeat/config.toml`
//!
//! CLI flags take precedence over config file settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotation::{MaskMode, NormalizeParams};
use crate::ensembl::{ClientConfig, DEFAULT_SPECIES};
use crate::error::NegFeatError;
use crate::feature::FeatureSelection;
use crate::flank::{FlankConfig, FlankMode};
use crate::scan::ScanParams;

/// Where locus, sequence and annotations come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local FASTA used instead of the Ensembl sequence endpoint
    pub fasta: Option<PathBuf>,
    /// JSON locus table used instead of online resolution
    pub locus_fixture: Option<PathBuf>,
    /// JSON annotation fixture used instead of the Ensembl overlap endpoint
    pub annotation_fixture: Option<PathBuf>,
    pub species: String,
    /// Ensembl REST root, for mirrors
    pub ensembl_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fasta: None,
            locus_fixture: None,
            annotation_fixture: None,
            species: DEFAULT_SPECIES.to_string(),
            ensembl_url: None,
        }
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub outdir: PathBuf,
    pub features: FeatureSelection,
    pub flank: FlankConfig,
    pub annotation: NormalizeParams,
    pub scan: ScanParams,
    pub client: ClientConfig,
    pub sources: SourceConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            features: FeatureSelection::default(),
            flank: FlankConfig::default(),
            annotation: NormalizeParams::default(),
            scan: ScanParams::default(),
            client: ClientConfig::default(),
            sources: SourceConfig::default(),
        }
    }
}

/// Values given on the command line; `None` keeps the file or default value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub outdir: Option<PathBuf>,
    /// Signed so negative input is reported instead of rejected by the parser
    pub flank: Option<i64>,
    pub flank_mode: Option<FlankMode>,
    /// Raw comma-separated list; empty enables nothing
    pub features: Option<String>,
    pub mask: Option<MaskMode>,
    pub maf_threshold: Option<f64>,
    pub gc_window: Option<usize>,
    pub gc_step: Option<usize>,
    pub gc_min: Option<f64>,
    pub gc_max: Option<f64>,
    pub homopolymer_at: Option<usize>,
    pub homopolymer_gc: Option<usize>,
    pub offline: bool,
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub fasta: Option<PathBuf>,
    pub locus_fixture: Option<PathBuf>,
    pub annotation_fixture: Option<PathBuf>,
}

impl RunConfig {
    /// Load configuration from the default locations.
    ///
    /// Searches for config in:
    /// 1. `.negfeat.toml` in current directory
    /// 2. `~/.config/negfeat/config.toml`
    ///
    /// Unreadable files are skipped with a warning.
    pub fn load() -> Option<Self> {
        let mut candidates = vec![PathBuf::from(".negfeat.toml")];
        if let Some(home) = dirs_home() {
            candidates.push(home.join(".config").join("negfeat").join("config.toml"));
        }
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    log::debug!("loaded configuration from {}", path.display());
                    return Some(config);
                }
                Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
            }
        }
        None
    }

    /// Load configuration from a specific path.
    pub fn from_file(path: &Path) -> Result<Self, NegFeatError> {
        let content = fs::read_to_string(path).map_err(|e| NegFeatError::Config {
            msg: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self, NegFeatError> {
        let mut config: RunConfig = toml::from_str(content)?;
        config.client.cache_dir = config.client.cache_dir.map(expand_home);
        config.sources.fasta = config.sources.fasta.map(expand_home);
        Ok(config)
    }

    /// Merge CLI values over this config.
    /// CLI arguments take precedence.
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Result<Self, NegFeatError> {
        if let Some(outdir) = &cli.outdir {
            self.outdir = outdir.clone();
        }
        if let Some(flank) = cli.flank {
            self.flank.flank_bp = u64::try_from(flank).map_err(|_| {
                NegFeatError::invalid_parameter("flank", format!("{} is negative", flank))
            })?;
        }
        if let Some(mode) = cli.flank_mode {
            self.flank.mode = mode;
        }
        if let Some(features) = &cli.features {
            self.features = FeatureSelection::parse(features)?;
        }
        if let Some(mask) = cli.mask {
            self.annotation.mask = mask;
        }
        if let Some(maf) = cli.maf_threshold {
            self.annotation.maf_threshold = maf;
        }

        let gc = &mut self.scan.gc;
        gc.window = cli.gc_window.unwrap_or(gc.window);
        gc.step = cli.gc_step.unwrap_or(gc.step);
        gc.gc_min = cli.gc_min.unwrap_or(gc.gc_min);
        gc.gc_max = cli.gc_max.unwrap_or(gc.gc_max);
        let homopolymer = &mut self.scan.homopolymer;
        homopolymer.at_threshold = cli.homopolymer_at.unwrap_or(homopolymer.at_threshold);
        homopolymer.gc_threshold = cli.homopolymer_gc.unwrap_or(homopolymer.gc_threshold);

        self.client.offline |= cli.offline;
        if let Some(dir) = &cli.cache_dir {
            self.client.cache_dir = Some(dir.clone());
        }
        if let Some(timeout) = cli.timeout_secs {
            self.client.timeout_secs = timeout;
        }
        if let Some(retries) = cli.retries {
            self.client.retries = retries;
        }
        if let Some(fasta) = &cli.fasta {
            self.sources.fasta = Some(fasta.clone());
        }
        if let Some(path) = &cli.locus_fixture {
            self.sources.locus_fixture = Some(path.clone());
        }
        if let Some(path) = &cli.annotation_fixture {
            self.sources.annotation_fixture = Some(path.clone());
        }
        Ok(self)
    }

    /// Check every parameter before any data is fetched
    pub fn validate(&self) -> Result<(), NegFeatError> {
        self.annotation.validate()?;
        self.scan.validate()?;
        self.client.validate()?;
        if self.sources.species.trim().is_empty() {
            return Err(NegFeatError::invalid_parameter("species", "must not be empty"));
        }
        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Expand a leading `~/`
fn expand_home(path: PathBuf) -> PathBuf {
    match (path.strip_prefix("~"), dirs_home()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_config() {
        let config = RunConfig::parse("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.flank.flank_bp, 10_000);
        assert_eq!(config.features.len(), 6);
    }

    #[test]
    fn test_parse_sections() {
        let config = RunConfig::parse(
            r#"
features = ["repeat", "homopolymer"]

[flank]
flank_bp = 500
mode = "strand_relative"

[annotation]
mask = "hard"

[scan.gc]
window = 100
"#,
        )
        .unwrap();
        assert_eq!(config.flank.flank_bp, 500);
        assert_eq!(config.flank.mode, FlankMode::StrandRelative);
        assert_eq!(config.annotation.mask, MaskMode::Hard);
        assert_eq!(config.annotation.maf_threshold, 0.01);
        assert_eq!(config.scan.gc.window, 100);
        assert_eq!(config.scan.gc.step, 10);
        assert!(config.features.contains(FeatureKind::Homopolymer));
        assert!(!config.features.contains(FeatureKind::Ambiguous));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let err = RunConfig::parse("flnak = 3").unwrap_err();
        assert!(matches!(err, NegFeatError::Config { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(RunConfig::parse(r#"features = ["cpg_island"]"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[client]\nretries = 1\ntimeout_secs = 5").unwrap();
        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client.retries, 1);
        assert_eq!(config.client.timeout_secs, 5);
    }

    #[test]
    fn test_cli_overrides_file() {
        let config = RunConfig::parse("[flank]\nflank_bp = 500").unwrap();
        let cli = CliOverrides {
            flank: Some(20),
            features: Some("ambiguous".to_string()),
            gc_min: Some(0.2),
            offline: true,
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            ..CliOverrides::default()
        };
        let merged = config.merge_with_cli(&cli).unwrap();
        assert_eq!(merged.flank.flank_bp, 20);
        assert_eq!(merged.features.len(), 1);
        assert_eq!(merged.scan.gc.gc_min, 0.2);
        assert_eq!(merged.scan.gc.gc_max, 0.7);
        assert!(merged.client.offline);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_negative_flank_rejected() {
        let cli = CliOverrides {
            flank: Some(-1),
            ..CliOverrides::default()
        };
        let err = RunConfig::default().merge_with_cli(&cli).unwrap_err();
        assert!(matches!(err, NegFeatError::InvalidParameter { ref name, .. } if name == "flank"));
    }

    #[test]
    fn test_empty_feature_list_enables_nothing() {
        let cli = CliOverrides {
            features: Some(String::new()),
            ..CliOverrides::default()
        };
        let merged = RunConfig::default().merge_with_cli(&cli).unwrap();
        assert!(merged.features.is_empty());
    }

    #[test]
    fn test_validate_catches_bad_ranges() {
        let mut config = RunConfig::default();
        config.annotation.maf_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.scan.gc.gc_min = 0.8;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.client.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
