//! Output artifacts
//!
//! A run produces exactly two files sharing one basename:
//!
//! - `{basename}.negfeatures.gb`: the annotated window ([`genbank`])
//! - `{basename}.metadata.json`: the run descriptor ([`metadata`])
//!
//! Both are rendered in memory first. [`write_outputs`] stages them as
//! temporary files in the output directory and renames them into place. If
//! the sidecar cannot be placed, the record and any older sidecar are
//! removed, so a failed run never leaves an unpaired file behind.

pub mod genbank;
pub mod metadata;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::NegFeatError;

pub use genbank::{build_record, render_record, RecordContext};
pub use metadata::{render_metadata, RegionSummary, RunMetadata, RunParameters, ToolInfo};

/// Extension of the GenBank record
pub const RECORD_EXTENSION: &str = "negfeatures.gb";

/// Extension of the metadata sidecar
pub const METADATA_EXTENSION: &str = "metadata.json";

/// Replace characters that are unsafe in file names with `_`
///
/// ```
/// use ferro_negfeat::output::sanitize_component;
///
/// assert_eq!(sanitize_component("GRCh38.p14"), "GRCh38_p14");
/// assert_eq!(sanitize_component("HSCHR6_MHC/COX"), "HSCHR6_MHC_COX");
/// ```
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Paths of the two output files for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub basename: String,
    pub record: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPaths {
    /// `{accession}.{assembly}.{contig}_{ext_start}_{ext_end}` in `outdir`
    ///
    /// Window coordinates are 0-based half-open.
    ///
    /// ```
    /// use ferro_negfeat::output::OutputPaths;
    ///
    /// let paths = OutputPaths::new("out", "P04637", "GRCh38", "17", 7651778, 7697538);
    /// assert_eq!(paths.basename, "P04637.GRCh38.17_7651778_7697538");
    /// assert!(paths.record.ends_with("P04637.GRCh38.17_7651778_7697538.negfeatures.gb"));
    /// ```
    pub fn new(
        outdir: impl AsRef<Path>,
        accession: &str,
        assembly: &str,
        contig: &str,
        ext_start: u64,
        ext_end: u64,
    ) -> Self {
        let accession: String = accession
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let basename = format!(
            "{}.{}.{}_{}_{}",
            accession,
            sanitize_component(assembly),
            sanitize_component(contig),
            ext_start,
            ext_end
        );
        let outdir = outdir.as_ref();
        Self {
            record: outdir.join(format!("{}.{}", basename, RECORD_EXTENSION)),
            metadata: outdir.join(format!("{}.{}", basename, METADATA_EXTENSION)),
            basename,
        }
    }

    /// File name of the record, without directory
    pub fn record_file_name(&self) -> String {
        format!("{}.{}", self.basename, RECORD_EXTENSION)
    }
}

fn output_error(path: &Path, err: impl std::fmt::Display) -> NegFeatError {
    NegFeatError::Serialization {
        msg: format!("failed to write {}: {}", path.display(), err),
    }
}

fn stage(dir: &Path, target: &Path, bytes: &[u8]) -> Result<NamedTempFile, NegFeatError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| output_error(target, e))?;
    tmp.write_all(bytes).map_err(|e| output_error(target, e))?;
    tmp.as_file().sync_all().map_err(|e| output_error(target, e))?;
    Ok(tmp)
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
    }
}

/// Move two staged files into place, record first
///
/// A sidecar that fails to land takes the record with it, along with any
/// sidecar left at the target by an earlier run.
fn commit(
    paths: &OutputPaths,
    record: NamedTempFile,
    metadata: NamedTempFile,
) -> Result<(), NegFeatError> {
    record
        .persist(&paths.record)
        .map_err(|e| output_error(&paths.record, e.error))?;
    if let Err(e) = metadata.persist(&paths.metadata) {
        discard(&paths.record);
        discard(&paths.metadata);
        return Err(output_error(&paths.metadata, e.error));
    }
    Ok(())
}

/// Write both artifacts, or neither
///
/// Both files are staged and synced in the output directory before either
/// is renamed into place. If the sidecar rename then fails, the record and
/// any stale sidecar are removed before the error is returned.
pub fn write_outputs(
    paths: &OutputPaths,
    record: &[u8],
    metadata: &[u8],
) -> Result<(), NegFeatError> {
    let dir = paths
        .record
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| output_error(dir, e))?;

    let staged_record = stage(dir, &paths.record, record)?;
    let staged_metadata = stage(dir, &paths.metadata, metadata)?;
    commit(paths, staged_record, staged_metadata)?;
    log::info!("wrote {}", paths.record.display());
    log::info!("wrote {}", paths.metadata.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_sanitize_components() {
        let paths = OutputPaths::new("/tmp/x", "P04637-2", "GRCh38.p14", "HSCHR17/1", 0, 10);
        assert_eq!(paths.basename, "P04637-2.GRCh38_p14.HSCHR17_1_0_10");
        assert_eq!(paths.metadata, Path::new("/tmp/x/P04637-2.GRCh38_p14.HSCHR17_1_0_10.metadata.json"));
    }

    #[test]
    fn test_write_outputs_creates_both() {
        let dir = TempDir::new().unwrap();
        let outdir = dir.path().join("nested");
        let paths = OutputPaths::new(&outdir, "P1", "GRCh38", "1", 0, 4);
        write_outputs(&paths, b"LOCUS\n", b"{}\n").unwrap();
        assert_eq!(fs::read(&paths.record).unwrap(), b"LOCUS\n");
        assert_eq!(fs::read(&paths.metadata).unwrap(), b"{}\n");
        let leftovers = fs::read_dir(&outdir).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_failed_metadata_removes_record() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::new(dir.path(), "P1", "GRCh38", "1", 0, 4);
        // A directory in the sidecar's place makes the rename fail
        fs::create_dir(&paths.metadata).unwrap();
        let err = write_outputs(&paths, b"LOCUS\n", b"{}\n").unwrap_err();
        assert!(matches!(err, NegFeatError::Serialization { .. }));
        assert!(!paths.record.exists());
    }

    #[test]
    fn test_failed_rerun_leaves_no_stale_sidecar() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::new(dir.path(), "P1", "GRCh38", "1", 0, 4);
        write_outputs(&paths, b"LOCUS old\n", b"{\"old\":true}\n").unwrap();

        let record = stage(dir.path(), &paths.record, b"LOCUS new\n").unwrap();
        let metadata = stage(dir.path(), &paths.metadata, b"{}\n").unwrap();
        // Pull the staged sidecar out from under the rename
        fs::remove_file(metadata.path()).unwrap();

        let err = commit(&paths, record, metadata).unwrap_err();
        assert!(matches!(err, NegFeatError::Serialization { .. }));
        assert!(!paths.record.exists());
        assert!(!paths.metadata.exists());
    }

    #[test]
    fn test_rerun_replaces_both_files() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::new(dir.path(), "P1", "GRCh38", "1", 0, 4);
        write_outputs(&paths, b"LOCUS old\n", b"{\"old\":true}\n").unwrap();
        write_outputs(&paths, b"LOCUS new\n", b"{}\n").unwrap();
        assert_eq!(fs::read(&paths.record).unwrap(), b"LOCUS new\n");
        assert_eq!(fs::read(&paths.metadata).unwrap(), b"{}\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
