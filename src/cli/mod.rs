//! CLI utilities for ferro-negfeat
//!
//! This module provides testable functions used by the CLI binary:
//! input cleanup, collaborator selection and report formatting.

pub mod format;
pub mod sources;

pub use format::{output_error, output_summary, OutputFormat};
pub use sources::{build_sources, Sources};

/// UTF-8 BOM (Byte Order Mark) constant
const UTF8_BOM: &str = "\u{feff}";

/// Strip UTF-8 BOM from the beginning of a string if present.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::cli::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}P04637"), "P04637");
/// assert_eq!(strip_bom("P04637"), "P04637");
/// ```
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(UTF8_BOM).unwrap_or(s)
}

/// Clean an accession as typed or pasted: BOM, whitespace, case
///
/// # Examples
///
/// ```
/// use ferro_negfeat::cli::normalize_accession;
///
/// assert_eq!(normalize_accession(" p04637\n"), "P04637");
/// assert_eq!(normalize_accession("\u{feff}Q9Y6K9-2"), "Q9Y6K9-2");
/// ```
pub fn normalize_accession(raw: &str) -> String {
    strip_bom(raw).trim().to_ascii_uppercase()
}
