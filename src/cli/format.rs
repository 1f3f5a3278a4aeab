//! Output formatting utilities for CLI operations

use serde_json::json;
use std::io::{self, Write};
use std::str::FromStr;

use crate::error::NegFeatError;
use crate::pipeline::RunSummary;

/// Output format for the run report printed on stdout/stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    /// Parse an output format from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use ferro_negfeat::cli::OutputFormat;
    /// use std::str::FromStr;
    ///
    /// assert!(matches!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json));
    /// assert!(matches!(OutputFormat::from_str("anything").unwrap(), OutputFormat::Text));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        })
    }
}

/// Write the summary of a successful run
pub fn output_summary<W: Write>(
    writer: &mut W,
    accession: &str,
    summary: &RunSummary,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = summary
                .feature_counts
                .iter()
                .map(|(kind, count)| (kind.to_string(), json!(count)))
                .collect();
            let value = json!({
                "accession": accession,
                "status": "ok",
                "record": summary.paths.record.display().to_string(),
                "metadata": summary.paths.metadata.display().to_string(),
                "features": summary.total_features,
                "feature_counts": counts,
                "warnings": summary.warnings,
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => {
            writeln!(writer, "{}: {} negative features", accession, summary.total_features)?;
            for (kind, count) in &summary.feature_counts {
                writeln!(writer, "  {:<20} {}", kind, count)?;
            }
            for warning in &summary.warnings {
                writeln!(writer, "  warning: {}", warning)?;
            }
            writeln!(writer, "  record:   {}", summary.paths.record.display())?;
            writeln!(writer, "  metadata: {}", summary.paths.metadata.display())
        }
    }
}

/// Write an error to the output
///
/// # Examples
///
/// ```
/// use ferro_negfeat::cli::{output_error, OutputFormat};
/// use ferro_negfeat::NegFeatError;
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// let error = NegFeatError::CacheMiss { key: "https://rest.ensembl.org/x".to_string() };
/// output_error(&mut buffer, "P04637", &error, OutputFormat::Text).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(result.contains("ERROR [E4002]: P04637"));
/// ```
pub fn output_error<W: Write>(
    writer: &mut W,
    input: &str,
    error: &NegFeatError,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "accession": input,
                "status": "error",
                "code": error.code().as_str(),
                "error": error.to_string(),
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => {
            writeln!(writer, "ERROR [{}]: {} - {}", error.code(), input, error)
        }
    }
}
