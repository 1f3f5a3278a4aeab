//! Local FASTA sequence source
//!
//! Random access into an uncompressed FASTA file through a `.fai` index.
//! When no index sits next to the file, one is built by scanning it once.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::coords::GenomicInterval;
use crate::error::NegFeatError;
use crate::sequence::SequenceSource;

/// One `.fai` line
#[derive(Debug, Clone, PartialEq, Eq)]
struct FaiEntry {
    length: u64,
    /// Byte offset of the first base
    offset: u64,
    line_bases: u64,
    /// Bytes per line including the newline
    line_bytes: u64,
}

/// Sequence source over an indexed FASTA file
///
/// Contig names are matched exactly first, then with a `chr` prefix added
/// or removed, so Ensembl-style names (`17`, `MT`) resolve against UCSC-style
/// references (`chr17`, `chrM`) and back.
#[derive(Debug, Clone)]
pub struct FastaSequenceSource {
    path: PathBuf,
    index: HashMap<String, FaiEntry>,
}

impl FastaSequenceSource {
    /// Open a FASTA file, loading `<path>.fai` or building the index
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is gzip-compressed, or
    /// its index is malformed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, NegFeatError> {
        let path = path.as_ref().to_path_buf();
        if is_gzip(&path)? {
            return Err(NegFeatError::Io {
                msg: format!(
                    "{} is gzip-compressed; decompress it first (e.g., 'gunzip {}')",
                    path.display(),
                    path.display()
                ),
            });
        }

        let fai_path = PathBuf::from(format!("{}.fai", path.display()));
        let index = if fai_path.exists() {
            log::debug!("loading FASTA index {}", fai_path.display());
            read_fai(&fai_path)?
        } else {
            log::debug!("no index for {}, scanning", path.display());
            scan_fasta(&path)?
        };
        Ok(Self { path, index })
    }

    /// Contig names present in the file
    pub fn contig_names(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    fn resolve(&self, contig: &str) -> Result<&FaiEntry, NegFeatError> {
        let candidates = [
            contig.to_string(),
            match contig.strip_prefix("chr") {
                Some(bare) => bare.to_string(),
                None => format!("chr{}", contig),
            },
            match contig {
                "MT" => "chrM".to_string(),
                "chrM" => "MT".to_string(),
                other => other.to_string(),
            },
        ];
        candidates
            .iter()
            .find_map(|name| self.index.get(name))
            .ok_or_else(|| {
                NegFeatError::provider(
                    "fasta",
                    format!("contig {} not found in {}", contig, self.path.display()),
                )
            })
    }

    fn read_window(&self, entry: &FaiEntry, window: GenomicInterval) -> Result<String, NegFeatError> {
        let first_line = window.start() / entry.line_bases;
        let column = window.start() % entry.line_bases;
        let file_offset = entry.offset + first_line * entry.line_bytes + column;
        let wanted = window.len();
        let lines = (wanted + column).div_ceil(entry.line_bases);
        let newline_bytes = entry.line_bytes - entry.line_bases;
        let to_read = wanted + lines * newline_bytes;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(file_offset))?;
        let mut buffer = Vec::with_capacity(to_read as usize);
        file.take(to_read).read_to_end(&mut buffer)?;

        let sequence: String = buffer
            .iter()
            .filter(|&&b| b != b'\n' && b != b'\r')
            .take(wanted as usize)
            .map(|&b| b as char)
            .collect();
        Ok(sequence)
    }
}

impl SequenceSource for FastaSequenceSource {
    fn name(&self) -> &str {
        "fasta"
    }

    fn contig_length(&self, _assembly: &str, contig: &str) -> Result<u64, NegFeatError> {
        Ok(self.resolve(contig)?.length)
    }

    fn fetch_sequence(
        &self,
        _assembly: &str,
        contig: &str,
        window: GenomicInterval,
    ) -> Result<String, NegFeatError> {
        let entry = self.resolve(contig)?;
        if window.end() > entry.length {
            return Err(NegFeatError::provider(
                "fasta",
                format!(
                    "{} extends past the end of {} ({} bases)",
                    window, contig, entry.length
                ),
            ));
        }
        self.read_window(entry, window)
    }
}

fn read_fai(path: &Path) -> Result<HashMap<String, FaiEntry>, NegFeatError> {
    let reader = BufReader::new(File::open(path)?);
    let mut index = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            continue;
        }
        let parse = |value: &str, what: &str| -> Result<u64, NegFeatError> {
            value.parse().map_err(|_| NegFeatError::Io {
                msg: format!("invalid {} '{}' in {} for {}", what, value, path.display(), fields[0]),
            })
        };
        let entry = FaiEntry {
            length: parse(fields[1], "length")?,
            offset: parse(fields[2], "offset")?,
            line_bases: parse(fields[3], "line_bases")?,
            line_bytes: parse(fields[4], "line_bytes")?,
        };
        if entry.line_bases == 0 || entry.line_bytes < entry.line_bases {
            return Err(NegFeatError::Io {
                msg: format!(
                    "invalid line layout for {} in {}: {} bases / {} bytes",
                    fields[0],
                    path.display(),
                    entry.line_bases,
                    entry.line_bytes
                ),
            });
        }
        index.insert(fields[0].to_string(), entry);
    }
    Ok(index)
}

fn scan_fasta(path: &Path) -> Result<HashMap<String, FaiEntry>, NegFeatError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut index = HashMap::new();
    let mut current: Option<(String, FaiEntry)> = None;
    let mut position = 0u64;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line)? as u64;
        if read == 0 {
            break;
        }
        let line_start = position;
        position += read;

        if let Some(header) = line.strip_prefix('>') {
            if let Some((name, entry)) = current.take() {
                index.insert(name, entry);
            }
            let name = header.split_whitespace().next().unwrap_or_default().to_string();
            current = Some((
                name,
                FaiEntry {
                    length: 0,
                    offset: position,
                    line_bases: 0,
                    line_bytes: 0,
                },
            ));
        } else if let Some((_, entry)) = current.as_mut() {
            let bases = line.trim_end().len() as u64;
            if entry.line_bases == 0 && bases > 0 {
                entry.offset = line_start;
                entry.line_bases = bases;
                entry.line_bytes = read;
            }
            entry.length += bases;
        }
    }
    if let Some((name, entry)) = current {
        index.insert(name, entry);
    }
    Ok(index)
}

/// Gzip files start with 0x1f 0x8b
fn is_gzip(path: &Path) -> Result<bool, NegFeatError> {
    let mut magic = [0u8; 2];
    match File::open(path)?.read_exact(&mut magic) {
        Ok(()) => Ok(magic == [0x1f, 0x8b]),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fasta(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("ref.fa");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_scan_and_fetch_across_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">chr1 test\nACGTA\nCGTAC\nGT\n>chr2\nTTTT\n");
        let source = FastaSequenceSource::new(&path).unwrap();

        assert_eq!(source.contig_length("GRCh38", "chr1").unwrap(), 12);
        assert_eq!(source.contig_length("GRCh38", "chr2").unwrap(), 4);
        let window = GenomicInterval::new(3, 9).unwrap();
        assert_eq!(source.fetch_sequence("GRCh38", "chr1", window).unwrap(), "TACGTA");
    }

    #[test]
    fn test_chr_prefix_alias() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">chr17\nACGT\n>MT\nGGGG\n");
        let source = FastaSequenceSource::new(&path).unwrap();
        assert_eq!(source.contig_length("GRCh38", "17").unwrap(), 4);
        assert_eq!(source.contig_length("GRCh38", "chrM").unwrap(), 4);
        assert!(source.contig_length("GRCh38", "18").is_err());
    }

    #[test]
    fn test_existing_fai_is_used() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">1\nACGTACGT\nAAAA\n");
        std::fs::write(dir.path().join("ref.fa.fai"), "1\t12\t3\t8\t9\n").unwrap();
        let source = FastaSequenceSource::new(&path).unwrap();
        let window = GenomicInterval::new(6, 12).unwrap();
        assert_eq!(source.fetch_sequence("GRCh38", "1", window).unwrap(), "GTAAAA");
    }

    #[test]
    fn test_crlf_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">1\r\nACG\r\nTAC\r\n");
        let source = FastaSequenceSource::new(&path).unwrap();
        let window = GenomicInterval::new(1, 5).unwrap();
        assert_eq!(source.fetch_sequence("GRCh38", "1", window).unwrap(), "CGTA");
    }

    #[test]
    fn test_window_past_end_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">1\nACGT\n");
        let source = FastaSequenceSource::new(&path).unwrap();
        let window = GenomicInterval::new(2, 8).unwrap();
        assert!(source.fetch_sequence("GRCh38", "1", window).is_err());
    }

    #[test]
    fn test_gzip_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.fa.gz");
        std::fs::write(&path, [0x1f, 0x8b, 0x08, 0x00]).unwrap();
        let err = FastaSequenceSource::new(&path).unwrap_err();
        assert!(err.to_string().contains("gzip"));
    }

    #[test]
    fn test_malformed_fai() {
        let dir = TempDir::new().unwrap();
        let path = write_fasta(&dir, ">1\nACGT\n");
        std::fs::write(dir.path().join("ref.fa.fai"), "1\tfour\t3\t4\t5\n").unwrap();
        assert!(FastaSequenceSource::new(&path).is_err());
    }
}
