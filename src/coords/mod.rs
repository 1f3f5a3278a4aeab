//! Genomic coordinate types
//!
//! All coordinates inside the engine are 0-based, half-open and absolute on
//! the contig, regardless of the gene's strand. Providers that speak the
//! 1-based closed convention (Ensembl REST, GenBank locations) are converted
//! at the boundary through [`CoordinateBasis`].
//!
//! | Type | Basis | Use Cases |
//! |------|-------|-----------|
//! | [`GenomicInterval`] | 0-based half-open | engine features, windows, BED |
//! | [`CoordinateBasis::OneBasedClosed`] | 1-based closed | Ensembl, GenBank, GFF |
//!
//! # Examples
//!
//! ```
//! use ferro_negfeat::coords::{CoordinateBasis, GenomicInterval};
//!
//! // Ensembl reports 43044295..43125483 (1-based, closed)
//! let iv = CoordinateBasis::OneBasedClosed.to_interval(43044295, 43125483).unwrap();
//! assert_eq!(iv.start(), 43044294);
//! assert_eq!(iv.end(), 43125483);
//! assert_eq!(iv.len(), 81190);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strand of a gene on its contig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    /// Parse the Ensembl integer convention (1 / -1)
    pub fn from_ensembl(value: i64) -> Option<Self> {
        match value {
            1 => Some(Strand::Plus),
            -1 => Some(Strand::Minus),
            _ => None,
        }
    }

    /// The Ensembl integer convention (1 / -1)
    pub fn as_ensembl(self) -> i8 {
        match self {
            Strand::Plus => 1,
            Strand::Minus => -1,
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Strand::Minus
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "1" | "+1" => Ok(Strand::Plus),
            "-" | "-1" => Ok(Strand::Minus),
            other => Err(format!("unknown strand '{}'", other)),
        }
    }
}

/// A 0-based, half-open genomic interval `[start, end)`
///
/// The interval is never empty: `start < end` is enforced at construction.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::coords::GenomicInterval;
///
/// let a = GenomicInterval::new(10, 20).unwrap();
/// let b = GenomicInterval::new(20, 30).unwrap();
/// assert!(!a.overlaps(&b));
/// assert!(a.touches(&b));
/// assert!(GenomicInterval::new(5, 5).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomicInterval {
    start: u64,
    end: u64,
}

impl GenomicInterval {
    /// Create a new interval, `None` when empty or inverted
    #[inline]
    pub const fn new(start: u64, end: u64) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bases covered
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false: intervals are non-empty by construction
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// True if the intervals share at least one base
    pub fn overlaps(&self, other: &GenomicInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if the intervals overlap or abut with no gap
    pub fn touches(&self, other: &GenomicInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Intersection of the two intervals, if any base is shared
    pub fn intersect(&self, other: &GenomicInterval) -> Option<GenomicInterval> {
        GenomicInterval::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Smallest interval covering both
    pub fn hull(&self, other: &GenomicInterval) -> GenomicInterval {
        GenomicInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Mirror the interval on a contig of `contig_length` bases
    ///
    /// Returns `None` if the interval does not fit on the contig.
    ///
    /// ```
    /// use ferro_negfeat::coords::GenomicInterval;
    ///
    /// let iv = GenomicInterval::new(0, 10).unwrap();
    /// let mirrored = iv.reflect(100).unwrap();
    /// assert_eq!((mirrored.start(), mirrored.end()), (90, 100));
    /// ```
    pub fn reflect(&self, contig_length: u64) -> Option<GenomicInterval> {
        if self.end > contig_length {
            return None;
        }
        GenomicInterval::new(contig_length - self.end, contig_length - self.start)
    }

    /// Offsets relative to `origin`, for writing window-local coordinates
    pub fn relative_to(&self, origin: u64) -> (u64, u64) {
        (
            self.start.saturating_sub(origin),
            self.end.saturating_sub(origin),
        )
    }

    /// Render as 1-based closed `start..end`
    pub fn to_one_based_closed(&self) -> (u64, u64) {
        (self.start + 1, self.end)
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Coordinate convention of an externally supplied record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateBasis {
    /// 0-based, half-open (BED style)
    #[default]
    ZeroBasedHalfOpen,
    /// 1-based, closed (Ensembl / GFF style)
    OneBasedClosed,
}

impl CoordinateBasis {
    /// Convert a raw `(start, end)` pair into a half-open interval
    ///
    /// Returns `None` for pairs that describe no bases in the given
    /// convention (including position 0 in the 1-based convention).
    ///
    /// ```
    /// use ferro_negfeat::coords::CoordinateBasis;
    ///
    /// let one = CoordinateBasis::OneBasedClosed.to_interval(5, 5).unwrap();
    /// assert_eq!((one.start(), one.end()), (4, 5));
    /// assert!(CoordinateBasis::OneBasedClosed.to_interval(0, 5).is_none());
    /// assert!(CoordinateBasis::ZeroBasedHalfOpen.to_interval(5, 5).is_none());
    /// ```
    pub fn to_interval(self, start: i64, end: i64) -> Option<GenomicInterval> {
        match self {
            CoordinateBasis::ZeroBasedHalfOpen => {
                if start < 0 || end < 0 {
                    return None;
                }
                GenomicInterval::new(start as u64, end as u64)
            }
            CoordinateBasis::OneBasedClosed => {
                if start < 1 || end < start {
                    return None;
                }
                GenomicInterval::new(start as u64 - 1, end as u64)
            }
        }
    }
}
