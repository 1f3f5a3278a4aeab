//! Negative feature model
//!
//! A [`Feature`] is a genomic interval flagged as unsuitable for primer
//! placement. Coordinates are absolute on the contig, 0-based half-open.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::coords::GenomicInterval;
use crate::error::NegFeatError;

/// Kind of negative feature
///
/// Declaration order is the tie-break priority used when sorting features
/// that start at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Repeat,
    SimpleVariant,
    StructuralVariant,
    ExtremeGc,
    Homopolymer,
    Ambiguous,
}

impl FeatureKind {
    /// All kinds in priority order
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Repeat,
        FeatureKind::SimpleVariant,
        FeatureKind::StructuralVariant,
        FeatureKind::ExtremeGc,
        FeatureKind::Homopolymer,
        FeatureKind::Ambiguous,
    ];

    /// Sort tie-break rank, lower first
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Repeat => "repeat",
            FeatureKind::SimpleVariant => "simple_variant",
            FeatureKind::StructuralVariant => "structural_variant",
            FeatureKind::ExtremeGc => "extreme_gc",
            FeatureKind::Homopolymer => "homopolymer",
            FeatureKind::Ambiguous => "ambiguous",
        }
    }

    /// GenBank feature key used when writing this kind
    pub fn genbank_key(self) -> &'static str {
        match self {
            FeatureKind::Repeat => "repeat_region",
            FeatureKind::SimpleVariant => "variation",
            _ => "misc_feature",
        }
    }

    /// True for kinds supplied by external annotation providers
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            FeatureKind::Repeat | FeatureKind::SimpleVariant | FeatureKind::StructuralVariant
        )
    }

    /// Map a provider's kind label onto a feature kind
    ///
    /// Accepts the engine's own names plus the Ensembl overlap labels.
    /// Unknown labels return `None`.
    ///
    /// ```
    /// use ferro_negfeat::feature::FeatureKind;
    ///
    /// assert_eq!(FeatureKind::from_provider_label("variation"), Some(FeatureKind::SimpleVariant));
    /// assert_eq!(FeatureKind::from_provider_label("repeat"), Some(FeatureKind::Repeat));
    /// assert_eq!(FeatureKind::from_provider_label("transcript"), None);
    /// ```
    pub fn from_provider_label(label: &str) -> Option<FeatureKind> {
        match label.trim().to_lowercase().as_str() {
            "repeat" | "repeat_region" | "simple" => Some(FeatureKind::Repeat),
            "variation" | "simple_variant" | "snv" | "snp" => Some(FeatureKind::SimpleVariant),
            "structural_variation" | "structural_variant" | "sv" => {
                Some(FeatureKind::StructuralVariant)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = NegFeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                NegFeatError::invalid_parameter(
                    "features",
                    format!(
                        "unknown feature kind '{}', expected one of: {}",
                        s.trim(),
                        FeatureKind::ALL.map(|k| k.as_str()).join(", ")
                    ),
                )
            })
    }
}

/// Set of enabled feature kinds
///
/// # Examples
///
/// ```
/// use ferro_negfeat::feature::{FeatureKind, FeatureSelection};
///
/// let selection = FeatureSelection::parse("homopolymer, repeat").unwrap();
/// assert!(selection.contains(FeatureKind::Repeat));
/// assert!(!selection.contains(FeatureKind::Ambiguous));
/// assert!(FeatureSelection::parse("").unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSelection(BTreeSet<FeatureKind>);

impl FeatureSelection {
    /// Every kind enabled
    pub fn all() -> Self {
        Self(FeatureKind::ALL.into_iter().collect())
    }

    /// No kind enabled
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Parse a comma-separated list; blank input enables nothing
    pub fn parse(list: &str) -> Result<Self, NegFeatError> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse::<FeatureKind>)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Enabled kinds in priority order
    pub fn iter(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FeatureSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<FeatureKind> for FeatureSelection {
    fn from_iter<I: IntoIterator<Item = FeatureKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FeatureSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(FeatureKind::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Scalar or list attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Convert a provider JSON value
    ///
    /// Nulls and objects have no attribute form and return `None`; arrays
    /// keep their scalar members.
    pub fn from_json(value: &serde_json::Value) -> Option<AttrValue> {
        use serde_json::Value;
        match value {
            Value::Null | Value::Object(_) => None,
            Value::Bool(b) => Some(AttrValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(AttrValue::Int(i)),
                None => n.as_f64().map(AttrValue::Float),
            },
            Value::String(s) => Some(AttrValue::Str(s.clone())),
            Value::Array(items) => {
                let values: Vec<AttrValue> = items
                    .iter()
                    .filter(|v| !v.is_array())
                    .filter_map(AttrValue::from_json)
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    Some(AttrValue::List(values))
                }
            }
        }
    }

    /// Numeric view of the value, parsing numeric strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Flatten into scalar members
    pub fn into_items(self) -> Vec<AttrValue> {
        match self {
            AttrValue::List(items) => items,
            scalar => vec![scalar],
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// A negative feature interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub kind: FeatureKind,
    pub start: u64,
    pub end: u64,
    /// Contributing sources, sorted and distinct
    pub sources: Vec<String>,
    pub attributes: BTreeMap<String, AttrValue>,
    /// Number of input features merged into this one
    pub merged_from: u32,
    /// 1-based position in the final set, 0 until assigned
    pub id: u32,
}

impl Feature {
    /// Create a feature from a single source
    pub fn new(kind: FeatureKind, start: u64, end: u64, source: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            sources: vec![source.into()],
            attributes: BTreeMap::new(),
            merged_from: 1,
            id: 0,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn interval(&self) -> Option<GenomicInterval> {
        GenomicInterval::new(self.start, self.end)
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Sub-group within a kind that bounds merging
    ///
    /// Homopolymer runs of the A/T class never merge with G/C runs even
    /// when they abut; all other kinds merge freely within the kind.
    pub fn merge_class(&self) -> Option<String> {
        match self.kind {
            FeatureKind::Homopolymer => self.attr("base_class").map(|v| v.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_priority_order() {
        let priorities: Vec<u8> = FeatureKind::ALL.iter().map(|k| k.priority()).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5]);
        assert!(FeatureKind::Repeat < FeatureKind::Ambiguous);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "structural_variant".parse::<FeatureKind>().unwrap(),
            FeatureKind::StructuralVariant
        );
        assert_eq!(" extreme_gc ".parse::<FeatureKind>().unwrap(), FeatureKind::ExtremeGc);
        let err = "gc".parse::<FeatureKind>().unwrap_err();
        assert!(err.to_string().contains("unknown feature kind 'gc'"));
    }

    #[test]
    fn test_genbank_keys() {
        assert_eq!(FeatureKind::Repeat.genbank_key(), "repeat_region");
        assert_eq!(FeatureKind::SimpleVariant.genbank_key(), "variation");
        assert_eq!(FeatureKind::Homopolymer.genbank_key(), "misc_feature");
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&FeatureKind::SimpleVariant).unwrap(),
            "\"simple_variant\""
        );
    }

    #[test]
    fn test_selection_parse() {
        let sel = FeatureSelection::parse("ambiguous,repeat,repeat").unwrap();
        assert_eq!(sel.len(), 2);
        let kinds: Vec<FeatureKind> = sel.iter().collect();
        assert_eq!(kinds, vec![FeatureKind::Repeat, FeatureKind::Ambiguous]);
        assert_eq!(sel.to_string(), "repeat,ambiguous");
        assert!(FeatureSelection::parse(" , ").unwrap().is_empty());
        assert!(FeatureSelection::parse("repeat,bogus").is_err());
        assert_eq!(FeatureSelection::default().len(), 6);
    }

    #[test]
    fn test_selection_serde() {
        let sel = FeatureSelection::parse("homopolymer").unwrap();
        assert_eq!(serde_json::to_string(&sel).unwrap(), "[\"homopolymer\"]");
    }

    #[test]
    fn test_attr_from_json() {
        assert_eq!(AttrValue::from_json(&json!(null)), None);
        assert_eq!(AttrValue::from_json(&json!({"a": 1})), None);
        assert_eq!(AttrValue::from_json(&json!(3)), Some(AttrValue::Int(3)));
        assert_eq!(AttrValue::from_json(&json!(0.25)), Some(AttrValue::Float(0.25)));
        assert_eq!(
            AttrValue::from_json(&json!(["A", "G"])),
            Some(AttrValue::List(vec!["A".into(), "G".into()]))
        );
        assert_eq!(AttrValue::from_json(&json!([])), None);
    }

    #[test]
    fn test_attr_numeric_view() {
        assert_eq!(AttrValue::from("0.05").as_f64(), Some(0.05));
        assert_eq!(AttrValue::Int(2).as_f64(), Some(2.0));
        assert_eq!(AttrValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_attr_display() {
        assert_eq!(AttrValue::List(vec![1i64.into(), "x".into()]).to_string(), "1,x");
        assert_eq!(AttrValue::Float(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_merge_class() {
        let hp = Feature::new(FeatureKind::Homopolymer, 0, 5, "internal").with_attr("base_class", "AT");
        assert_eq!(hp.merge_class().as_deref(), Some("AT"));
        let gc = Feature::new(FeatureKind::ExtremeGc, 0, 5, "internal");
        assert_eq!(gc.merge_class(), None);
    }
}
