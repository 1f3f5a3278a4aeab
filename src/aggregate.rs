//! Negative feature aggregation
//!
//! Collects the feature streams of every detector and provider into one
//! [`NegativeFeatureSet`]:
//!
//! 1. Features of disabled kinds are discarded.
//! 2. Within each kind (and homopolymer base class), features are sorted by
//!    start and swept once; a feature starting at or before the running end
//!    is folded into the current span.
//! 3. All kinds are concatenated and sorted by `(start, kind priority)`.
//! 4. Ids `1..=n` are assigned in that order.
//!
//! Features of different kinds are never merged, so overlapping annotations
//! of different kinds stay as separate layers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::feature::{AttrValue, Feature, FeatureKind, FeatureSelection};

/// Ordered, merged negative features for one window
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NegativeFeatureSet {
    features: Vec<Feature>,
}

impl NegativeFeatureSet {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Feature count per enabled kind, zero for kinds with no features
    pub fn counts(&self, selection: &FeatureSelection) -> BTreeMap<FeatureKind, usize> {
        let mut counts: BTreeMap<FeatureKind, usize> =
            selection.iter().map(|kind| (kind, 0)).collect();
        for feature in &self.features {
            *counts.entry(feature.kind).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a NegativeFeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Fold `next` into `current`
///
/// Attribute values that agree stay scalar; differing values become a list
/// of the distinct values in first-seen order.
fn absorb(current: &mut Feature, next: Feature) {
    current.end = current.end.max(next.end);
    current.merged_from += next.merged_from;

    let sources: BTreeSet<String> = current.sources.drain(..).chain(next.sources).collect();
    current.sources = sources.into_iter().collect();

    for (key, value) in next.attributes {
        match current.attributes.remove(&key) {
            None => {
                current.attributes.insert(key, value);
            }
            Some(existing) => {
                let mut items = existing.into_items();
                for item in value.into_items() {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                let merged = if items.len() == 1 {
                    items.remove(0)
                } else {
                    AttrValue::List(items)
                };
                current.attributes.insert(key, merged);
            }
        }
    }
}

/// Merge touching or overlapping features of one group
fn sweep(mut group: Vec<Feature>) -> Vec<Feature> {
    group.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    let mut merged: Vec<Feature> = Vec::with_capacity(group.len());
    for feature in group {
        match merged.last_mut() {
            Some(current) if feature.start <= current.end => absorb(current, feature),
            _ => merged.push(feature),
        }
    }
    merged
}

/// Build the final feature set from all streams
///
/// An empty selection yields an empty set.
///
/// # Examples
///
/// ```
/// use ferro_negfeat::aggregate::aggregate;
/// use ferro_negfeat::feature::{Feature, FeatureKind, FeatureSelection};
///
/// let features = vec![
///     Feature::new(FeatureKind::Repeat, 10, 20, "a"),
///     Feature::new(FeatureKind::Repeat, 20, 30, "b"),
///     Feature::new(FeatureKind::ExtremeGc, 10, 30, "c"),
/// ];
/// let set = aggregate(features, &FeatureSelection::all());
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.features()[0].kind, FeatureKind::Repeat);
/// assert_eq!((set.features()[0].start, set.features()[0].end), (10, 30));
/// assert_eq!(set.features()[0].merged_from, 2);
/// ```
pub fn aggregate(features: Vec<Feature>, selection: &FeatureSelection) -> NegativeFeatureSet {
    let mut groups: BTreeMap<(FeatureKind, Option<String>), Vec<Feature>> = BTreeMap::new();
    let mut discarded = 0usize;
    for feature in features {
        if !selection.contains(feature.kind) || feature.is_empty() {
            discarded += 1;
            continue;
        }
        groups
            .entry((feature.kind, feature.merge_class()))
            .or_default()
            .push(feature);
    }
    if discarded > 0 {
        log::debug!("aggregate: discarded {} features of disabled kinds", discarded);
    }

    let mut merged: Vec<Feature> = groups.into_values().flat_map(sweep).collect();
    merged.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.kind.priority().cmp(&b.kind.priority()))
            .then(a.end.cmp(&b.end))
    });
    for (index, feature) in merged.iter_mut().enumerate() {
        feature.id = index as u32 + 1;
    }
    NegativeFeatureSet { features: merged }
}
