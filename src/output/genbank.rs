//! GenBank rendering of the annotated window
//!
//! The record holds the window sequence (uppercase, forward strand), a
//! `source` feature spanning it, the gene itself, and one feature per
//! negative feature. Feature locations are relative to the written
//! sequence. Nothing time-dependent is written, so identical inputs render
//! identical bytes.

use gb_io::seq::{Feature as GbFeature, Location, Seq, Topology};
use std::borrow::Cow;

use crate::aggregate::NegativeFeatureSet;
use crate::coords::GenomicInterval;
use crate::error::NegFeatError;
use crate::feature::{AttrValue, Feature, FeatureKind};
use crate::flank::FlankedRegion;
use crate::locus::LocusContext;

type Qualifiers = Vec<gb_io::seq::Qualifier>;

/// Attributes written under a dedicated qualifier rather than echoed
const RESERVED_ATTRIBUTES: &[&str] = &["description"];

/// Qualifier keys may only hold letters, digits and underscores
fn qualifier_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Double quotes terminate qualifier values
fn qualifier_value(value: &str) -> String {
    value.replace('"', "'")
}

fn push(qualifiers: &mut Qualifiers, key: &str, value: impl AsRef<str>) {
    qualifiers.push((Cow::Owned(key.to_string()), Some(qualifier_value(value.as_ref()))));
}

/// `homo_sapiens` -> `Homo sapiens`
fn organism_name(species: &str) -> String {
    let spaced = species.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn relative_range(interval: GenomicInterval, origin: u64) -> Location {
    let (start, end) = interval.relative_to(origin);
    Location::simple_range(start as i64, end as i64)
}

/// Everything needed to render one record
pub struct RecordContext<'a> {
    pub accession: &'a str,
    pub locus: &'a LocusContext,
    pub region: &'a FlankedRegion,
    pub features: &'a NegativeFeatureSet,
}

/// Short human-readable summary for a feature's `/note`
fn describe(feature: &Feature) -> String {
    if let Some(AttrValue::Str(description)) = feature.attr("description") {
        return format!("{}: {}", feature.kind, description);
    }
    match feature.kind {
        FeatureKind::ExtremeGc => {
            let direction = feature.attr("direction");
            match (direction, feature.attr("min_gc"), feature.attr("max_gc")) {
                (Some(direction), Some(min), Some(max)) => {
                    format!("extreme_gc ({}), GC {}-{}", direction, min, max)
                }
                _ => "extreme_gc".to_string(),
            }
        }
        FeatureKind::Homopolymer => match (feature.attr("base"), feature.attr("length")) {
            (Some(base), Some(length)) => format!("homopolymer {}x{}", base, length),
            _ => "homopolymer".to_string(),
        },
        FeatureKind::Ambiguous => match feature.attr("symbols") {
            Some(symbols) => format!("ambiguous bases ({})", symbols),
            None => "ambiguous bases".to_string(),
        },
        FeatureKind::SimpleVariant => match feature.attr("maf") {
            Some(maf) => format!("simple_variant, MAF={}", maf),
            None => "simple_variant".to_string(),
        },
        kind => kind.to_string(),
    }
}

fn negative_feature(feature: &Feature, origin: u64) -> Option<GbFeature> {
    let interval = feature.interval()?;
    let mut qualifiers = Qualifiers::new();
    push(&mut qualifiers, "label", format!("{}_{}", feature.kind, feature.id));
    push(&mut qualifiers, "note", describe(feature));
    push(&mut qualifiers, "negfeat_id", feature.id.to_string());
    push(&mut qualifiers, "negfeat_kind", feature.kind.as_str());
    push(&mut qualifiers, "negfeat_sources", feature.sources.join(","));
    if feature.merged_from > 1 {
        push(&mut qualifiers, "merged_from", feature.merged_from.to_string());
    }
    if feature.kind == FeatureKind::SimpleVariant {
        let ids = feature.attr("id").cloned().map(AttrValue::into_items);
        for id in ids.into_iter().flatten() {
            if let AttrValue::Str(id) = id {
                if id.starts_with("rs") {
                    push(&mut qualifiers, "db_xref", format!("dbSNP:{}", id));
                }
            }
        }
    }
    for (key, value) in &feature.attributes {
        if RESERVED_ATTRIBUTES.contains(&key.as_str()) {
            continue;
        }
        push(&mut qualifiers, &qualifier_key(key), value.to_string());
    }
    Some(GbFeature {
        kind: Cow::Borrowed(feature.kind.genbank_key()),
        location: relative_range(interval, origin),
        qualifiers,
    })
}

fn source_feature(ctx: &RecordContext<'_>, window: GenomicInterval) -> GbFeature {
    let mut qualifiers = Qualifiers::new();
    if let Some(species) = &ctx.locus.species {
        push(&mut qualifiers, "organism", organism_name(species));
    }
    push(&mut qualifiers, "mol_type", "genomic DNA");
    push(&mut qualifiers, "chromosome", &ctx.locus.contig);
    push(&mut qualifiers, "db_xref", format!("UniProtKB:{}", ctx.accession));
    GbFeature {
        kind: Cow::Borrowed("source"),
        location: relative_range(window, window.start()),
        qualifiers,
    }
}

/// The gene feature, clipped to the window; `None` if it falls outside
fn gene_feature(ctx: &RecordContext<'_>, window: GenomicInterval) -> Option<GbFeature> {
    let gene = ctx.locus.gene_interval()?.intersect(&window)?;
    let mut qualifiers = Qualifiers::new();
    if let Some(name) = &ctx.locus.gene_name {
        push(&mut qualifiers, "gene", name);
    }
    if let Some(gene_id) = &ctx.locus.gene_id {
        push(&mut qualifiers, "db_xref", format!("Ensembl:{}", gene_id));
    }
    push(&mut qualifiers, "note", format!("protein {}", ctx.accession));

    let range = relative_range(gene, window.start());
    let location = if ctx.locus.strand.is_reverse() {
        Location::Complement(Box::new(range))
    } else {
        range
    };
    Some(GbFeature {
        kind: Cow::Borrowed("gene"),
        location,
        qualifiers,
    })
}

/// Build the in-memory record
pub fn build_record(ctx: &RecordContext<'_>) -> Result<Seq, NegFeatError> {
    let window = ctx.region.interval().ok_or_else(|| NegFeatError::Serialization {
        msg: format!(
            "empty window {}:{}-{}",
            ctx.region.contig, ctx.region.ext_start, ctx.region.ext_end
        ),
    })?;
    let sequence = ctx.region.sequence.to_ascii_uppercase().into_bytes();

    let mut features = vec![source_feature(ctx, window)];
    features.extend(gene_feature(ctx, window));
    features.extend(
        ctx.features
            .iter()
            .filter_map(|feature| negative_feature(feature, window.start())),
    );

    let label = ctx.locus.gene_name.as_deref().unwrap_or(ctx.accession);
    let (one_based_start, end) = window.to_one_based_closed();
    let definition = format!(
        "{} ({}) negative features, {} {}:{}-{}",
        label, ctx.accession, ctx.locus.assembly, ctx.region.contig, one_based_start, end
    );
    let comments = vec![
        format!("accession: {}", ctx.accession),
        format!("assembly: {}", ctx.locus.assembly),
        format!("contig: {}", ctx.region.contig),
        format!("ext_start: {}", ctx.region.ext_start),
        format!("ext_end: {}", ctx.region.ext_end),
        format!("strand: {}", ctx.locus.strand),
        format!("length: {}", sequence.len()),
        "coordinates: ext_start/ext_end are 0-based half-open".to_string(),
        "date: the LOCUS date is a fixed placeholder, not a creation date".to_string(),
    ];

    Ok(Seq {
        name: Some(ctx.accession.to_string()),
        topology: Topology::Linear,
        date: None,
        len: Some(sequence.len()),
        molecule_type: Some("DNA".to_string()),
        division: "UNC".to_string(),
        definition: Some(definition),
        accession: Some(ctx.accession.to_string()),
        version: None,
        source: None,
        dblink: None,
        keywords: None,
        references: vec![],
        comments,
        seq: sequence,
        contig: None,
        features,
    })
}

/// Render the record to GenBank bytes
pub fn render_record(ctx: &RecordContext<'_>) -> Result<Vec<u8>, NegFeatError> {
    let record = build_record(ctx)?;
    let mut buffer = Vec::new();
    gb_io::writer::write(&mut buffer, &record).map_err(|e| NegFeatError::Serialization {
        msg: format!("failed to render GenBank record: {}", e),
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::coords::Strand;
    use crate::feature::FeatureSelection;

    fn fixture() -> (LocusContext, FlankedRegion, NegativeFeatureSet) {
        let locus = LocusContext::new("GRCh38", "17", Strand::Minus, 1010, 1030)
            .unwrap()
            .with_gene_name("TP53")
            .with_gene_id("ENSG00000141510")
            .with_species("homo_sapiens");
        let window = GenomicInterval::new(1000, 1040).unwrap();
        let region = FlankedRegion::new("17", window, "acgt".repeat(10)).unwrap();
        let features = vec![
            Feature::new(FeatureKind::Repeat, 1000, 1012, "ensembl")
                .with_attr("description", "AluY"),
            Feature::new(FeatureKind::Homopolymer, 1020, 1026, "internal_homopolymer")
                .with_attr("base", "A")
                .with_attr("base_class", "AT")
                .with_attr("length", 6u64),
        ];
        let set = aggregate(features, &FeatureSelection::all());
        (locus, region, set)
    }

    #[test]
    fn test_build_record_layout() {
        let (locus, region, set) = fixture();
        let ctx = RecordContext {
            accession: "P04637",
            locus: &locus,
            region: &region,
            features: &set,
        };
        let record = build_record(&ctx).unwrap();
        assert_eq!(record.len, Some(40));
        assert!(record.seq.iter().all(|b| b.is_ascii_uppercase()));
        let kinds: Vec<String> = record.features.iter().map(|f| f.kind.to_string()).collect();
        assert_eq!(kinds, vec!["source", "gene", "repeat_region", "misc_feature"]);
        assert!(matches!(record.features[1].location, Location::Complement(_)));
        assert_eq!(
            record.features[2].location,
            Location::simple_range(0, 12)
        );
        assert!(record.comments.iter().any(|c| c == "ext_start: 1000"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let (locus, region, set) = fixture();
        let ctx = RecordContext {
            accession: "P04637",
            locus: &locus,
            region: &region,
            features: &set,
        };
        let first = render_record(&ctx).unwrap();
        let second = render_record(&ctx).unwrap();
        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with("LOCUS"));
        assert!(text.contains("/negfeat_kind=\"homopolymer\""));
        assert!(text.contains("AluY"));
        assert!(text.trim_end().ends_with("//"));
    }

    #[test]
    fn test_rendered_record_parses_back() {
        let (locus, region, set) = fixture();
        let ctx = RecordContext {
            accession: "P04637",
            locus: &locus,
            region: &region,
            features: &set,
        };
        let rendered = render_record(&ctx).unwrap();
        let parsed = gb_io::reader::SeqReader::new(&rendered[..])
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(parsed.features.len(), 4);
        assert_eq!(parsed.seq.len(), 40);
        let kinds: Vec<String> = parsed.features.iter().map(|f| f.kind.to_string()).collect();
        assert_eq!(kinds, vec!["source", "gene", "repeat_region", "misc_feature"]);
        assert!(parsed
            .comments
            .iter()
            .any(|c| c.contains("LOCUS date is a fixed placeholder")));
    }

    #[test]
    fn test_merged_variants_keep_every_dbsnp_xref() {
        let (locus, region, _) = fixture();
        let features = vec![
            Feature::new(FeatureKind::SimpleVariant, 1005, 1006, "ensembl").with_attr("id", "rs1"),
            Feature::new(FeatureKind::SimpleVariant, 1006, 1007, "ensembl").with_attr("id", "rs2"),
        ];
        let set = aggregate(features, &FeatureSelection::all());
        assert_eq!(set.len(), 1);
        let ctx = RecordContext {
            accession: "P04637",
            locus: &locus,
            region: &region,
            features: &set,
        };
        let record = build_record(&ctx).unwrap();
        let xrefs: Vec<&str> = record.features[2]
            .qualifiers
            .iter()
            .filter(|(key, _)| key == "db_xref")
            .filter_map(|(_, value)| value.as_deref())
            .collect();
        assert_eq!(xrefs, vec!["dbSNP:rs1", "dbSNP:rs2"]);
    }

    #[test]
    fn test_qualifier_sanitizing() {
        assert_eq!(qualifier_key("clinical-significance"), "clinical_significance");
        assert_eq!(qualifier_value("a \"b\""), "a 'b'");
        assert_eq!(organism_name("homo_sapiens"), "Homo sapiens");
    }
}
