//! Protein accession to gene locus
//!
//! Resolution runs in two steps: find the Ensembl gene for the accession
//! (EBI Proteins coordinates first, UniProt cross-references as fallback),
//! then look the gene up in Ensembl for its placement.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::client::HttpClient;
use super::{EBI_PROTEINS_URL, ENSEMBL_REST_URL, JSON, UNIPROT_REST_URL};
use crate::coords::Strand;
use crate::error::NegFeatError;
use crate::locus::{LocusContext, LocusResolver, ResolvedLocus};

/// UniProtKB accession, optionally with an isoform suffix
static UNIPROT_ACCESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9]([A-Z][A-Z0-9]{2}[0-9]){1,2})(-\d+)?$")
        .unwrap()
});

/// Check an accession against the UniProtKB format
///
/// ```
/// use ferro_negfeat::ensembl::resolver::is_uniprot_accession;
///
/// assert!(is_uniprot_accession("P04637"));
/// assert!(is_uniprot_accession("P04637-2"));
/// assert!(is_uniprot_accession("A0A024R161"));
/// assert!(!is_uniprot_accession("TP53"));
/// ```
pub fn is_uniprot_accession(accession: &str) -> bool {
    UNIPROT_ACCESSION.is_match(accession)
}

fn strip_version(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

/// Ensembl gene ids named in an EBI Proteins coordinates response
///
/// The response is one entry or a list of entries. Each entry names its
/// gene directly, through its `gnCoordinate` list, or through an Ensembl
/// cross-reference. Order of first appearance is preserved.
pub fn gene_ids_from_coordinates(payload: &Value) -> Vec<String> {
    let entries: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![payload],
        _ => Vec::new(),
    };

    let mut ids: Vec<String> = Vec::new();
    let mut push = |id: &str| {
        let id = strip_version(id.trim()).to_string();
        if id.starts_with("ENSG") && !ids.contains(&id) {
            ids.push(id);
        }
    };

    for entry in entries {
        if let Some(id) = entry
            .get("ensemblGeneId")
            .or_else(|| entry.get("ensembl_gene_id"))
            .and_then(Value::as_str)
        {
            push(id);
        }
        if let Some(coordinates) = entry.get("gnCoordinate").and_then(Value::as_array) {
            for coordinate in coordinates {
                if let Some(id) = coordinate.get("ensemblGeneId").and_then(Value::as_str) {
                    push(id);
                }
            }
        }
        if let Some(references) = entry.get("crossReferences").and_then(Value::as_array) {
            for reference in references {
                let db = reference
                    .get("dbDisplayName")
                    .or_else(|| reference.get("database"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if !db.to_lowercase().contains("ensembl") {
                    continue;
                }
                if let Some(id) = reference
                    .get("id")
                    .or_else(|| reference.get("accession"))
                    .and_then(Value::as_str)
                {
                    push(id);
                }
            }
        }
    }
    ids
}

/// Ensembl gene ids listed in a UniProtKB entry's cross-references
pub fn gene_ids_from_uniprot(payload: &Value) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let references = payload
        .get("uniProtKBCrossReferences")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for reference in references {
        if reference.get("database").and_then(Value::as_str) != Some("Ensembl") {
            continue;
        }
        let properties = reference
            .get("properties")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for property in properties {
            if property.get("key").and_then(Value::as_str) != Some("GeneId") {
                continue;
            }
            if let Some(value) = property.get("value").and_then(Value::as_str) {
                let id = strip_version(value).to_string();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

/// Build a locus from an Ensembl `/lookup/id` response
///
/// Ensembl reports 1-based closed coordinates; the locus is 0-based
/// half-open.
pub fn locus_from_lookup(gene_id: &str, payload: &Value) -> Result<LocusContext, NegFeatError> {
    let unresolved = |msg: String| NegFeatError::LocusUnresolved {
        accession: gene_id.to_string(),
        msg,
    };

    let start = payload
        .get("start")
        .and_then(Value::as_u64)
        .ok_or_else(|| unresolved("lookup has no start".to_string()))?;
    let end = payload
        .get("end")
        .and_then(Value::as_u64)
        .ok_or_else(|| unresolved("lookup has no end".to_string()))?;
    let strand = payload
        .get("strand")
        .and_then(Value::as_i64)
        .and_then(Strand::from_ensembl)
        .ok_or_else(|| unresolved("lookup has no usable strand".to_string()))?;
    let contig = payload
        .get("seq_region_name")
        .and_then(Value::as_str)
        .ok_or_else(|| unresolved("lookup has no seq_region_name".to_string()))?;
    let assembly = payload
        .get("assembly_name")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    if start == 0 {
        return Err(unresolved("lookup start is not 1-based".to_string()));
    }

    let mut locus = LocusContext::new(assembly, contig, strand, start - 1, end)
        .map_err(|e| unresolved(e.to_string()))?
        .with_gene_id(gene_id);
    if let Some(name) = payload
        .get("display_name")
        .or_else(|| payload.get("external_name"))
        .and_then(Value::as_str)
    {
        locus = locus.with_gene_name(name);
    }
    if let Some(species) = payload.get("species").and_then(Value::as_str) {
        locus = locus.with_species(species);
    }
    Ok(locus)
}

/// Locus resolver backed by EBI Proteins, UniProt and Ensembl lookup
pub struct EnsemblLocusResolver {
    client: Arc<HttpClient>,
    ensembl_url: String,
    ebi_url: String,
    uniprot_url: String,
}

impl EnsemblLocusResolver {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            ensembl_url: ENSEMBL_REST_URL.to_string(),
            ebi_url: EBI_PROTEINS_URL.to_string(),
            uniprot_url: UNIPROT_REST_URL.to_string(),
        }
    }

    /// Use an Ensembl mirror for gene lookups
    pub fn with_ensembl_url(mut self, ensembl: impl Into<String>) -> Self {
        self.ensembl_url = ensembl.into();
        self
    }

    /// Point the resolver at other service roots (mirrors, test servers)
    pub fn with_base_urls(
        mut self,
        ensembl: impl Into<String>,
        ebi: impl Into<String>,
        uniprot: impl Into<String>,
    ) -> Self {
        self.ensembl_url = ensembl.into();
        self.ebi_url = ebi.into();
        self.uniprot_url = uniprot.into();
        self
    }

    fn candidates_from_ebi(&self, accession: &str) -> Result<Vec<String>, NegFeatError> {
        let url = format!("{}/coordinates/{}", self.ebi_url, accession);
        Ok(match self.client.get("ebi", &url, &[], JSON)? {
            Some(fetched) => gene_ids_from_coordinates(&fetched.json()?),
            None => Vec::new(),
        })
    }

    fn candidates_from_uniprot(&self, accession: &str) -> Result<Vec<String>, NegFeatError> {
        let url = format!("{}/uniprotkb/{}.json", self.uniprot_url, accession);
        Ok(match self.client.get("uniprot", &url, &[], JSON)? {
            Some(fetched) => gene_ids_from_uniprot(&fetched.json()?),
            None => Vec::new(),
        })
    }

    fn lookup_gene(&self, accession: &str, gene_id: &str) -> Result<LocusContext, NegFeatError> {
        let url = format!("{}/lookup/id/{}", self.ensembl_url, gene_id);
        let fetched = self
            .client
            .get("ensembl", &url, &[], JSON)?
            .ok_or_else(|| NegFeatError::LocusUnresolved {
                accession: accession.to_string(),
                msg: format!("Ensembl has no gene {}", gene_id),
            })?;
        locus_from_lookup(gene_id, &fetched.json()?).map_err(|e| match e {
            NegFeatError::LocusUnresolved { msg, .. } => NegFeatError::LocusUnresolved {
                accession: accession.to_string(),
                msg: format!("{}: {}", gene_id, msg),
            },
            other => other,
        })
    }
}

impl LocusResolver for EnsemblLocusResolver {
    fn resolve(&self, accession: &str) -> Result<ResolvedLocus, NegFeatError> {
        let accession = accession.trim();
        if !is_uniprot_accession(accession) {
            return Err(NegFeatError::LocusUnresolved {
                accession: accession.to_string(),
                msg: "not a UniProtKB accession".to_string(),
            });
        }

        let mut warnings = Vec::new();
        let mut candidates = match self.candidates_from_ebi(accession) {
            Ok(ids) => ids,
            Err(e @ NegFeatError::CacheMiss { .. }) => return Err(e),
            Err(e) => {
                log::warn!("EBI coordinates lookup for {} failed: {}", accession, e);
                Vec::new()
            }
        };
        if candidates.is_empty() {
            log::info!("no EBI gene mapping for {}, trying UniProt", accession);
            candidates = self.candidates_from_uniprot(accession)?;
        }

        let gene_id = match candidates.as_slice() {
            [] => {
                return Err(NegFeatError::LocusUnresolved {
                    accession: accession.to_string(),
                    msg: "no Ensembl gene identifier found".to_string(),
                })
            }
            [only] => only.clone(),
            [first, ..] => {
                let warning = format!(
                    "{} maps to {} Ensembl genes ({}); using {}",
                    accession,
                    candidates.len(),
                    candidates.join(", "),
                    first
                );
                log::warn!("{}", warning);
                warnings.push(warning);
                first.clone()
            }
        };

        let locus = self.lookup_gene(accession, &gene_id)?;
        log::info!(
            "{} -> {} {}:{}-{} ({})",
            accession,
            gene_id,
            locus.contig,
            locus.gene_start,
            locus.gene_end,
            locus.strand
        );
        Ok(ResolvedLocus { locus, warnings })
    }
}
