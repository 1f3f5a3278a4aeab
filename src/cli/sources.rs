//! Collaborator selection from a resolved configuration

use std::sync::Arc;

use crate::annotation::{AnnotationProvider, MockAnnotationProvider};
use crate::config::RunConfig;
use crate::ensembl::{
    EnsemblAnnotationProvider, EnsemblLocusResolver, EnsemblSequenceSource, HttpClient,
};
use crate::error::NegFeatError;
use crate::locus::{LocusResolver, MockLocusResolver};
use crate::sequence::{FastaSequenceSource, SequenceSource};

/// The three collaborators a run needs
pub struct Sources {
    pub resolver: Box<dyn LocusResolver>,
    pub sequence: Box<dyn SequenceSource>,
    pub annotations: Box<dyn AnnotationProvider>,
}

/// Pick local fixtures where configured and Ensembl REST otherwise
///
/// The HTTP client is built once, on first use, and shared.
pub fn build_sources(config: &RunConfig) -> Result<Sources, NegFeatError> {
    let sources = &config.sources;
    let ensembl_url = sources.ensembl_url.as_deref();
    let mut client: Option<Arc<HttpClient>> = None;
    let mut shared_client = || -> Result<Arc<HttpClient>, NegFeatError> {
        if let Some(client) = &client {
            return Ok(Arc::clone(client));
        }
        let built = Arc::new(HttpClient::new(config.client.clone())?);
        client = Some(Arc::clone(&built));
        Ok(built)
    };

    let resolver: Box<dyn LocusResolver> = match &sources.locus_fixture {
        Some(path) => {
            log::info!("resolving loci from {}", path.display());
            Box::new(MockLocusResolver::from_json(path)?)
        }
        None => {
            let resolver = EnsemblLocusResolver::new(shared_client()?);
            Box::new(match ensembl_url {
                Some(url) => resolver.with_ensembl_url(url),
                None => resolver,
            })
        }
    };

    let sequence: Box<dyn SequenceSource> = match &sources.fasta {
        Some(path) => {
            log::info!("reading sequence from {}", path.display());
            Box::new(FastaSequenceSource::new(path)?)
        }
        None => {
            let source = EnsemblSequenceSource::new(shared_client()?).with_species(&sources.species);
            Box::new(match ensembl_url {
                Some(url) => source.with_base_url(url),
                None => source,
            })
        }
    };

    let annotations: Box<dyn AnnotationProvider> = match &sources.annotation_fixture {
        Some(path) => {
            log::info!("reading annotations from {}", path.display());
            Box::new(MockAnnotationProvider::from_json(path)?)
        }
        None => {
            let provider =
                EnsemblAnnotationProvider::new(shared_client()?).with_species(&sources.species);
            Box::new(match ensembl_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
    };

    Ok(Sources {
        resolver,
        sequence,
        annotations,
    })
}
