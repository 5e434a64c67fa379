//! A concrete, HTTP-backed [`AnnotationClient`] (C3).
//!
//! Talks to an annonars-style REST service: one endpoint per-variant, one for
//! range queries, one for transcript geometry. The base URL is passed in
//! explicitly at construction time; there is no process-wide configuration
//! object.

use serde::Deserialize;

use crate::annos::{AnnotationClient, VariantAnnotation};
use crate::common::GenomeRelease;
use crate::err::{Error, Result};
use crate::transcripts::{TranscriptGene, TranscriptSeqvar};
use crate::variant::SequenceVariant;

/// An [`AnnotationClient`] backed by a real annonars-compatible HTTP service.
pub struct AnnonarsClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    result: Vec<VariantAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TranscriptsResponse {
    #[serde(default)]
    variant_transcripts: Vec<TranscriptSeqvar>,
    #[serde(default)]
    gene_transcripts: Vec<TranscriptGene>,
}

impl AnnonarsClient {
    /// Construct a client against `base_url`, e.g. `https://example.org/annonars`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        response
            .json::<T>()
            .map_err(|e| Error::InvalidApiResponse(e.to_string()))
    }
}

impl AnnotationClient for AnnonarsClient {
    fn variant_info(&self, variant: &SequenceVariant) -> Result<VariantAnnotation> {
        let url = format!(
            "{}/annos/variant?genome_release={}&chromosome={}&pos={}&reference={}&alternative={}",
            self.base_url,
            variant.assembly.to_string().to_lowercase(),
            variant.chromosome,
            variant.position,
            variant.deleted,
            variant.inserted,
        );
        self.get_json(&url)
    }

    fn variants_in_range(
        &self,
        variant: &SequenceVariant,
        start: u64,
        end: u64,
    ) -> Result<Vec<VariantAnnotation>> {
        let url = format!(
            "{}/annos/range?genome_release={}&chromosome={}&start={}&stop={}",
            self.base_url,
            variant.assembly.to_string().to_lowercase(),
            variant.chromosome,
            start,
            end,
        );
        let response: RangeResponse = self.get_json(&url)?;
        Ok(response.result)
    }

    fn transcripts_for_variant(
        &self,
        variant: &SequenceVariant,
        assembly: GenomeRelease,
    ) -> Result<(Vec<TranscriptSeqvar>, Vec<TranscriptGene>)> {
        let url = format!(
            "{}/genes/transcripts?genome_release={}&chromosome={}&pos={}",
            self.base_url,
            assembly.to_string().to_lowercase(),
            variant.chromosome,
            variant.position,
        );
        let response: TranscriptsResponse = self.get_json(&url)?;
        Ok((response.variant_transcripts, response.gene_transcripts))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_stores_base_url_verbatim() {
        let client = AnnonarsClient::new("https://example.org/annonars");
        assert_eq!("https://example.org/annonars", client.base_url);
    }
}
