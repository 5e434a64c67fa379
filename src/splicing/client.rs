//! A concrete, HTTP-backed [`SplicingPredictor`] (C6) delegating to a remote
//! maximum-entropy splice-site scoring service.

use serde::Deserialize;

use crate::err::{Error, Result};
use crate::splicing::{classify_splice_type, CrypticSite, SpliceType, SplicingPredictor};

#[derive(Debug, Deserialize)]
struct RawCrypticSite {
    position: i64,
    context: String,
    score: f64,
}

/// A [`SplicingPredictor`] backed by a real maximum-entropy scoring service.
pub struct MaxEntSplicingClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl MaxEntSplicingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }
}

impl SplicingPredictor for MaxEntSplicingClient {
    fn reference_sequence(&self, start: i64, end: i64) -> Result<String> {
        let url = format!("{}/seq?start={}&end={}", self.base_url, start, end);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| Error::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        response.text().map_err(|e| Error::InvalidApiResponse(e.to_string()))
    }

    fn determine_splice_type(&self, consequences: &[String]) -> SpliceType {
        classify_splice_type(consequences)
    }

    fn cryptic_sites(
        &self,
        reference_window: &str,
        splice_type: SpliceType,
    ) -> Result<Vec<CrypticSite>> {
        let kind = match splice_type {
            SpliceType::Donor => "donor",
            SpliceType::Acceptor => "acceptor",
            SpliceType::Unknown => return Ok(vec![]),
        };
        let url = format!("{}/cryptic-sites?type={}&seq={}", self.base_url, kind, reference_window);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| Error::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        let raw: Vec<RawCrypticSite> =
            response.json().map_err(|e| Error::InvalidApiResponse(e.to_string()))?;

        let mut sites: Vec<CrypticSite> = raw
            .into_iter()
            .map(|r| CrypticSite { position: r.position, context: r.context, max_entropy_score: r.score })
            .collect();
        sites.sort_by(|a, b| b.max_entropy_score.total_cmp(&a.max_entropy_score));
        Ok(sites)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_splice_type_skips_the_network_call() {
        let client = MaxEntSplicingClient::new("https://example.org/splicing");
        assert_eq!(Vec::<CrypticSite>::new(), client.cryptic_sites("ACGT", SpliceType::Unknown).unwrap());
    }

    #[test]
    fn sites_sort_descending_by_max_entropy_score() {
        let mut sites = vec![
            CrypticSite { position: 10, context: "AG".into(), max_entropy_score: 3.1 },
            CrypticSite { position: 20, context: "GT".into(), max_entropy_score: 8.4 },
            CrypticSite { position: 30, context: "AG".into(), max_entropy_score: 8.4 },
        ];
        sites.sort_by(|a, b| b.max_entropy_score.total_cmp(&a.max_entropy_score));
        assert!(float_cmp::approx_eq!(f64, 8.4, sites[0].max_entropy_score, ulps = 2));
        assert!(float_cmp::approx_eq!(f64, 3.1, sites[2].max_entropy_score, ulps = 2));
    }
}
