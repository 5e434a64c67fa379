//! Parsing heterogeneous variant representations into a [`SequenceVariant`] (C2).
//!
//! Three strategies are tried in order: a colon/hyphen separated
//! gnomAD-style or relaxed-SPDI match, a canonical SPDI match against the RefSeq
//! accession table, and finally a remote normalization collaborator for dbSNP,
//! HGVS, and ClinVar inputs. Each strategy returns a structured `ParseError` on
//! mismatch so the caller can fall through to the next one; any other error
//! propagates immediately instead of being swallowed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::GenomeRelease;
use crate::err::{Error, Result};
use crate::variant::{SequenceVariant, REFSEQ_CHROM};

/// `[assembly-]chrom-pos-ref-alt`, e.g. `GRCh38-1-1000-A-T` or `13-20189547-G-A`.
static REGEX_GNOMAD_VARIANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)^
        (?:(?P<assembly>\w+)-)?
        (?P<chrom>(?:chr)?(?:[1-9]|1[0-9]|2[0-2]|X|Y|M|MT))
        -(?P<pos>\d+)
        -(?P<delete>[ACGT]+)
        -(?P<insert>[ACGT]+)
        $",
    )
    .expect("static regex must compile")
});

/// `NC_XXXXXX.V:pos:ref:alt`.
static REGEX_CANONICAL_SPDI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)^
        (?P<sequence>NC_\d{6}\.\d+)
        :(?P<pos>\d+)
        :(?P<delete>[ACGT]+)
        :(?P<insert>[ACGT]+)
        $",
    )
    .expect("static regex must compile")
});

/// `[assembly:]chrom:pos:ref:alt`, the colon-separated sibling of the gnomAD form.
static REGEX_RELAXED_SPDI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)^
        (?:(?P<assembly>\w+):)?
        (?P<chrom>(?:chr)?(?:[1-9]|1[0-9]|2[0-2]|X|Y|M|MT))
        :(?P<pos>\d+)
        :(?P<delete>[ACGT]+)
        :(?P<insert>[ACGT]+)
        $",
    )
    .expect("static regex must compile")
});

/// dbSNP identifier, e.g. `rs121913529`. Delegated to the remote normalizer.
pub static REGEX_DBSNP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^rs\d+$").expect("static regex must compile"));

/// ClinVar accession, e.g. `VCV000012345.1`. Delegated to the remote normalizer.
pub static REGEX_CLINVAR_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<accession>(?:RCV|VCV)\d{9})(?:\.(?P<version>\d+))?$")
        .expect("static regex must compile")
});

/// The remote normalization collaborator: the fallback strategy for inputs the
/// local grammars don't recognize.
///
/// Converts free-form representations (dbSNP rs#, HGVS c./p., ClinVar VCV) to a
/// canonical SPDI-like record. Transport is out of scope for this crate; this
/// trait is the contract a caller plugs a real implementation into.
pub trait RemoteVariantNormalizer {
    fn normalize(&self, query: &str, assembly: GenomeRelease) -> Result<SequenceVariant>;
}

/// A normalizer that always fails to parse. Useful as a default when no remote
/// collaborator is configured, and in tests that only exercise the local grammars.
pub struct NoRemoteNormalizer;

impl RemoteVariantNormalizer for NoRemoteNormalizer {
    fn normalize(&self, query: &str, _assembly: GenomeRelease) -> Result<SequenceVariant> {
        Err(Error::ParseError(format!(
            "no remote normalizer configured, cannot resolve {query}"
        )))
    }
}

#[derive(Debug, serde::Deserialize)]
struct DottyResponse {
    assembly: String,
    contig: String,
    pos: u64,
    #[serde(rename = "reference_deleted")]
    reference_deleted: String,
    #[serde(rename = "alternative_inserted")]
    alternative_inserted: String,
}

/// A [`RemoteVariantNormalizer`] backed by a real SPDI-conversion service,
/// turning dbSNP rs#, HGVS, and ClinVar accessions into a canonical variant.
pub struct DottyNormalizer {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl DottyNormalizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }
}

impl RemoteVariantNormalizer for DottyNormalizer {
    fn normalize(&self, query: &str, assembly: GenomeRelease) -> Result<SequenceVariant> {
        let url = format!("{}/api/v1/to-spdi?q={}&assembly={}", self.base_url, query, assembly);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| Error::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::ConnectionError(e.to_string()))?;
        let spdi: DottyResponse =
            response.json().map_err(|e| Error::InvalidApiResponse(e.to_string()))?;
        let assembly = GenomeRelease::from_loose_str(&spdi.assembly)
            .ok_or_else(|| Error::InvalidApiResponse(format!("unknown assembly: {}", spdi.assembly)))?;
        SequenceVariant::new(
            assembly,
            &spdi.contig,
            spdi.pos,
            &spdi.reference_deleted,
            &spdi.alternative_inserted,
            Some(query.to_string()),
        )
    }
}

fn parse_separated(value: &str, default_assembly: GenomeRelease) -> Result<SequenceVariant> {
    let caps = REGEX_GNOMAD_VARIANT
        .captures(value)
        .or_else(|| REGEX_RELAXED_SPDI.captures(value))
        .ok_or_else(|| {
            Error::ParseError(format!("unable to parse colon/hyphen separated seqvar: {value}"))
        })?;

    let assembly = match caps.name("assembly") {
        Some(m) => GenomeRelease::from_loose_str(m.as_str())
            .ok_or_else(|| Error::ParseError(format!("unknown genome release: {}", m.as_str())))?,
        None => default_assembly,
    };
    let chrom = caps.name("chrom").expect("grammar guarantees chrom").as_str();
    let pos: u64 = caps
        .name("pos")
        .expect("grammar guarantees pos")
        .as_str()
        .parse()
        .map_err(|_| Error::ParseError(format!("unable to parse position in {value}")))?;
    let delete = caps.name("delete").expect("grammar guarantees delete").as_str();
    let insert = caps.name("insert").expect("grammar guarantees insert").as_str();

    SequenceVariant::new(assembly, chrom, pos, delete, insert, Some(value.to_string()))
}

fn parse_canonical_spdi(value: &str) -> Result<SequenceVariant> {
    let caps = REGEX_CANONICAL_SPDI
        .captures(value)
        .ok_or_else(|| Error::ParseError(format!("unable to parse canonical SPDI variant: {value}")))?;

    let sequence = caps.name("sequence").expect("grammar guarantees sequence").as_str();
    let (assembly, chrom) = REFSEQ_CHROM
        .get(sequence.to_uppercase().as_str())
        .copied()
        .ok_or_else(|| Error::ParseError(format!("unknown RefSeq accession: {sequence}")))?;
    let pos: u64 = caps
        .name("pos")
        .expect("grammar guarantees pos")
        .as_str()
        .parse()
        .map_err(|_| Error::ParseError(format!("unable to parse position in {value}")))?;
    let delete = caps.name("delete").expect("grammar guarantees delete").as_str();
    let insert = caps.name("insert").expect("grammar guarantees insert").as_str();

    SequenceVariant::new(assembly, chrom, pos, delete, insert, Some(value.to_string()))
}

/// Resolve a user-supplied variant string into a canonical [`SequenceVariant`].
///
/// Tries, in order: the colon/hyphen separated grammars, the canonical SPDI
/// grammar, and finally `normalizer` for dbSNP/HGVS/ClinVar inputs. Only a
/// structured [`Error::ParseError`] falls through to the next strategy; any other
/// error (e.g. [`Error::InvalidPosition`]) is returned immediately.
pub fn resolve(
    value: &str,
    default_assembly: GenomeRelease,
    normalizer: &dyn RemoteVariantNormalizer,
) -> Result<SequenceVariant> {
    match parse_separated(value, default_assembly) {
        Ok(variant) => return Ok(variant),
        Err(Error::ParseError(_)) => {}
        Err(other) => return Err(other),
    }

    match parse_canonical_spdi(value) {
        Ok(variant) => return Ok(variant),
        Err(Error::ParseError(_)) => {}
        Err(other) => return Err(other),
    }

    normalizer.normalize(value, default_assembly)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("13-20189547-G-A", GenomeRelease::Grch38, "13", 20189547, "G", "A")]
    #[case("GRCh37-13-20189547-G-A", GenomeRelease::Grch38, "13", 20189547, "G", "A")]
    #[case("chr1-1000-A-T", GenomeRelease::Grch38, "1", 1000, "A", "T")]
    #[case("1:1000:A:T", GenomeRelease::Grch38, "1", 1000, "A", "T")]
    fn resolve_gnomad_and_relaxed_spdi(
        #[case] input: &str,
        #[case] default_assembly: GenomeRelease,
        #[case] chrom: &str,
        #[case] pos: u64,
        #[case] delete: &str,
        #[case] insert: &str,
    ) {
        let v = resolve(input, default_assembly, &NoRemoteNormalizer).unwrap();
        assert_eq!(chrom, v.chromosome);
        assert_eq!(pos, v.position);
        assert_eq!(delete, v.deleted);
        assert_eq!(insert, v.inserted);
        // For inputs carrying an explicit assembly token, the parsed assembly wins.
        if input.to_ascii_lowercase().starts_with("grch37") {
            assert_eq!(GenomeRelease::Grch37, v.assembly);
        }
    }

    #[test]
    fn resolve_canonical_spdi() {
        let v = resolve("NC_000001.11:69090:A:G", GenomeRelease::Grch38, &NoRemoteNormalizer)
            .unwrap();
        assert_eq!(GenomeRelease::Grch38, v.assembly);
        assert_eq!("1", v.chromosome);
        assert_eq!(69090, v.position);
    }

    #[test]
    fn resolve_unknown_refseq_accession_fails() {
        let err = resolve("NC_999999.1:100:A:T", GenomeRelease::Grch38, &NoRemoteNormalizer);
        assert!(matches!(err, Err(Error::ParseError(_))));
    }

    #[test]
    fn resolve_falls_through_to_remote_normalizer() {
        let err = resolve("rs121913529", GenomeRelease::Grch38, &NoRemoteNormalizer);
        assert!(matches!(err, Err(Error::ParseError(_))));
    }

    #[test]
    fn resolve_render_round_trip() {
        let v = SequenceVariant::new(GenomeRelease::Grch38, "1", 1000, "A", "T", None).unwrap();
        let rendered = format!("{}-{}-{}-{}-{}", v.assembly, v.chromosome, v.position, v.deleted, v.inserted);
        let reparsed = resolve(&rendered, GenomeRelease::Grch38, &NoRemoteNormalizer).unwrap();
        assert_eq!(v, reparsed);
    }
}
