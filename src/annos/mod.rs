//! The annotation client contract (C3): per-variant and per-range annotation
//! lookups, plus transcript descriptions.
//!
//! Transport is out of scope for this crate — what lives here is the
//! subset of the upstream JSON schema the engine actually reads, and the trait a
//! caller implements to supply it. [`client`] contains one concrete, HTTP-backed
//! implementation for callers that want it out of the box.

pub mod client;

use crate::common::GenomeRelease;
use crate::err::Result;
use crate::transcripts::{TranscriptGene, TranscriptSeqvar};
use crate::variant::SequenceVariant;

/// A single ClinVar germline classification, as returned by the annotation service.
///
/// Unknown fields are ignored; a missing `description` decodes to `None`, never to
/// a sentinel string that would pass a later equality check.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GermlineClassification {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Classifications {
    #[serde(rename = "germlineClassification")]
    pub germline_classification: Option<GermlineClassification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClinvarRecord {
    pub classifications: Option<Classifications>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Clinvar {
    #[serde(default)]
    pub records: Vec<ClinvarRecord>,
}

impl Clinvar {
    /// The germline classification description of this ClinVar entry's first
    /// record, following the path the spec reads: `records[0].classifications
    /// .germlineClassification.description`.
    pub fn first_description(&self) -> Option<&str> {
        self.records
            .first()?
            .classifications
            .as_ref()?
            .germline_classification
            .as_ref()?
            .description
            .as_deref()
    }

    /// True iff the first record's description is "Pathogenic" or "Likely pathogenic".
    pub fn is_pathogenic(&self) -> bool {
        matches!(self.first_description(), Some("Pathogenic") | Some("Likely pathogenic"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlleleCount {
    #[serde(rename = "afPopmax")]
    pub af_popmax: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VepEntry {
    pub consequence: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GnomadGenomes {
    #[serde(rename = "alleleCounts", default)]
    pub allele_counts: Vec<AlleleCount>,
    #[serde(default)]
    pub vep: Vec<VepEntry>,
}

impl GnomadGenomes {
    /// True iff any allele-count entry exceeds the given popmax allele frequency.
    pub fn exceeds_af_popmax(&self, threshold: f64) -> bool {
        self.allele_counts
            .iter()
            .any(|ac| ac.af_popmax.is_some_and(|af| af > threshold))
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dbnsfp {
    #[serde(rename = "HGVSp_VEP")]
    pub hgvsp_vep: Option<String>,
    #[serde(rename = "HGVSp_ANNOVAR")]
    pub hgvsp_annovar: Option<String>,
    #[serde(rename = "HGVSp_snpEff")]
    pub hgvsp_snpeff: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cadd {
    #[serde(rename = "PolyPhenVal")]
    pub polyphen_val: Option<f64>,
}

/// The subset of a per-variant annotation record the PVS1 engine reads.
/// Any other field present in the upstream payload is ignored by `serde`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariantAnnotation {
    pub clinvar: Option<Clinvar>,
    pub gnomad_genomes: Option<GnomadGenomes>,
    pub gnomad_exomes: Option<GnomadGenomes>,
    pub dbnsfp: Option<Dbnsfp>,
    pub cadd: Option<Cadd>,
}

/// Operations the PVS1 engine and its predicates perform against the annotation
/// service.
pub trait AnnotationClient {
    /// ClinVar record, CADD scores, dbNSFP protein-HGVS strings, and gnomAD allele
    /// counts for a single variant.
    fn variant_info(&self, variant: &SequenceVariant) -> Result<VariantAnnotation>;

    /// Every annotated variant overlapping `[start, end]` on the variant's contig
    /// and assembly, with ClinVar and gnomAD sub-fields populated.
    fn variants_in_range(
        &self,
        variant: &SequenceVariant,
        start: u64,
        end: u64,
    ) -> Result<Vec<VariantAnnotation>>;

    /// One record per transcript overlapping the variant, plus full gene-transcript
    /// geometry for the same set of accessions.
    fn transcripts_for_variant(
        &self,
        variant: &SequenceVariant,
        assembly: GenomeRelease,
    ) -> Result<(Vec<TranscriptSeqvar>, Vec<TranscriptGene>)>;
}
