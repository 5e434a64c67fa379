//! The eight PVS1 helper predicates (C7).
//!
//! Each predicate takes exactly the inputs it needs and appends a short
//! rationale sentence to the caller's running commentary buffer.

use indexmap::IndexMap;

use crate::annos::AnnotationClient;
use crate::consequence::{self, ConsequenceCategory};
use crate::err::{Error, Result};
use crate::splicing::SplicingPredictor;
use crate::transcripts::{Exon, Strand, TranscriptCds};
use crate::variant::SequenceVariant;

/// The GJB2 (hearing loss) gene always undergoes NMD regardless of geometry.
const GJB2_HGNC_ID: &str = "HGNC:4284";

/// Convert an unusable-but-present collaborator payload into an internal
/// algorithm failure. A predicate never lets a bare `InvalidApiResponse`
/// propagate past it: the engine does not silently downgrade a verdict, but it
/// also never surfaces a raw transport/decode error from deep inside a
/// predicate to a `classify()` caller.
fn as_algorithm_error(err: Error) -> Error {
    match err {
        Error::InvalidApiResponse(msg) => Error::AlgorithmError(msg),
        other => other,
    }
}

/// `undergo_nmd` — is the new stop codon close enough to the last exon-exon
/// junction to trigger nonsense-mediated decay?
pub fn undergo_nmd(
    new_stop_tx_position: i64,
    hgnc_id: &str,
    strand: Strand,
    exons: &[Exon],
    rationale: &mut String,
) -> Result<bool> {
    if hgnc_id == GJB2_HGNC_ID {
        rationale.push_str("Variant is in the GJB2 gene, always predicted to undergo NMD. ");
        return Ok(true);
    }
    if exons.is_empty() {
        return Err(Error::MissingData("exons are required to determine NMD".into()));
    }

    let mut sizes: Vec<i64> = exons.iter().map(|e| e.alt_cds_end - e.alt_cds_start + 1).collect();
    if strand == Strand::Minus {
        sizes.reverse();
    }

    if sizes.len() == 1 {
        rationale.push_str("Only one exon, predicted to escape NMD. ");
        return Ok(false);
    }

    let cutoff = sizes[..sizes.len() - 1].iter().sum::<i64>() - 50.min(sizes[sizes.len() - 2]);
    let undergoes = new_stop_tx_position <= cutoff;
    rationale.push_str(&format!(
        "New stop codon at {new_stop_tx_position}, NMD cutoff {cutoff}, predicted to {} NMD. ",
        if undergoes { "undergo" } else { "escape" }
    ));
    Ok(undergoes)
}

/// `in_biorelevant_transcript` — is the selected transcript tagged `ManeSelect`?
pub fn in_biorelevant_transcript(tags: &[String], rationale: &mut String) -> bool {
    let relevant = tags.iter().any(|t| t == "ManeSelect");
    rationale.push_str(&format!(
        "Transcript tags: [{}], {}in a biologically relevant transcript. ",
        tags.join(", "),
        if relevant { "" } else { "not " }
    ));
    relevant
}

fn altered_region(variant: &SequenceVariant, exons: &[Exon], strand: Strand) -> Result<(i64, i64)> {
    if exons.is_empty() {
        return Err(Error::MissingData("exons are required to compute the altered region".into()));
    }
    let pos = variant.position as i64;
    Ok(match strand {
        Strand::Plus => (pos, exons[exons.len() - 1].alt_end),
        Strand::Minus => (exons[0].alt_start, pos),
    })
}

/// `critical_for_protein_function` — does the region downstream of the new stop
/// codon carry a disproportionate share of pathogenic ClinVar variants?
pub fn critical_for_protein_function(
    client: &dyn AnnotationClient,
    variant: &SequenceVariant,
    exons: &[Exon],
    strand: Strand,
    rationale: &mut String,
) -> Result<bool> {
    let (start, end) = altered_region(variant, exons, strand)?;
    if end < start {
        return Err(Error::AlgorithmError(format!(
            "altered region end {end} is before start {start}"
        )));
    }
    let annotations = client
        .variants_in_range(variant, start as u64, end as u64)
        .map_err(as_algorithm_error)?;
    let with_clinvar: Vec<_> = annotations.iter().filter_map(|a| a.clinvar.as_ref()).collect();
    let total = with_clinvar.len();
    let pathogenic = with_clinvar.iter().filter(|c| c.is_pathogenic()).count();

    rationale.push_str(&format!(
        "Found {pathogenic} pathogenic of {total} total ClinVar records in {start}-{end}. "
    ));
    if total == 0 {
        rationale.push_str("No ClinVar records, predicted to be non-critical. ");
        return Ok(false);
    }
    let critical = pathogenic as f64 / total as f64 > 0.05;
    rationale.push_str(if critical {
        "Pathogenic fraction exceeds 5%, predicted to be critical. "
    } else {
        "Pathogenic fraction does not exceed 5%, predicted to be non-critical. "
    });
    Ok(critical)
}

/// `lof_frequent_in_population` — is the LoF consequence at this exon common in
/// gnomAD genomes?
pub fn lof_frequent_in_population(
    client: &dyn AnnotationClient,
    variant: &SequenceVariant,
    exons: &[Exon],
    rationale: &mut String,
) -> Result<bool> {
    let pos = variant.position as i64;
    let exon = exons
        .iter()
        .find(|e| e.alt_start <= pos && pos <= e.alt_end)
        .ok_or_else(|| Error::AlgorithmError(format!("no exon contains position {pos}")))?;

    let annotations = client
        .variants_in_range(variant, exon.alt_start as u64, exon.alt_end as u64)
        .map_err(as_algorithm_error)?;
    let nonsense_tokens = consequence::tokens_for(ConsequenceCategory::NonsenseFrameshift);

    let mut lof = 0u64;
    let mut frequent_lof = 0u64;
    for annotation in &annotations {
        let Some(gnomad) = &annotation.gnomad_genomes else { continue };
        for vep in &gnomad.vep {
            if !nonsense_tokens.contains(&vep.consequence.as_str()) {
                continue;
            }
            lof += 1;
            if gnomad.exceeds_af_popmax(0.001) {
                frequent_lof += 1;
            }
        }
    }

    rationale.push_str(&format!(
        "Found {frequent_lof} frequent of {lof} total LoF variants in exon {}-{}. ",
        exon.alt_start, exon.alt_end
    ));
    if lof == 0 {
        rationale.push_str("No LoF variants found, predicted to be non-frequent. ");
        return Ok(false);
    }
    let frequent = frequent_lof as f64 / lof as f64 > 0.1;
    rationale.push_str(if frequent {
        "Frequent-LoF fraction exceeds 10%, predicted to be frequent. "
    } else {
        "Frequent-LoF fraction does not exceed 10%, predicted to be non-frequent. "
    });
    Ok(frequent)
}

/// `lof_removes_gt_10pct` — does the truncation remove more than a tenth of the protein?
pub fn lof_removes_gt_10pct(protein_position: u64, protein_length: u64, rationale: &mut String) -> bool {
    let removes = protein_position as f64 / protein_length as f64 > 0.1;
    rationale.push_str(&format!(
        "Variant removes {protein_position} of {protein_length} amino acids, {} 10% of the protein. ",
        if removes { "more than" } else { "less than" }
    ));
    removes
}

/// `exon_skip_or_cryptic_ss_disrupt` — does the variant's exon disrupt the reading
/// frame on skipping, or create a cryptic splice site that does?
pub fn exon_skip_or_cryptic_ss_disrupt(
    splicing: &dyn SplicingPredictor,
    variant: &SequenceVariant,
    exons: &[Exon],
    consequences: &[String],
    rationale: &mut String,
) -> Result<bool> {
    let pos = variant.position as i64;
    let exon = exons
        .iter()
        .find(|e| e.alt_start - 9 <= pos && pos <= e.alt_end + 23)
        .ok_or_else(|| Error::AlgorithmError(format!("no affected exon for position {pos}")))?;

    rationale.push_str(&format!("Affected exon: {}-{}. ", exon.alt_start, exon.alt_end));
    if (exon.alt_end - exon.alt_start) % 3 != 0 {
        rationale.push_str("Exon length is not a multiple of 3, predicted to cause exon skipping. ");
        return Ok(true);
    }
    rationale.push_str("Exon length is a multiple of 3, reading frame preserved on skipping. ");

    let window = splicing.reference_sequence(pos - 20, pos + 20).map_err(as_algorithm_error)?;
    let splice_type = splicing.determine_splice_type(consequences);
    let cryptic_sites = splicing.cryptic_sites(&window, splice_type).map_err(as_algorithm_error)?;

    for site in &cryptic_sites {
        if (site.position - pos).abs() % 3 != 0 {
            rationale.push_str(&format!(
                "Cryptic splice site at {} (score {:.2}) is out of frame, disruption predicted. ",
                site.position, site.max_entropy_score
            ));
            return Ok(true);
        }
    }
    rationale.push_str("All cryptic splice sites preserve reading frame. ");
    Ok(false)
}

fn start_codon_anchor(cds: &TranscriptCds) -> i64 {
    match cds.strand {
        Strand::Plus => cds.cds_start,
        Strand::Minus => cds.cds_end,
    }
}

/// The coordinate of the nearest alternative in-frame start codon, among
/// transcripts sharing the main transcript's strand, or `None` if none exists.
fn closest_alt_start_codon(
    cds_info: &IndexMap<String, TranscriptCds>,
    main_accession: &str,
) -> Result<Option<i64>> {
    let main = cds_info
        .get(main_accession)
        .ok_or_else(|| Error::MissingData(format!("{main_accession} not found in cds_info")))?;
    let main_anchor = start_codon_anchor(main);

    let mut closest = None;
    for (accession, cds) in cds_info {
        if accession == main_accession || cds.strand != main.strand {
            continue;
        }
        let alt_anchor = start_codon_anchor(cds);
        if alt_anchor == main_anchor {
            continue;
        }
        closest = match closest {
            None => Some(alt_anchor),
            Some(current) if (alt_anchor - main_anchor).abs() < (current - main_anchor).abs() => {
                Some(alt_anchor)
            }
            other => other,
        };
    }
    Ok(closest)
}

/// `alternative_start_codon` — does another transcript on the same strand use a
/// different start-codon coordinate?
pub fn alternative_start_codon(
    cds_info: &IndexMap<String, TranscriptCds>,
    main_accession: &str,
    rationale: &mut String,
) -> Result<bool> {
    match closest_alt_start_codon(cds_info, main_accession)? {
        Some(alt) => {
            rationale.push_str(&format!("Alternative start codon found at {alt}. "));
            Ok(true)
        }
        None => {
            rationale.push_str("No alternative start codon found. ");
            Ok(false)
        }
    }
}

/// `upstream_pathogenic_variants` — are there pathogenic ClinVar records between
/// the start of the transcript and the closest alternative start codon?
pub fn upstream_pathogenic_variants(
    client: &dyn AnnotationClient,
    variant: &SequenceVariant,
    exons: &[Exon],
    strand: Strand,
    cds_info: &IndexMap<String, TranscriptCds>,
    main_accession: &str,
    rationale: &mut String,
) -> Result<bool> {
    if exons.is_empty() {
        return Err(Error::MissingData("exons are required to scan for upstream variants".into()));
    }
    let closest = closest_alt_start_codon(cds_info, main_accession)?.ok_or_else(|| {
        Error::AlgorithmError("no alternative start codon found, cannot scan upstream".into())
    })?;

    let (start, end) = match strand {
        Strand::Plus => (exons[0].alt_start, closest),
        Strand::Minus => (closest, exons[exons.len() - 1].alt_end),
    };
    if end < start {
        return Err(Error::AlgorithmError(format!(
            "upstream scan end {end} is before start {start}"
        )));
    }

    let annotations = client
        .variants_in_range(variant, start as u64, end as u64)
        .map_err(as_algorithm_error)?;
    let pathogenic = annotations
        .iter()
        .filter_map(|a| a.clinvar.as_ref())
        .filter(|c| c.is_pathogenic())
        .count();

    rationale.push_str(&format!(
        "Found {pathogenic} pathogenic variants upstream in {start}-{end}. "
    ));
    Ok(pathogenic > 0)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annos::VariantAnnotation;
    use crate::common::GenomeRelease;
    use crate::transcripts::TranscriptGene;

    fn exon(alt_start: i64, alt_end: i64, ord: i32) -> Exon {
        Exon {
            alt_start,
            alt_end,
            alt_cds_start: alt_start,
            alt_cds_end: alt_end,
            ord,
        }
    }

    struct FixedAnnotationClient {
        range: Vec<VariantAnnotation>,
    }

    impl AnnotationClient for FixedAnnotationClient {
        fn variant_info(&self, _variant: &SequenceVariant) -> Result<VariantAnnotation> {
            unimplemented!("not used by these tests")
        }

        fn variants_in_range(
            &self,
            _variant: &SequenceVariant,
            _start: u64,
            _end: u64,
        ) -> Result<Vec<VariantAnnotation>> {
            Ok(self.range.clone())
        }

        fn transcripts_for_variant(
            &self,
            _variant: &SequenceVariant,
            _assembly: GenomeRelease,
        ) -> Result<(Vec<crate::transcripts::TranscriptSeqvar>, Vec<TranscriptGene>)> {
            unimplemented!("not used by these tests")
        }
    }

    fn variant() -> SequenceVariant {
        SequenceVariant::new(GenomeRelease::Grch38, "13", 20189547, "G", "A", None).unwrap()
    }

    struct UnusableAnnotationClient;

    impl AnnotationClient for UnusableAnnotationClient {
        fn variant_info(&self, _variant: &SequenceVariant) -> Result<VariantAnnotation> {
            unimplemented!("not used by these tests")
        }

        fn variants_in_range(
            &self,
            _variant: &SequenceVariant,
            _start: u64,
            _end: u64,
        ) -> Result<Vec<VariantAnnotation>> {
            Err(Error::InvalidApiResponse("missing expected field".into()))
        }

        fn transcripts_for_variant(
            &self,
            _variant: &SequenceVariant,
            _assembly: GenomeRelease,
        ) -> Result<(Vec<crate::transcripts::TranscriptSeqvar>, Vec<TranscriptGene>)> {
            unimplemented!("not used by these tests")
        }
    }

    #[test]
    fn unusable_api_response_becomes_algorithm_error_not_raw() {
        let exons = vec![exon(0, 900, 0)];
        let mut rationale = String::new();
        let err = critical_for_protein_function(
            &UnusableAnnotationClient,
            &variant(),
            &exons,
            Strand::Plus,
            &mut rationale,
        )
        .unwrap_err();
        assert!(matches!(err, Error::AlgorithmError(_)));
    }

    #[test]
    fn undergo_nmd_always_true_for_gjb2() {
        let mut rationale = String::new();
        let result = undergo_nmd(10_000, "HGNC:4284", Strand::Plus, &[], &mut rationale).unwrap();
        assert!(result);
    }

    #[test]
    fn undergo_nmd_single_exon_escapes() {
        let mut rationale = String::new();
        let exons = vec![exon(0, 900, 0)];
        let result = undergo_nmd(50, "HGNC:1", Strand::Plus, &exons, &mut rationale).unwrap();
        assert!(!result);
    }

    #[test]
    fn undergo_nmd_last_exon_escapes() {
        let mut rationale = String::new();
        let exons = vec![exon(0, 100, 0), exon(100, 200, 1), exon(200, 900, 2)];
        // Stop codon falls in the last exon, well past the cutoff.
        let result = undergo_nmd(850, "HGNC:1", Strand::Plus, &exons, &mut rationale).unwrap();
        assert!(!result);
    }

    #[test]
    fn critical_for_protein_function_false_on_zero_records() {
        let client = FixedAnnotationClient { range: vec![] };
        let exons = vec![exon(0, 900, 0)];
        let mut rationale = String::new();
        let result =
            critical_for_protein_function(&client, &variant(), &exons, Strand::Plus, &mut rationale)
                .unwrap();
        assert!(!result);
    }

    #[test]
    fn lof_removes_gt_10pct_monotone_in_position() {
        let mut rationale = String::new();
        assert!(!lof_removes_gt_10pct(10, 403, &mut rationale));
        let mut rationale = String::new();
        assert!(lof_removes_gt_10pct(200, 403, &mut rationale));
    }

    #[test]
    fn alternative_start_codon_detects_difference() {
        let mut cds_info = IndexMap::new();
        cds_info.insert(
            "NM_1".to_string(),
            TranscriptCds {
                start_codon: Some(0),
                stop_codon: Some(900),
                cds_start: 0,
                cds_end: 900,
                strand: Strand::Plus,
                exons: vec![],
            },
        );
        cds_info.insert(
            "NM_2".to_string(),
            TranscriptCds {
                start_codon: Some(30),
                stop_codon: Some(900),
                cds_start: 30,
                cds_end: 900,
                strand: Strand::Plus,
                exons: vec![],
            },
        );
        let mut rationale = String::new();
        assert!(alternative_start_codon(&cds_info, "NM_1", &mut rationale).unwrap());
    }

    #[test]
    fn alternative_start_codon_false_when_only_main_transcript() {
        let mut cds_info = IndexMap::new();
        cds_info.insert(
            "NM_1".to_string(),
            TranscriptCds {
                start_codon: Some(0),
                stop_codon: Some(900),
                cds_start: 0,
                cds_end: 900,
                strand: Strand::Plus,
                exons: vec![],
            },
        );
        let mut rationale = String::new();
        assert!(!alternative_start_codon(&cds_info, "NM_1", &mut rationale).unwrap());
    }
}
