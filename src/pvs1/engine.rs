//! The PVS1 decision engine (C8): dispatches on consequence category and drives
//! the published decision tree, invoking the C7 predicates in the tree's exact
//! textual order.

use crate::annos::AnnotationClient;
use crate::consequence::ConsequenceCategory;
use crate::err::{Error, Result};
use crate::pvs1::helpers;
use crate::splicing::SplicingPredictor;
use crate::transcripts::TranscriptSelection;
use crate::variant::SequenceVariant;

/// HGNC identifier for PTEN, which overrides the usual nonsense/frameshift tree.
const PTEN_HGNC_ID: &str = "HGNC:9588";
const PTEN_PROTEIN_POSITION_CUTOFF: u64 = 374;

/// A cooperative cancellation signal the engine polls between predicates.
///
/// `classify` checks this between every two predicate invocations (never mid-
/// predicate) and aborts with [`Error::Cancelled`] without emitting a verdict
/// the moment it fires.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that never fires, for callers that run `classify` to completion
/// unconditionally (e.g. the CLI's single one-shot invocation).
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

fn check_cancelled(token: &dyn CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// The strength of evidence the engine assigns a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VerdictLevel {
    Pvs1,
    Pvs1Strong,
    Pvs1Moderate,
    Pvs1Supporting,
    NotPvs1,
    UnsupportedConsequence,
    NotSet,
}

/// The decision-tree leaf a classification terminated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PathLabel {
    Pten,
    Nf1,
    Nf2,
    Nf3,
    Nf4,
    Nf5,
    Nf6,
    Ss1,
    Ss2,
    Ss3,
    Ss4,
    Ss5,
    Ss6,
    Ss7,
    Ss8,
    Ss9,
    Ss10,
    Ic1,
    Ic2,
    Ic3,
    NotSet,
}

/// The engine's output: the evidence level, the decision-tree leaf reached, and
/// an accumulated human-readable rationale.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Verdict {
    pub level: VerdictLevel,
    pub path: PathLabel,
    pub rationale: String,
}

fn require_u64(value: Option<u64>, what: &str) -> Result<u64> {
    value.ok_or_else(|| Error::MissingData(format!("{what} is required but absent")))
}

/// Run the PVS1 decision tree against a fully resolved transcript selection.
///
/// Predicates are invoked in exactly the order the published decision tree reads;
/// a branch that does not need a predicate's result never calls it.
pub fn classify(
    selection: &TranscriptSelection,
    variant: &SequenceVariant,
    annotation_client: &dyn AnnotationClient,
    splicing: &dyn SplicingPredictor,
    cancellation: &dyn CancellationToken,
) -> Result<Verdict> {
    let mut rationale = String::new();
    let hgnc_id = selection.gene_hgnc_id().to_string();
    let strand = selection.strand();
    let exons = selection.exons().to_vec();
    let tags = selection.transcript_tags().to_vec();
    let consequences = selection.selected_variant_transcript.consequences.clone();
    let cds_info = selection.cds_info();
    let main_accession = selection.hgvs_id().to_string();

    match selection.consequence_category {
        ConsequenceCategory::NonsenseFrameshift => {
            rationale.push_str("Analysing as nonsense or frameshift variant. =>\n");

            let protein_position = selection.protein_position();
            if hgnc_id == PTEN_HGNC_ID {
                if let Some(pos) = protein_position {
                    if pos < PTEN_PROTEIN_POSITION_CUTOFF {
                        rationale.push_str(&format!(
                            "Variant is in PTEN ({hgnc_id}); premature stop at protein position {pos} < {PTEN_PROTEIN_POSITION_CUTOFF}. "
                        ));
                        return Ok(Verdict { level: VerdictLevel::Pvs1, path: PathLabel::Pten, rationale });
                    }
                }
            }

            let tx_pos_with_utr = require_u64(selection.tx_position_with_utr(), "tx_position_with_utr")?;
            if helpers::undergo_nmd(tx_pos_with_utr as i64, &hgnc_id, strand, &exons, &mut rationale)? {
                rationale.push_str(" =>\n");
                check_cancelled(cancellation)?;
                if helpers::in_biorelevant_transcript(&tags, &mut rationale) {
                    Ok(Verdict { level: VerdictLevel::Pvs1, path: PathLabel::Nf1, rationale })
                } else {
                    Ok(Verdict { level: VerdictLevel::NotPvs1, path: PathLabel::Nf2, rationale })
                }
            } else {
                rationale.push_str(" =>\n");
                check_cancelled(cancellation)?;
                if helpers::critical_for_protein_function(
                    annotation_client,
                    variant,
                    &exons,
                    strand,
                    &mut rationale,
                )? {
                    Ok(Verdict { level: VerdictLevel::Pvs1Strong, path: PathLabel::Nf3, rationale })
                } else {
                    rationale.push_str(" =>\n");
                    check_cancelled(cancellation)?;
                    let frequent =
                        helpers::lof_frequent_in_population(annotation_client, variant, &exons, &mut rationale)?;
                    let biorelevant = helpers::in_biorelevant_transcript(&tags, &mut rationale);
                    if frequent || !biorelevant {
                        Ok(Verdict { level: VerdictLevel::NotPvs1, path: PathLabel::Nf4, rationale })
                    } else {
                        rationale.push_str(" =>\n");
                        check_cancelled(cancellation)?;
                        let protein_length = require_u64(selection.protein_length(), "protein_length")?;
                        let protein_position = require_u64(protein_position, "protein_position")?;
                        if helpers::lof_removes_gt_10pct(protein_position, protein_length, &mut rationale) {
                            Ok(Verdict { level: VerdictLevel::Pvs1Strong, path: PathLabel::Nf5, rationale })
                        } else {
                            Ok(Verdict { level: VerdictLevel::Pvs1Moderate, path: PathLabel::Nf6, rationale })
                        }
                    }
                }
            }
        }

        ConsequenceCategory::SpliceSites => {
            rationale.push_str("Analysing as splice site variant. =>\n");

            let disrupts = helpers::exon_skip_or_cryptic_ss_disrupt(
                splicing,
                variant,
                &exons,
                &consequences,
                &mut rationale,
            )?;

            if disrupts {
                check_cancelled(cancellation)?;
                let tx_pos_with_utr =
                    require_u64(selection.tx_position_with_utr(), "tx_position_with_utr")?;
                let nmd =
                    helpers::undergo_nmd(tx_pos_with_utr as i64, &hgnc_id, strand, &exons, &mut rationale)?;
                if nmd {
                    rationale.push_str(" =>\n");
                    check_cancelled(cancellation)?;
                    if helpers::in_biorelevant_transcript(&tags, &mut rationale) {
                        Ok(Verdict { level: VerdictLevel::Pvs1, path: PathLabel::Ss1, rationale })
                    } else {
                        Ok(Verdict { level: VerdictLevel::NotPvs1, path: PathLabel::Ss2, rationale })
                    }
                } else {
                    rationale.push_str(" =>\n");
                    check_cancelled(cancellation)?;
                    splice_tail(
                        annotation_client,
                        variant,
                        &exons,
                        strand,
                        &tags,
                        selection,
                        cancellation,
                        &mut rationale,
                        PathLabel::Ss3,
                        PathLabel::Ss4,
                        PathLabel::Ss5,
                        PathLabel::Ss6,
                    )
                }
            } else {
                rationale.push_str(" =>\n");
                check_cancelled(cancellation)?;
                splice_tail(
                    annotation_client,
                    variant,
                    &exons,
                    strand,
                    &tags,
                    selection,
                    cancellation,
                    &mut rationale,
                    PathLabel::Ss10,
                    PathLabel::Ss7,
                    PathLabel::Ss8,
                    PathLabel::Ss9,
                )
            }
        }

        ConsequenceCategory::InitiationCodon => {
            rationale.push_str("Analysing as initiation codon variant. =>\n");
            if helpers::alternative_start_codon(&cds_info, &main_accession, &mut rationale)? {
                Ok(Verdict { level: VerdictLevel::NotPvs1, path: PathLabel::Ic3, rationale })
            } else {
                rationale.push_str(" =>\n");
                check_cancelled(cancellation)?;
                if helpers::upstream_pathogenic_variants(
                    annotation_client,
                    variant,
                    &exons,
                    strand,
                    &cds_info,
                    &main_accession,
                    &mut rationale,
                )? {
                    Ok(Verdict { level: VerdictLevel::Pvs1Moderate, path: PathLabel::Ic1, rationale })
                } else {
                    Ok(Verdict { level: VerdictLevel::Pvs1Supporting, path: PathLabel::Ic2, rationale })
                }
            }
        }

        ConsequenceCategory::Missense | ConsequenceCategory::NotSet => {
            rationale.push_str(&format!(
                "Variant consequence category is {:?}; PVS1 criteria cannot be applied. ",
                selection.consequence_category
            ));
            Ok(Verdict {
                level: VerdictLevel::UnsupportedConsequence,
                path: PathLabel::NotSet,
                rationale,
            })
        }
    }
}

/// The shared tail of the "disrupts" and "does not disrupt" splice-site
/// branches: both end in `critical_for_protein_function` -> `lof_frequent_in_population`
/// / `in_biorelevant_transcript` -> `lof_removes_gt_10pct`, differing only in
/// which path labels they terminate at.
///
/// The `¬D` branch (SS10) reaches the same shape of tree as the `D ∧ ¬N` branch's
/// `critical_for_protein_function` leaf (SS3); this duplication is preserved from
/// the published decision tree rather than merged.
#[allow(clippy::too_many_arguments)]
fn splice_tail(
    annotation_client: &dyn AnnotationClient,
    variant: &SequenceVariant,
    exons: &[crate::transcripts::Exon],
    strand: crate::transcripts::Strand,
    tags: &[String],
    selection: &TranscriptSelection,
    cancellation: &dyn CancellationToken,
    rationale: &mut String,
    critical_path: PathLabel,
    not_frequent_path: PathLabel,
    removes_path: PathLabel,
    moderate_path: PathLabel,
) -> Result<Verdict> {
    if helpers::critical_for_protein_function(annotation_client, variant, exons, strand, rationale)? {
        return Ok(Verdict { level: VerdictLevel::Pvs1Strong, path: critical_path, rationale: rationale.clone() });
    }
    rationale.push_str(" =>\n");
    check_cancelled(cancellation)?;
    let frequent = helpers::lof_frequent_in_population(annotation_client, variant, exons, rationale)?;
    let biorelevant = helpers::in_biorelevant_transcript(tags, rationale);
    if frequent || !biorelevant {
        return Ok(Verdict { level: VerdictLevel::NotPvs1, path: not_frequent_path, rationale: rationale.clone() });
    }
    rationale.push_str(" =>\n");
    check_cancelled(cancellation)?;
    let protein_length = require_u64(selection.protein_length(), "protein_length")?;
    let protein_position = require_u64(selection.protein_position(), "protein_position")?;
    if helpers::lof_removes_gt_10pct(protein_position, protein_length, rationale) {
        Ok(Verdict { level: VerdictLevel::Pvs1Strong, path: removes_path, rationale: rationale.clone() })
    } else {
        Ok(Verdict { level: VerdictLevel::Pvs1Moderate, path: moderate_path, rationale: rationale.clone() })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annos::VariantAnnotation;
    use crate::common::GenomeRelease;
    use crate::splicing::{CrypticSite, SpliceType};
    use crate::transcripts::{Exon, ProteinPos, Strand, TranscriptGene, TranscriptSeqvar, TxPos};

    struct EmptyAnnotationClient;

    impl AnnotationClient for EmptyAnnotationClient {
        fn variant_info(&self, _variant: &SequenceVariant) -> Result<VariantAnnotation> {
            Ok(VariantAnnotation::default())
        }
        fn variants_in_range(
            &self,
            _variant: &SequenceVariant,
            _start: u64,
            _end: u64,
        ) -> Result<Vec<VariantAnnotation>> {
            Ok(vec![])
        }
        fn transcripts_for_variant(
            &self,
            _variant: &SequenceVariant,
            _assembly: GenomeRelease,
        ) -> Result<(Vec<TranscriptSeqvar>, Vec<TranscriptGene>)> {
            Ok((vec![], vec![]))
        }
    }

    struct NoSplicing;

    impl SplicingPredictor for NoSplicing {
        fn reference_sequence(&self, _start: i64, _end: i64) -> Result<String> {
            Ok(String::new())
        }
        fn determine_splice_type(&self, _consequences: &[String]) -> SpliceType {
            SpliceType::Unknown
        }
        fn cryptic_sites(&self, _window: &str, _splice_type: SpliceType) -> Result<Vec<CrypticSite>> {
            Ok(vec![])
        }
    }

    fn variant() -> SequenceVariant {
        SequenceVariant::new(GenomeRelease::Grch38, "13", 20189547, "G", "A", None).unwrap()
    }

    fn gene_tx(ac: &str, strand: Strand, exons: Vec<Exon>) -> TranscriptGene {
        TranscriptGene {
            tx_ac: ac.to_string(),
            strand,
            start_codon: Some(0),
            stop_codon: Some(900),
            cds_start: 0,
            cds_end: 900,
            exons,
        }
    }

    fn selection_for(
        hgnc_id: &str,
        consequences: Vec<&str>,
        category: ConsequenceCategory,
        protein_pos: u64,
        protein_total: u64,
        tx_pos_with_utr: u64,
        exons: Vec<Exon>,
    ) -> TranscriptSelection {
        let variant_tx = TranscriptSeqvar {
            tx_ac: "NM_1.1".to_string(),
            hgnc_id: hgnc_id.to_string(),
            consequences: consequences.into_iter().map(|s| s.to_string()).collect(),
            feature_tags: vec!["ManeSelect".to_string()],
            tx_pos_with_utr: Some(TxPos { ord: tx_pos_with_utr }),
            protein_pos: Some(ProteinPos { ord: protein_pos, total: protein_total }),
        };
        let gene_transcript = gene_tx("NM_1.1", Strand::Plus, exons);
        TranscriptSelection {
            selected_variant_transcript: variant_tx,
            selected_gene_transcript: gene_transcript.clone(),
            all_variant_transcripts: vec![],
            all_gene_transcripts: vec![gene_transcript],
            consequence_category: category,
        }
    }

    #[test]
    fn pten_override_wins_for_early_stop() {
        let exons = vec![
            Exon { alt_start: 0, alt_end: 300, alt_cds_start: 0, alt_cds_end: 300, ord: 0 },
            Exon { alt_start: 300, alt_end: 900, alt_cds_start: 300, alt_cds_end: 900, ord: 1 },
        ];
        let selection = selection_for(
            "HGNC:9588",
            vec!["frameshift_variant"],
            ConsequenceCategory::NonsenseFrameshift,
            200,
            403,
            100,
            exons,
        );
        let verdict =
            classify(&selection, &variant(), &EmptyAnnotationClient, &NoSplicing, &NeverCancelled).unwrap();
        assert_eq!(VerdictLevel::Pvs1, verdict.level);
        assert_eq!(PathLabel::Pten, verdict.path);
    }

    #[test]
    fn gjb2_single_exon_undergoes_nmd_and_is_mane_select() {
        let exons = vec![Exon { alt_start: 0, alt_end: 900, alt_cds_start: 0, alt_cds_end: 900, ord: 0 }];
        let selection = selection_for(
            "HGNC:4284",
            vec!["stop_gained"],
            ConsequenceCategory::NonsenseFrameshift,
            50,
            226,
            100,
            exons,
        );
        let verdict =
            classify(&selection, &variant(), &EmptyAnnotationClient, &NoSplicing, &NeverCancelled).unwrap();
        assert_eq!(VerdictLevel::Pvs1, verdict.level);
        assert_eq!(PathLabel::Nf1, verdict.path);
    }

    #[test]
    fn missense_is_unsupported() {
        let exons = vec![Exon { alt_start: 0, alt_end: 900, alt_cds_start: 0, alt_cds_end: 900, ord: 0 }];
        let selection = selection_for(
            "HGNC:1",
            vec!["missense_variant"],
            ConsequenceCategory::Missense,
            50,
            300,
            100,
            exons,
        );
        let verdict =
            classify(&selection, &variant(), &EmptyAnnotationClient, &NoSplicing, &NeverCancelled).unwrap();
        assert_eq!(VerdictLevel::UnsupportedConsequence, verdict.level);
        assert_eq!(PathLabel::NotSet, verdict.path);
    }

    #[test]
    fn initiation_codon_with_no_alternative_start_and_no_upstream_pathogenic_is_supporting() {
        let exons = vec![Exon { alt_start: 0, alt_end: 900, alt_cds_start: 0, alt_cds_end: 900, ord: 0 }];
        let selection = selection_for(
            "HGNC:1",
            vec!["initiator_codon_variant"],
            ConsequenceCategory::InitiationCodon,
            1,
            300,
            10,
            exons,
        );
        let verdict =
            classify(&selection, &variant(), &EmptyAnnotationClient, &NoSplicing, &NeverCancelled).unwrap();
        assert_eq!(VerdictLevel::Pvs1Supporting, verdict.level);
        assert_eq!(PathLabel::Ic2, verdict.path);
    }

    struct AlwaysCancelled;

    impl CancellationToken for AlwaysCancelled {
        fn is_cancelled(&self) -> bool {
            true
        }
    }

    #[test]
    fn cancellation_aborts_between_predicates_without_a_verdict() {
        let exons = vec![Exon { alt_start: 0, alt_end: 900, alt_cds_start: 0, alt_cds_end: 900, ord: 0 }];
        let selection = selection_for(
            "HGNC:1",
            vec!["stop_gained"],
            ConsequenceCategory::NonsenseFrameshift,
            50,
            300,
            850,
            exons,
        );
        let err = classify(&selection, &variant(), &EmptyAnnotationClient, &NoSplicing, &AlwaysCancelled)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
