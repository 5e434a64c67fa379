//! Transcript geometry (C4): exon/CDS data model and the preferred-pair selector.

use indexmap::IndexMap;

use crate::consequence::{self, ConsequenceCategory};

/// The genomic strand a transcript is transcribed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Strand {
    Plus,
    Minus,
}

/// One exon of a transcript, in transcription direction.
///
/// `alt_start`/`alt_end` are 0-based half-open coordinates on the reference;
/// `alt_cds_start`/`alt_cds_end` are the CDS-clipped equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Exon {
    pub alt_start: i64,
    pub alt_end: i64,
    pub alt_cds_start: i64,
    pub alt_cds_end: i64,
    pub ord: i32,
}

/// The CDS geometry of one transcript, independent of any particular variant.
/// This is the value stored in [`TranscriptSelection::cds_info`] for every
/// gene transcript overlapping the variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptCds {
    pub start_codon: Option<i64>,
    pub stop_codon: Option<i64>,
    pub cds_start: i64,
    pub cds_end: i64,
    pub strand: Strand,
    pub exons: Vec<Exon>,
}

/// 1-based position within the spliced transcript, including the 5' UTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TxPos {
    pub ord: u64,
}

/// 1-based position within the translated protein, and the protein's total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProteinPos {
    pub ord: u64,
    pub total: u64,
}

/// The variant's effect on a single overlapping transcript, as reported by the
/// annotation service.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptSeqvar {
    /// Transcript accession, e.g. `NM_000038.3`.
    pub tx_ac: String,
    /// The gene's HGNC identifier, e.g. `HGNC:9588`.
    pub hgnc_id: String,
    /// Raw VEP-style consequence tokens for this transcript.
    pub consequences: Vec<String>,
    /// Flat list of feature tags, e.g. `ManeSelect`.
    pub feature_tags: Vec<String>,
    pub tx_pos_with_utr: Option<TxPos>,
    pub protein_pos: Option<ProteinPos>,
}

/// The gene-transcript geometry for a single transcript accession.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptGene {
    pub tx_ac: String,
    pub strand: Strand,
    pub start_codon: Option<i64>,
    pub stop_codon: Option<i64>,
    pub cds_start: i64,
    pub cds_end: i64,
    pub exons: Vec<Exon>,
}

impl From<&TranscriptGene> for TranscriptCds {
    fn from(tx: &TranscriptGene) -> Self {
        TranscriptCds {
            start_codon: tx.start_codon,
            stop_codon: tx.stop_codon,
            cds_start: tx.cds_start,
            cds_end: tx.cds_end,
            strand: tx.strand,
            exons: tx.exons.clone(),
        }
    }
}

/// The result of running the transcript selector (C4) and consequence
/// classifier (C5) over the annotation service's response, plus the attributes
/// the PVS1 engine derives from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSelection {
    pub selected_variant_transcript: TranscriptSeqvar,
    pub selected_gene_transcript: TranscriptGene,
    pub all_variant_transcripts: Vec<TranscriptSeqvar>,
    pub all_gene_transcripts: Vec<TranscriptGene>,
    pub consequence_category: ConsequenceCategory,
}

impl TranscriptSelection {
    /// The transcript accession of the selected gene transcript.
    pub fn hgvs_id(&self) -> &str {
        &self.selected_gene_transcript.tx_ac
    }

    pub fn gene_hgnc_id(&self) -> &str {
        &self.selected_variant_transcript.hgnc_id
    }

    pub fn transcript_tags(&self) -> &[String] {
        &self.selected_variant_transcript.feature_tags
    }

    /// 1-based position within the spliced transcript, including the 5' UTR.
    pub fn tx_position_with_utr(&self) -> Option<u64> {
        self.selected_variant_transcript.tx_pos_with_utr.map(|p| p.ord)
    }

    pub fn protein_position(&self) -> Option<u64> {
        self.selected_variant_transcript.protein_pos.map(|p| p.ord)
    }

    pub fn protein_length(&self) -> Option<u64> {
        self.selected_variant_transcript.protein_pos.map(|p| p.total)
    }

    pub fn strand(&self) -> Strand {
        self.selected_gene_transcript.strand
    }

    pub fn exons(&self) -> &[Exon] {
        &self.selected_gene_transcript.exons
    }

    /// Mapping transcript accession -> CDS geometry, for every gene transcript
    /// overlapping the variant. Built in encounter order, matching the order
    /// `all_gene_transcripts` was returned in.
    pub fn cds_info(&self) -> IndexMap<String, TranscriptCds> {
        self.all_gene_transcripts
            .iter()
            .map(|tx| (tx.tx_ac.clone(), TranscriptCds::from(tx)))
            .collect()
    }
}

/// Choose the preferred variant-transcript + gene-transcript pair (C4).
///
/// Intersects the two accession sets, prefers the accession tagged `ManeSelect`
/// among the intersection, and otherwise tie-breaks on the lexicographically
/// smallest accession. Returns `None` if the lists are empty or disjoint.
pub fn select_transcript_pair(
    variant_transcripts: Vec<TranscriptSeqvar>,
    gene_transcripts: Vec<TranscriptGene>,
) -> Option<TranscriptSelection> {
    let gene_by_ac: IndexMap<&str, &TranscriptGene> =
        gene_transcripts.iter().map(|tx| (tx.tx_ac.as_str(), tx)).collect();

    let mut candidates: Vec<&TranscriptSeqvar> = variant_transcripts
        .iter()
        .filter(|tx| gene_by_ac.contains_key(tx.tx_ac.as_str()))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| a.tx_ac.cmp(&b.tx_ac));
    let chosen = candidates
        .iter()
        .find(|tx| tx.feature_tags.iter().any(|t| t == "ManeSelect"))
        .copied()
        .unwrap_or(candidates[0]);

    let selected_variant_transcript = chosen.clone();
    let selected_gene_transcript = (*gene_by_ac[chosen.tx_ac.as_str()]).clone();
    let consequence_category = consequence::classify(&selected_variant_transcript.consequences);

    Some(TranscriptSelection {
        selected_variant_transcript,
        selected_gene_transcript,
        all_variant_transcripts: variant_transcripts,
        all_gene_transcripts: gene_transcripts,
        consequence_category,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn gene_tx(ac: &str) -> TranscriptGene {
        TranscriptGene {
            tx_ac: ac.to_string(),
            strand: Strand::Plus,
            start_codon: Some(0),
            stop_codon: Some(900),
            cds_start: 0,
            cds_end: 900,
            exons: vec![],
        }
    }

    fn variant_tx(ac: &str, tags: &[&str]) -> TranscriptSeqvar {
        TranscriptSeqvar {
            tx_ac: ac.to_string(),
            hgnc_id: "HGNC:1".to_string(),
            consequences: vec!["stop_gained".to_string()],
            feature_tags: tags.iter().map(|s| s.to_string()).collect(),
            tx_pos_with_utr: Some(TxPos { ord: 100 }),
            protein_pos: Some(ProteinPos { ord: 30, total: 300 }),
        }
    }

    #[test]
    fn prefers_mane_select_among_intersection() {
        let variant_transcripts =
            vec![variant_tx("NM_000002.1", &[]), variant_tx("NM_000001.1", &["ManeSelect"])];
        let gene_transcripts = vec![gene_tx("NM_000001.1"), gene_tx("NM_000002.1")];

        let selection = select_transcript_pair(variant_transcripts, gene_transcripts).unwrap();
        assert_eq!("NM_000001.1", selection.hgvs_id());
    }

    #[test]
    fn tie_breaks_lexicographically_without_mane_select() {
        let variant_transcripts = vec![variant_tx("NM_000002.1", &[]), variant_tx("NM_000001.1", &[])];
        let gene_transcripts = vec![gene_tx("NM_000001.1"), gene_tx("NM_000002.1")];

        let selection = select_transcript_pair(variant_transcripts, gene_transcripts).unwrap();
        assert_eq!("NM_000001.1", selection.hgvs_id());
    }

    #[test]
    fn disjoint_lists_select_none() {
        let variant_transcripts = vec![variant_tx("NM_000003.1", &[])];
        let gene_transcripts = vec![gene_tx("NM_000001.1")];
        assert!(select_transcript_pair(variant_transcripts, gene_transcripts).is_none());
    }

    #[test]
    fn empty_lists_select_none() {
        assert!(select_transcript_pair(vec![], vec![]).is_none());
    }
}
