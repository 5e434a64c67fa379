//! The consequence classifier (C5): map raw VEP-style consequence tokens to the
//! four categories the PVS1 decision tree branches on.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The category a transcript's consequence falls into, driving which branch of
/// the PVS1 decision tree the engine takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ConsequenceCategory {
    NonsenseFrameshift,
    SpliceSites,
    InitiationCodon,
    Missense,
    NotSet,
}

/// Highest-to-lowest priority order used when a variant's consequences span
/// more than one category: the first category with at least one matching
/// token wins.
const PRIORITY: [ConsequenceCategory; 4] = [
    ConsequenceCategory::NonsenseFrameshift,
    ConsequenceCategory::SpliceSites,
    ConsequenceCategory::InitiationCodon,
    ConsequenceCategory::Missense,
];

/// The fixed VEP-consequence-token -> category lookup table.
///
/// Covers the full Ensembl VEP consequence ontology, not just the handful of
/// illustrative tokens spec examples name — an unrecognized token here would
/// silently route a real loss-of-function call to `NotSet`/`UnsupportedConsequence`
/// instead of through the tree that actually scores it.
static CONSEQUENCE_TABLE: Lazy<HashMap<&'static str, ConsequenceCategory>> = Lazy::new(|| {
    use ConsequenceCategory::*;
    HashMap::from([
        // Truncating / large-scale loss.
        ("transcript_ablation", NonsenseFrameshift),
        ("stop_gained", NonsenseFrameshift),
        ("frameshift_variant", NonsenseFrameshift),
        ("stop_lost", NonsenseFrameshift),
        ("feature_truncation", NonsenseFrameshift),
        ("3_prime_utr_variant", NonsenseFrameshift),
        ("3_prime_UTR_variant", NonsenseFrameshift),
        // Canonical and near-canonical splice sites.
        ("splice_donor_variant", SpliceSites),
        ("splice_acceptor_variant", SpliceSites),
        ("splice_region_variant", SpliceSites),
        ("splice_donor_5th_base_variant", SpliceSites),
        ("splice_donor_region_variant", SpliceSites),
        ("splice_polypyrimidine_tract_variant", SpliceSites),
        // Initiation-codon and upstream-of-start region.
        ("start_lost", InitiationCodon),
        ("initiator_codon_variant", InitiationCodon),
        ("start_retained_variant", InitiationCodon),
        ("upstream_gene_variant", InitiationCodon),
        ("downstream_gene_variant", InitiationCodon),
        ("5_prime_UTR_variant", InitiationCodon),
        // Protein-altering but not null, and ambiguous/low-impact coding terms:
        // routed through the engine's generic "not applicable to PVS1" leaf
        // rather than left unclassified.
        ("missense_variant", Missense),
        ("inframe_insertion", Missense),
        ("inframe_deletion", Missense),
        ("protein_altering_variant", Missense),
        ("incomplete_terminal_codon_variant", Missense),
        ("coding_sequence_variant", Missense),
        ("stop_retained_variant", Missense),
        ("synonymous_variant", Missense),
    ])
});

/// Return the list of raw VEP consequence tokens mapping to `category`, in table
/// order. Used by predicates that need to recognize a category by its raw
/// tokens (e.g. `lof_frequent_in_population`).
pub fn tokens_for(category: ConsequenceCategory) -> Vec<&'static str> {
    let mut tokens: Vec<&'static str> = CONSEQUENCE_TABLE
        .iter()
        .filter(|(_, v)| **v == category)
        .map(|(k, _)| *k)
        .collect();
    tokens.sort_unstable();
    tokens
}

/// Classify a transcript's raw consequences into the category the PVS1 engine
/// branches on. If any consequence maps to a category, the highest-priority
/// category present wins; otherwise [`ConsequenceCategory::NotSet`].
pub fn classify(consequences: &[String]) -> ConsequenceCategory {
    let present: std::collections::HashSet<ConsequenceCategory> = consequences
        .iter()
        .filter_map(|c| CONSEQUENCE_TABLE.get(c.as_str()).copied())
        .collect();

    PRIORITY
        .into_iter()
        .find(|category| present.contains(category))
        .unwrap_or(ConsequenceCategory::NotSet)
}
