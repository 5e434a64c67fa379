//! PVS1 classification for human sequence variants.
//!
//! Classifies a single variant against the ACMG/AMP PVS1 ("Pathogenic Very
//! Strong #1") evidence criterion, producing a graded verdict, a decision-tree
//! path label, and a rationale. See [`pvs1::classify`] for the entry point.

pub mod annos;
pub mod common;
pub mod consequence;
pub mod err;
pub mod pvs1;
pub mod splicing;
pub mod transcripts;
pub mod variant;
