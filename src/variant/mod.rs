//! The sequence variant identity model (C1) and its resolver (C2).

pub mod resolver;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::common::GenomeRelease;
use crate::err::{Error, Result};

/// Hard-coded GRCh37 primary-assembly chromosome lengths, used only to validate
/// variant coordinates. Keyed by normalized chromosome name.
pub static CHROM_LENGTHS_37: Lazy<HashMap<&'static str, u64>> = Lazy::new(|| {
    HashMap::from([
        ("1", 249_250_621),
        ("2", 243_199_373),
        ("3", 198_022_430),
        ("4", 191_154_276),
        ("5", 180_915_260),
        ("6", 171_115_067),
        ("7", 159_138_663),
        ("8", 146_364_022),
        ("9", 141_213_431),
        ("10", 135_534_747),
        ("11", 135_006_516),
        ("12", 133_851_895),
        ("13", 115_169_878),
        ("14", 107_349_540),
        ("15", 102_531_392),
        ("16", 90_354_753),
        ("17", 81_195_210),
        ("18", 78_077_248),
        ("19", 59_128_983),
        ("20", 63_025_520),
        ("21", 48_129_895),
        ("22", 51_304_566),
        ("X", 155_270_560),
        ("Y", 59_373_566),
        ("MT", 16_569),
    ])
});

/// Hard-coded GRCh38 primary-assembly chromosome lengths.
pub static CHROM_LENGTHS_38: Lazy<HashMap<&'static str, u64>> = Lazy::new(|| {
    HashMap::from([
        ("1", 248_956_422),
        ("2", 242_193_529),
        ("3", 198_295_559),
        ("4", 190_214_555),
        ("5", 181_538_259),
        ("6", 170_805_979),
        ("7", 159_345_973),
        ("8", 145_138_636),
        ("9", 138_394_717),
        ("10", 133_797_422),
        ("11", 135_086_622),
        ("12", 133_275_309),
        ("13", 114_364_328),
        ("14", 107_043_718),
        ("15", 101_991_189),
        ("16", 90_338_345),
        ("17", 83_257_441),
        ("18", 80_373_285),
        ("19", 58_617_616),
        ("20", 64_444_167),
        ("21", 46_709_983),
        ("22", 50_818_468),
        ("X", 156_040_895),
        ("Y", 57_227_415),
        ("MT", 16_569),
    ])
});

/// Hard-coded `NC_*` RefSeq accession -> (assembly, normalized chromosome) table, used
/// to resolve canonical SPDI representations.
pub static REFSEQ_CHROM: Lazy<HashMap<&'static str, (GenomeRelease, &'static str)>> =
    Lazy::new(|| {
        use GenomeRelease::{Grch37, Grch38};
        HashMap::from([
            ("NC_000001.10", (Grch37, "1")),
            ("NC_000002.11", (Grch37, "2")),
            ("NC_000003.11", (Grch37, "3")),
            ("NC_000004.11", (Grch37, "4")),
            ("NC_000005.9", (Grch37, "5")),
            ("NC_000006.11", (Grch37, "6")),
            ("NC_000007.13", (Grch37, "7")),
            ("NC_000008.10", (Grch37, "8")),
            ("NC_000009.11", (Grch37, "9")),
            ("NC_000010.10", (Grch37, "10")),
            ("NC_000011.9", (Grch37, "11")),
            ("NC_000012.11", (Grch37, "12")),
            ("NC_000013.10", (Grch37, "13")),
            ("NC_000014.8", (Grch37, "14")),
            ("NC_000015.9", (Grch37, "15")),
            ("NC_000016.9", (Grch37, "16")),
            ("NC_000017.10", (Grch37, "17")),
            ("NC_000018.9", (Grch37, "18")),
            ("NC_000019.9", (Grch37, "19")),
            ("NC_000020.10", (Grch37, "20")),
            ("NC_000021.8", (Grch37, "21")),
            ("NC_000022.10", (Grch37, "22")),
            ("NC_000023.10", (Grch37, "X")),
            ("NC_000024.9", (Grch37, "Y")),
            ("NC_000001.11", (Grch38, "1")),
            ("NC_000002.12", (Grch38, "2")),
            ("NC_000003.12", (Grch38, "3")),
            ("NC_000004.12", (Grch38, "4")),
            ("NC_000005.10", (Grch38, "5")),
            ("NC_000006.12", (Grch38, "6")),
            ("NC_000007.14", (Grch38, "7")),
            ("NC_000008.11", (Grch38, "8")),
            ("NC_000009.12", (Grch38, "9")),
            ("NC_000010.11", (Grch38, "10")),
            ("NC_000011.10", (Grch38, "11")),
            ("NC_000012.12", (Grch38, "12")),
            ("NC_000013.11", (Grch38, "13")),
            ("NC_000014.9", (Grch38, "14")),
            ("NC_000015.10", (Grch38, "15")),
            ("NC_000016.10", (Grch38, "16")),
            ("NC_000017.11", (Grch38, "17")),
            ("NC_000018.10", (Grch38, "18")),
            ("NC_000019.10", (Grch38, "19")),
            ("NC_000020.11", (Grch38, "20")),
            ("NC_000021.9", (Grch38, "21")),
            ("NC_000022.11", (Grch38, "22")),
            ("NC_000023.11", (Grch38, "X")),
            ("NC_000024.10", (Grch38, "Y")),
            // The mitochondrial RefSeq accession is assembly-independent.
            ("NC_012920.1", (Grch38, "MT")),
        ])
    });

/// Normalize a chromosome token the way the resolver's grammars allow it: strip a
/// leading `chr` (case-insensitively) and fold `m`/`mt` to `MT`.
pub fn normalize_chromosome(raw: &str) -> String {
    let stripped = raw
        .strip_prefix("chr")
        .or_else(|| raw.strip_prefix("Chr"))
        .or_else(|| raw.strip_prefix("CHR"))
        .unwrap_or(raw);
    match stripped.to_ascii_uppercase().as_str() {
        "M" | "MT" => "MT".to_string(),
        other => other.to_string(),
    }
}

/// A canonical, immutable representation of a single human sequence variant.
///
/// Created exclusively by [`resolver::resolve`]; every invariant has already
/// been checked by the time a value of this type exists.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceVariant {
    pub assembly: GenomeRelease,
    pub chromosome: String,
    /// 1-based inclusive position of the first deleted base.
    pub position: u64,
    pub deleted: String,
    pub inserted: String,
    /// The original user-supplied string, retained for diagnostics.
    pub display: String,
}

fn is_acgt(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

impl SequenceVariant {
    /// Construct a variant and validate it against the model's invariants.
    pub fn new(
        assembly: GenomeRelease,
        chromosome: &str,
        position: u64,
        deleted: &str,
        inserted: &str,
        display: Option<String>,
    ) -> Result<Self> {
        let chromosome = normalize_chromosome(chromosome);
        let deleted = deleted.to_ascii_uppercase();
        let inserted = inserted.to_ascii_uppercase();
        let display = display.unwrap_or_else(|| {
            format!(
                "{}-{}-{}-{}-{}",
                assembly, chromosome, position, deleted, inserted
            )
        });
        let variant = Self {
            assembly,
            chromosome,
            position,
            deleted,
            inserted,
            display,
        };
        variant.validate()?;
        Ok(variant)
    }

    fn validate(&self) -> Result<()> {
        if self.position < 1 {
            return Err(Error::InvalidPosition(format!(
                "position must be >= 1, got {}",
                self.position
            )));
        }
        if !is_acgt(&self.deleted) || !is_acgt(&self.inserted) {
            return Err(Error::InvalidPosition(format!(
                "deleted/inserted alleles must be non-empty strings over {{A,C,G,T}}: {}/{}",
                self.deleted, self.inserted
            )));
        }
        let lengths = match self.assembly {
            GenomeRelease::Grch37 => &CHROM_LENGTHS_37,
            GenomeRelease::Grch38 => &CHROM_LENGTHS_38,
        };
        let chrom_len = lengths.get(self.chromosome.as_str()).copied().unwrap_or(0);
        let stop_pos = self.position + self.deleted.len() as u64 - 1;
        if stop_pos > chrom_len {
            return Err(Error::InvalidPosition(format!(
                "variant {} extends to {} which exceeds the length of chromosome {} ({}) on {}",
                self.display, stop_pos, self.chromosome, chrom_len, self.assembly
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for SequenceVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_chromosome_strips_chr_and_folds_mt() {
        assert_eq!("1", normalize_chromosome("chr1"));
        assert_eq!("MT", normalize_chromosome("chrM"));
        assert_eq!("MT", normalize_chromosome("m"));
        assert_eq!("MT", normalize_chromosome("MT"));
        assert_eq!("X", normalize_chromosome("X"));
    }

    #[test]
    fn new_rejects_out_of_bounds_position() {
        let err = SequenceVariant::new(GenomeRelease::Grch38, "1", 300_000_000, "A", "T", None);
        assert!(matches!(err, Err(Error::InvalidPosition(_))));
    }

    #[test]
    fn new_rejects_non_acgt_alleles() {
        let err = SequenceVariant::new(GenomeRelease::Grch38, "1", 1000, "N", "T", None);
        assert!(matches!(err, Err(Error::InvalidPosition(_))));
    }

    #[test]
    fn new_accepts_valid_variant() {
        let v = SequenceVariant::new(GenomeRelease::Grch38, "chr1", 1000, "a", "t", None).unwrap();
        assert_eq!("1", v.chromosome);
        assert_eq!("A", v.deleted);
        assert_eq!("T", v.inserted);
    }
}
