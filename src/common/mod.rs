//! Common functionality shared across the crate.

use biocommons_bioutils::assemblies::Assembly;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program.
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// The two genome assemblies the engine understands.
///
/// Corresponds to `assembly` in the variant identity model. The CLI and the
/// resolver also accept the `hg19`/`hg38` aliases.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum GenomeRelease {
    #[strum(serialize = "GRCh37")]
    Grch37,
    #[strum(serialize = "GRCh38")]
    Grch38,
}

impl GenomeRelease {
    /// Parse a genome release from any of its commonly used spellings.
    ///
    /// Accepts `GRCh37`/`grch37`/`hg19` and `GRCh38`/`grch38`/`hg38`.
    pub fn from_loose_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grch37" | "hg19" => Some(GenomeRelease::Grch37),
            "grch38" | "hg38" => Some(GenomeRelease::Grch38),
            _ => None,
        }
    }
}

impl From<GenomeRelease> for Assembly {
    fn from(val: GenomeRelease) -> Self {
        match val {
            GenomeRelease::Grch37 => Assembly::Grch37p10,
            GenomeRelease::Grch38 => Assembly::Grch38,
        }
    }
}

impl From<Assembly> for GenomeRelease {
    fn from(assembly: Assembly) -> Self {
        match assembly {
            Assembly::Grch37 | Assembly::Grch37p10 => GenomeRelease::Grch37,
            Assembly::Grch38 => GenomeRelease::Grch38,
        }
    }
}
