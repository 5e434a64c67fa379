//! `pvs1-classify` — command-line front end for the PVS1 classification engine.

use clap::Parser;
use console::Term;

use seqvar_pvs1::annos::client::AnnonarsClient;
use seqvar_pvs1::common::{Args as CommonArgs, GenomeRelease};
use seqvar_pvs1::err::{Error, Result};
use seqvar_pvs1::splicing::client::MaxEntSplicingClient;
use seqvar_pvs1::transcripts::select_transcript_pair;
use seqvar_pvs1::variant::resolver::{self, DottyNormalizer};

/// Classify a single human sequence variant against the ACMG/AMP PVS1 criterion.
#[derive(Debug, Parser)]
#[command(author, version, about = "Classify a variant against the PVS1 criterion")]
struct Cli {
    /// Commonly used arguments (verbosity).
    #[command(flatten)]
    common: CommonArgs,

    /// The variant to classify, e.g. `13-20189547-G-A` or `NC_000013.11:20189547:G:A`.
    variant: String,

    /// Genome release the variant is reported against.
    #[arg(long, default_value = "GRCh38")]
    genome_release: String,

    /// Base URL of the annonars-compatible annotation service.
    #[arg(long, default_value = "http://localhost:8081/annonars")]
    annonars_url: String,

    /// Base URL of the dotty-compatible variant normalization service.
    #[arg(long, default_value = "http://localhost:8081/dotty")]
    dotty_url: String,

    /// Base URL of the maximum-entropy splice-site scoring service.
    #[arg(long, default_value = "http://localhost:8081/splicing")]
    splicing_url: String,
}

fn run(cli: &Cli) -> Result<()> {
    let default_assembly = GenomeRelease::from_loose_str(&cli.genome_release)
        .ok_or_else(|| Error::ParseError(format!("unknown genome release: {}", cli.genome_release)))?;

    let normalizer = DottyNormalizer::new(&cli.dotty_url);
    let variant = resolver::resolve(&cli.variant, default_assembly, &normalizer)?;
    tracing::info!("resolved variant: {}", variant);

    let annotation_client = AnnonarsClient::new(&cli.annonars_url);
    let (variant_transcripts, gene_transcripts) =
        annotation_client.transcripts_for_variant(&variant, variant.assembly)?;

    let Some(selection) = select_transcript_pair(variant_transcripts, gene_transcripts) else {
        println!("{{\"level\":\"UnsupportedConsequence\",\"path\":\"NotSet\",\"rationale\":\"no overlapping transcript pair found\"}}");
        return Ok(());
    };

    let splicing_client = MaxEntSplicingClient::new(&cli.splicing_url);
    let verdict = seqvar_pvs1::pvs1::classify(
        &selection,
        &variant,
        &annotation_client,
        &splicing_client,
        &seqvar_pvs1::pvs1::NeverCancelled,
    )?;

    println!("{}", serde_json::to_string_pretty(&verdict).unwrap_or_else(|_| format!("{verdict:?}")));
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        if let Err(e) = run(&cli) {
            let _ = term.write_line(&format!("error: {e}"));
        }
    });
}
