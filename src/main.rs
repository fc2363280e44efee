use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{debug, error};

use geojsplit::config::{SplitConfig, DEFAULT_BATCH_SIZE, DEFAULT_SUFFIX_WIDTH};
use geojsplit::error::SplitError;
use geojsplit::split::Splitter;

#[derive(Parser, Debug)]
#[command(
    name = "geojsplit",
    about = "Split a geojson file into many geojson files.",
    version
)]
struct Cli {
    /// Filename of geojson file to split.
    geojson: PathBuf,

    /// The number of features to be distributed to each file.
    #[arg(
        short = 'l',
        long,
        default_value_t = DEFAULT_BATCH_SIZE as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    geometry_count: u64,

    /// Number of characters in the suffix length for split geojsons.
    #[arg(short = 'a', long, default_value_t = DEFAULT_SUFFIX_WIDTH)]
    suffix_length: usize,

    /// Output directory to save split geojsons.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Limit number of split geojson files to at most LIMIT, with
    /// GEOMETRY_COUNT number of features.
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,

    /// Increase output verbosity.
    #[arg(short, long)]
    verbose: bool,

    /// See output without actually writing to file.
    #[arg(short = 'd', long)]
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!("called geojsplit with arguments: {cli:?}");

    let mut config = SplitConfig::new(&cli.geojson)
        .batch_size(cli.geometry_count as usize)
        .suffix_width(cli.suffix_length)
        .dry_run(cli.dry_run);
    if let Some(output) = &cli.output {
        config = config.output_dir(output);
    }
    if let Some(limit) = cli.limit {
        config = config.limit(limit);
    }

    debug!("starting splitting with geojson {}", cli.geojson.display());

    match Splitter::new(config).run() {
        Ok(report) => {
            debug!(
                "finished splitting geojson: {} files, {} features, {} write failures",
                report.files_written, report.features_written, report.write_failures
            );
        }
        // Configuration problems share clap's argument-validation exit
        // status
        Err(SplitError::Config(err)) => {
            error!("{err}");
            process::exit(2);
        }
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    }
}

/// Errors only by default; `-v` raises the filter to debug. `RUST_LOG`
/// overrides both. Diagnostics go to stderr so stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
