use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use passant::discovery::{self, DiscoveryConfig};
use passant::reader::{InputSource, ReaderConfig};
use passant::report::OutputFormat;
use passant::scanner::ScanConfig;
use passant::stats::write_stats;
use passant::{Pipeline, PipelineConfig, DEFAULT_MIN_ELO};

#[derive(Parser, Debug)]
#[command(name = "passant")]
#[command(about = "Finds games in PGN dumps that end with an en passant checkmate")]
#[command(version)]
struct Args {
    /// PGN files or glob patterns, read as one stream in order (stdin when none)
    inputs: Vec<String>,

    /// Both players must be rated strictly above this
    #[arg(long, default_value_t = DEFAULT_MIN_ELO)]
    min_elo: u32,

    /// Print a progress line every this many records (0 disables)
    #[arg(long, default_value_t = 1_000_000)]
    progress_interval: u64,

    /// Skip malformed records instead of aborting
    #[arg(long)]
    lenient: bool,

    /// Parse whole movetext instead of only the first and last turns
    #[arg(long)]
    full_movetext: bool,

    /// Output format for matches
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Use memory-mapped I/O instead of async buffered
    #[arg(long)]
    use_mmap: bool,

    /// Suppress the console spinner
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Abort on the first unusable input
    #[arg(long)]
    fail_fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: JSON logs on stderr keep stdout limited to result and progress lines
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    info!(?args, "Parsed CLI arguments");

    let sources = if args.inputs.is_empty() {
        vec![InputSource::Stdin]
    } else {
        let config = DiscoveryConfig {
            fail_fast: args.fail_fast,
        };
        let inputs = discovery::collect_inputs(args.inputs.clone(), config).await?;
        for input in inputs.iter().filter(|i| !i.is_valid()) {
            if let Some(ref error) = input.error {
                warn!("Skipping input {}: {}", input.path.display(), error);
            }
        }
        let sources: Vec<InputSource> = inputs
            .into_iter()
            .filter(|i| i.is_valid())
            .map(|i| InputSource::File(i.path))
            .collect();
        if sources.is_empty() {
            anyhow::bail!("No readable input files");
        }
        sources
    };

    let config = PipelineConfig {
        scan: ScanConfig {
            min_elo: args.min_elo,
            progress_interval: args.progress_interval,
            strict: !args.lenient,
            truncate_movetext: !args.full_movetext,
        },
        reader: ReaderConfig {
            use_mmap: args.use_mmap,
            ..Default::default()
        },
        format: args.format,
        show_progress: !args.no_progress,
    };

    let mut pipeline = Pipeline::new(config, tokio::io::stdout())?;
    pipeline.start().await?;
    for source in sources {
        pipeline.scan_source(source).await?;
    }
    let (stats, _) = pipeline.finish();

    if let Some(path) = &args.stats_out {
        write_stats(&stats, path).await?;
        info!("Wrote run statistics to {}", path.display());
    }

    Ok(())
}
