use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mutant_counts::config::{Config, UnmatchedLinePolicy};
use mutant_counts::results::{self, MergePolicyKind};

#[derive(Parser)]
#[command(name = "mutant-counts")]
#[command(version)]
#[command(about = "Turns quantum mutation-testing result logs into per-mutant JSON counts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a result log into a json_results directory next to it
    Parse {
        /// Result log written by the mutation harness
        log: PathBuf,

        /// How repeated (mutant, input) results are combined
        #[arg(long, value_enum)]
        merge: Option<MergePolicyKind>,

        /// Skip lines that are not result lines instead of failing
        #[arg(long)]
        skip_unmatched: bool,

        /// Name of the output directory created next to the log
        #[arg(long)]
        output_dir_name: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config path instead
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().or_else(Config::default_config_path);
    let mut config = Config::load(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.general.log_level))
        .context("Invalid log level")?;
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Config path: {}",
        config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none, using defaults)".to_string())
    );

    match cli.command {
        Commands::Parse {
            log,
            merge,
            skip_unmatched,
            output_dir_name,
        } => {
            if let Some(merge) = merge {
                config.parser.merge_policy = merge;
            }
            if skip_unmatched {
                config.parser.unmatched_lines = UnmatchedLinePolicy::Skip;
            }
            if let Some(name) = output_dir_name {
                config.parser.output_dir_name = name;
            }
            config.parser.validate()?;

            tracing::info!(
                "Parsing {} (merge policy: {})",
                log.display(),
                config.parser.merge_policy
            );

            let report = results::parse_with(&log, &config.parser)
                .with_context(|| format!("Failed to parse results log {}", log.display()))?;

            tracing::info!(
                "Read {} line(s): {} result(s) for {} mutant(s), {} skipped",
                report.lines_read,
                report.records,
                report.mutants,
                report.skipped
            );
            tracing::info!(
                "Wrote {} file(s) to {}",
                report.files.len(),
                report.output_dir.display()
            );
        }
        Commands::Config { init: true } => {
            let path = Config::init(cli.config.as_deref())?;
            tracing::info!("Wrote default configuration to {}", path.display());
        }
        Commands::Config { init: false } => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
