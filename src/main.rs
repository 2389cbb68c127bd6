use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use forest_yield_engine::{
    analysis::{reconcile_components, YieldEngine},
    config::EngineConfig,
    io::{self, ResultWriter},
    visualization::{
        print_class_histogram, print_component_table, print_control_summary,
        print_stand_summary, print_utilization_table,
    },
};

#[derive(Parser)]
#[command(
    name = "forest-yield",
    about = "Forest Yield Engine - utilization-class yield estimation from coefficient tables",
    version,
    author
)]
struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one set of basal area, trees per hectare and diameter vectors
    Reconcile {
        /// JSON file with basal_area, trees_per_hectare and quad_mean_diameter arrays
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute utilization and volumes for one or more stands
    Compute {
        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Stand file (JSON, one stand or a list)
        #[arg(short, long)]
        input: PathBuf,

        /// Write results to this file (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Show per-class tables for every species
        #[arg(long)]
        detail: bool,
    },

    /// Load every control file and report table completeness
    Inspect {
        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let config = EngineConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Reconcile { input } => {
            let mut vectors = io::read_component_vectors(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            reconcile_components(
                &mut vectors.basal_area,
                &mut vectors.trees_per_hectare,
                &mut vectors.quad_mean_diameter,
            )?;
            print_component_table(&vectors);
        }

        Commands::Compute {
            config,
            input,
            output,
            pretty,
            detail,
        } => {
            let config = load_config(&config)?;
            let control = io::load_control_map(&config)?;
            let stands = io::read_stands(&input)
                .with_context(|| format!("Failed to read stands from {}", input.display()))?;

            println!(
                "\n{}",
                format!("Yield computation: {} stand(s) from {}", stands.len(), input.display())
                    .bold()
                    .cyan()
            );

            let engine = YieldEngine::new(&control, &config.processing);
            let mut results = Vec::with_capacity(stands.len());
            for stand in &stands {
                let result = engine
                    .compute_stand(stand)
                    .with_context(|| format!("Polygon {} failed", stand.polygon_id))?;
                print_stand_summary(&result);
                print_class_histogram("Layer basal area by class", &result.layer);
                if detail {
                    for spec in &result.species {
                        print_utilization_table(&format!("Species {}", spec.genus), &spec.utilization);
                    }
                    print_utilization_table("Layer", &result.layer);
                }
                results.push(result);
            }

            if let Some(output) = output {
                let writer = io::writer_for(&output, pretty)?;
                writer.write(&results, &output)?;
                println!(
                    "{} Wrote {} stand(s) to {}",
                    "Success:".green().bold(),
                    results.len(),
                    output.display()
                );
            }
        }

        Commands::Inspect { config } => {
            let config = load_config(&config)?;
            let control = io::load_control_map(&config)?;
            print_control_summary(&control.summary());
        }
    }

    Ok(())
}
