//! spiralnet - CLI entry point
//!
//! Trains a dense network on the spiral dataset with one of three optimizers.

use clap::{Parser, Subcommand};
use spiralnet::config::StrategyKind;
use spiralnet::{train, Config};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "spiralnet")]
#[command(version)]
#[command(
    about = "Feed-forward network trained by gradient descent, hill-climbing or random search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network on the spiral dataset
    Train {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Override the configured optimizer
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            config,
            strategy,
            seed,
            quiet,
        } => run_training(config, strategy, seed, quiet),

        Commands::Init { output } => generate_config(output),
    }
}

fn run_training(
    config_path: PathBuf,
    strategy: Option<StrategyKind>,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    let level = if quiet { "warn" } else { config.logging.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if config_path.exists() {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }

    if let Some(s) = strategy {
        config.optimizer.strategy = s;
    }
    if seed.is_some() {
        config.seed = seed;
    }

    let start = Instant::now();
    let summary = train(&config)?;
    let elapsed = start.elapsed();

    if !quiet {
        println!();
        print!("{}", summary);
        println!("Time: {:.2}s", elapsed.as_secs_f64());
    } else {
        println!("{:.6}", summary.report.best_loss);
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
