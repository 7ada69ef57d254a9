use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use ndarray::{aview1, Axis};

use policy_brain::ai::Agent;
use policy_brain::checkpoint::{load_pretrained, save_network, CheckpointManager};
use policy_brain::config::AppConfig;

/// Create, inspect and query policy networks.
#[derive(Parser)]
#[command(name = "brain", about = "Create, inspect and query policy networks")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a freshly initialized network built from the configuration
    Init {
        /// Where to write the network snapshot
        #[arg(long, default_value = "brain.json")]
        out: PathBuf,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Replace an existing snapshot
        #[arg(long)]
        force: bool,
    },
    /// Print topology, hyperparameters and weight range of a snapshot
    Inspect {
        #[arg(default_value = "brain.json")]
        path: PathBuf,
    },
    /// Run one feature vector through a snapshot
    Eval {
        path: PathBuf,

        /// Comma-separated feature values
        #[arg(long)]
        features: String,

        /// Comma-separated legal-action mask (1/0); prints the greedy pick
        #[arg(long)]
        legal: Option<String>,
    },
    /// List checkpoints in the configured checkpoint directory
    Checkpoints,
    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Init { out, seed, force } => {
            let config = AppConfig::load_or_default(&cli.config)
                .with_context(|| format!("loading config from {}", cli.config.display()))?;
            if out.exists() && !force {
                bail!("{} already exists (use --force to replace it)", out.display());
            }
            let network = config
                .network
                .build(seed.or(config.seed))
                .context("building network")?;
            save_network(&out, &network)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(
                "Wrote {} -> {} network to {}",
                network.input_size(),
                network.output_size(),
                out.display()
            );
        }
        Command::Inspect { path } => {
            let network = load_existing(&path)?;
            println!("Topology:");
            for (i, spec) in network.topology().iter().enumerate() {
                match spec.activation {
                    Some(activation) => println!("  [{i}] {} ({activation})", spec.size),
                    None => println!("  [{i}] {} (input)", spec.size),
                }
            }
            let hp = network.hyperparameters();
            println!(
                "Learning rate: {}  Momentum: {}  Regularization: {}",
                hp.learning_rate, hp.momentum, hp.regularization
            );
            let (lo, hi) = network.weight_range();
            println!("Weight range: [{lo:.4}, {hi:.4}]");
        }
        Command::Eval {
            path,
            features,
            legal,
        } => {
            let network = load_existing(&path)?;
            let state = parse_list(&features, "features", |s| s.parse::<f32>().ok())?;
            let output = network
                .predict(aview1(&state).insert_axis(Axis(0)))
                .context("evaluating network")?;
            let values: Vec<String> = output.row(0).iter().map(|v| format!("{v:.4}")).collect();
            println!("Output: [{}]", values.join(", "));

            if let Some(mask) = legal {
                let mask = parse_list(&mask, "legal", |s| match s {
                    "1" | "true" => Some(true),
                    "0" | "false" => Some(false),
                    _ => None,
                })?;
                let mut config = AppConfig::load_or_default(&cli.config)
                    .with_context(|| format!("loading config from {}", cli.config.display()))?;
                config.agent.learning = false;
                let mut agent = config
                    .build_learner(Some(&path))
                    .context("creating agent")?;
                let action = agent
                    .select_action(&state, &mask)
                    .context("selecting action")?;
                println!("Greedy action: {action}");
            }
        }
        Command::Checkpoints => {
            let config = AppConfig::load_or_default(&cli.config)
                .with_context(|| format!("loading config from {}", cli.config.display()))?;
            let manager = CheckpointManager::new(config.checkpoint);
            let checkpoints = manager.list_checkpoints().context("listing checkpoints")?;
            if checkpoints.is_empty() {
                println!(
                    "No checkpoints in {}",
                    manager.config().checkpoint_dir.display()
                );
            }
            for (path, metadata) in checkpoints {
                println!(
                    "{}  games {}  score {:5.1}%  cost {}",
                    path.display(),
                    metadata.games_played,
                    metadata.metrics.score,
                    metadata
                        .metrics
                        .cost
                        .map_or_else(|| "n/a".to_string(), |c| format!("{c:.4}"))
                );
            }
        }
        Command::DefaultConfig => {
            print!("{}", AppConfig::default_toml().context("serializing default config")?);
        }
    }

    Ok(())
}

fn load_existing(path: &Path) -> Result<policy_brain::brain::Network> {
    load_pretrained(path)
        .with_context(|| format!("loading {}", path.display()))?
        .with_context(|| format!("{} does not exist", path.display()))
}

fn parse_list<T>(raw: &str, what: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(s).with_context(|| format!("invalid {what} value '{s}'")))
        .collect()
}
