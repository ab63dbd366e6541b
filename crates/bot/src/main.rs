use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colony::StrategyKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config_file;
mod protocol;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Sectors,
    Diffusion,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sectors => StrategyKind::Sectors,
            StrategyArg::Diffusion => StrategyKind::Diffusion,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Ants match bot speaking the line protocol on stdin/stdout")]
struct Args {
    /// TOML file with bot tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exploration seed, overriding both the config file and the match seed
    #[arg(long)]
    seed: Option<u64>,

    /// Exploration strategy, overriding the config file
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = config_file::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    info!(strategy = ?config.strategy, food_metric = ?config.food_metric, "bot starting");

    let stdin = io::stdin();
    let stdout = io::stdout();
    protocol::run(stdin.lock(), stdout.lock(), config)
}

// Stdout carries protocol traffic, so logs go to stderr.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}
