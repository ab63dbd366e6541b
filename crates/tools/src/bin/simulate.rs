use std::io;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colony::{Arena, ArenaSettings, BotConfig, StrategyKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Sectors,
    Diffusion,
}

#[derive(Parser)]
#[command(author, version, about = "Headless local match with invariant checks")]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 500)]
    turns: u64,
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u16).range(4..))]
    rows: u16,
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u16).range(4..))]
    cols: u16,
    #[arg(long, default_value_t = 12)]
    food: usize,
    #[arg(long, default_value_t = 8)]
    water_clusters: usize,
    #[arg(long, value_enum, default_value_t = StrategyArg::Sectors)]
    strategy: StrategyArg,
    /// Print the final report as JSON instead of text
    #[arg(long)]
    json: bool,
    /// Print the bot's view of the map after the last turn
    #[arg(long)]
    render: bool,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
    let args = Args::parse();

    let settings = ArenaSettings {
        rows: usize::from(args.rows),
        cols: usize::from(args.cols),
        water_clusters: args.water_clusters,
        food: args.food,
        seed: args.seed,
        ..ArenaSettings::default()
    };
    let strategy = match args.strategy {
        StrategyArg::Sectors => StrategyKind::Sectors,
        StrategyArg::Diffusion => StrategyKind::Diffusion,
    };
    let config = BotConfig { strategy, ..BotConfig::default() };
    let mut arena = Arena::new(settings, config).context("invalid bot configuration")?;

    info!(seed = args.seed, turns = args.turns, ?strategy, "simulation starting");
    for turn in 1..=args.turns {
        arena.step().with_context(|| format!("decision pass failed on turn {turn}"))?;
        if let Err(violation) = arena.check_invariants() {
            bail!("invariant broken on turn {turn} (seed {}): {violation}", args.seed);
        }
    }

    let report = arena.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).context("failed to encode report")?);
    } else {
        println!("Simulation complete.");
        println!("Turns: {}", report.turns);
        println!("Ants alive: {}", report.ants_alive);
        println!("Food gathered: {}", report.food_gathered);
        println!("Orders issued: {} ({} rejected)", report.orders_issued, report.orders_rejected);
        println!("Cells seen: {}", report.cells_seen);
        println!("Snapshot hash: {}", arena.bot().snapshot_hash());
    }
    if args.render {
        print!("{}", arena.map().render());
    }
    Ok(())
}
