use colony::{Arena, ArenaSettings, BotConfig, StrategyKind};
use proptest::{
    arbitrary::any,
    test_runner::{Config as ProptestConfig, TestCaseError, TestRunner},
};

fn run_arena(seed: u64, diffusion: bool, rows: usize, cols: usize) -> Result<(), String> {
    let settings = ArenaSettings {
        rows,
        cols,
        view_radius2: 20,
        water_clusters: rows * cols / 48,
        cluster_size: 6,
        food: 6,
        seed,
    };
    let strategy = if diffusion { StrategyKind::Diffusion } else { StrategyKind::Sectors };
    let config = BotConfig { strategy, ..BotConfig::default() };
    let mut arena = Arena::new(settings, config).map_err(|error| error.to_string())?;

    for turn in 0..50 {
        arena.step().map_err(|error| format!("turn {turn} failed: {error}"))?;
        arena
            .check_invariants()
            .map_err(|violation| format!("seed {seed} turn {turn}: {violation}"))?;
    }
    Ok(())
}

#[test]
fn arenas_preserve_invariants() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(24));
    let inputs = (any::<u64>(), any::<bool>(), 6usize..24, 6usize..24);

    runner
        .run(&inputs, |(seed, diffusion, rows, cols)| {
            run_arena(seed, diffusion, rows, cols).map_err(TestCaseError::fail)?;
            Ok(())
        })
        .expect("random arenas should preserve invariants");
}
