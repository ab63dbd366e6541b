//! Tunables for a bot process. One exploration strategy is chosen per process.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sectors,
    Diffusion,
}

/// How a hunting agent ranks the food it can see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodMetric {
    PathLength,
    SquaredDistance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectorConfig {
    /// Sectors per axis; the map is split into `grid_size * grid_size` sectors.
    pub grid_size: usize,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self { grid_size: 12 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffusionConfig {
    pub iterations: u32,
    pub decay: f32,
    pub unknown_heat: f32,
    pub own_hill_heat: f32,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self { iterations: 12, decay: 0.25, unknown_heat: 1000.0, own_hill_heat: 0.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    pub strategy: StrategyKind,
    pub food_metric: FoodMetric,
    /// Overrides the match-provided seed when set.
    pub seed: Option<u64>,
    pub sectors: SectorConfig,
    pub diffusion: DiffusionConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Sectors,
            food_metric: FoodMetric::PathLength,
            seed: None,
            sectors: SectorConfig::default(),
            diffusion: DiffusionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("sector grid size must be at least 1")]
    EmptySectorGrid,
    #[error("diffusion needs at least one iteration")]
    NoDiffusionIterations,
    #[error("diffusion decay {0} must be in (0, 1]")]
    DecayOutOfRange(f32),
    #[error("heat value {0} must be finite")]
    NonFiniteHeat(f32),
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sectors.grid_size == 0 {
            return Err(ConfigError::EmptySectorGrid);
        }
        let diffusion = &self.diffusion;
        if diffusion.iterations == 0 {
            return Err(ConfigError::NoDiffusionIterations);
        }
        if !(diffusion.decay > 0.0 && diffusion.decay <= 1.0) {
            return Err(ConfigError::DecayOutOfRange(diffusion.decay));
        }
        for heat in [diffusion.unknown_heat, diffusion.own_hill_heat] {
            if !heat.is_finite() {
                return Err(ConfigError::NonFiniteHeat(heat));
            }
        }
        Ok(())
    }

    /// Seed for exploration randomness: the configured override, else the match seed.
    pub fn effective_seed(&self, match_seed: u64) -> u64 {
        self.seed.unwrap_or(match_seed)
    }
}
