pub mod arena;
pub mod bot;
pub mod config;
pub mod dispatch;
pub mod explore;
pub mod knowledge;
pub mod map;
pub mod pathfinding;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod test_support;

pub use arena::{Arena, ArenaReport, ArenaSettings, InvariantViolation};
pub use bot::Bot;
pub use config::{BotConfig, ConfigError, DiffusionConfig, FoodMetric, SectorConfig, StrategyKind};
pub use dispatch::{Dispatcher, PendingMove};
pub use explore::{
    DiffusionField, ExplorationStrategy, ExploreContext, SectorBalancer, SectorGrid, Strategy,
};
pub use knowledge::WorldKnowledge;
pub use map::{GridOracle, Map};
pub use pathfinding::{Path, find_direction_toward, find_nearest_path, find_path};
pub use tracker::{Agent, AgentTracker, Task};
pub use types::*;
