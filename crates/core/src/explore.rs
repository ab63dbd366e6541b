//! Where exploring agents head when they have nothing better to do.
//! This module exists to keep exploration policy separate from routing and arbitration.
//! It does not own food hunting or move arbitration.

use crate::config::{BotConfig, StrategyKind};
use crate::knowledge::WorldKnowledge;
use crate::map::GridOracle;
use crate::tracker::Agent;
use crate::types::Direction;

mod diffusion;
mod sectors;

pub use diffusion::DiffusionField;
pub use sectors::{SectorBalancer, SectorGrid};

/// Read-only view handed to a strategy for one agent's decision.
pub struct ExploreContext<'a, G: ?Sized> {
    pub grid: &'a G,
    pub knowledge: &'a WorldKnowledge,
    pub sectors: &'a SectorGrid,
}

/// One exploration policy per process; strategies are never mixed at runtime.
pub trait ExplorationStrategy {
    /// Called once per turn after knowledge and tasks are up to date.
    fn prepare_turn<G>(&mut self, _grid: &G, _knowledge: &WorldKnowledge)
    where
        G: GridOracle + ?Sized,
    {
    }

    /// Direction an exploring agent wants to step this turn, or `None` when
    /// the strategy has nothing usable and the caller should fall back.
    fn next_explore_direction<G>(
        &mut self,
        ctx: &ExploreContext<'_, G>,
        agent: &mut Agent,
    ) -> Option<Direction>
    where
        G: GridOracle + ?Sized;
}

/// The strategy picked for this process from [`BotConfig::strategy`].
#[derive(Clone, Debug)]
pub enum Strategy {
    Sectors(SectorBalancer),
    Diffusion(DiffusionField),
}

impl Strategy {
    pub fn from_config(config: &BotConfig, seed: u64) -> Self {
        match config.strategy {
            StrategyKind::Sectors => Self::Sectors(SectorBalancer::new(seed)),
            StrategyKind::Diffusion => Self::Diffusion(DiffusionField::new(config.diffusion.clone())),
        }
    }
}

impl ExplorationStrategy for Strategy {
    fn prepare_turn<G>(&mut self, grid: &G, knowledge: &WorldKnowledge)
    where
        G: GridOracle + ?Sized,
    {
        match self {
            Self::Sectors(balancer) => balancer.prepare_turn(grid, knowledge),
            Self::Diffusion(field) => field.prepare_turn(grid, knowledge),
        }
    }

    fn next_explore_direction<G>(
        &mut self,
        ctx: &ExploreContext<'_, G>,
        agent: &mut Agent,
    ) -> Option<Direction>
    where
        G: GridOracle + ?Sized,
    {
        match self {
            Self::Sectors(balancer) => balancer.next_explore_direction(ctx, agent),
            Self::Diffusion(field) => field.next_explore_direction(ctx, agent),
        }
    }
}
