//! Diffusion heat field: unknown territory radiates heat across dry land and
//! explorers climb the gradient one step at a time.

use std::mem;

use super::{ExplorationStrategy, ExploreContext};
use crate::config::DiffusionConfig;
use crate::knowledge::WorldKnowledge;
use crate::map::GridOracle;
use crate::pathfinding::find_direction_toward;
use crate::tracker::{Agent, Task};
use crate::types::*;

#[derive(Clone, Debug)]
pub struct DiffusionField {
    config: DiffusionConfig,
    current: Vec<f32>,
    next: Vec<f32>,
    water: Vec<bool>,
    bias: usize,
}

impl DiffusionField {
    pub fn new(config: DiffusionConfig) -> Self {
        Self { config, current: Vec::new(), next: Vec::new(), water: Vec::new(), bias: 0 }
    }

    pub fn heat(&self, cell: Cell) -> f32 {
        self.current.get(cell.index()).copied().unwrap_or(0.0)
    }

    /// Index into [`Direction::ALL`] that wins ties this turn.
    pub fn bias(&self) -> usize {
        self.bias
    }

    fn resize(&mut self, cells: usize) {
        if self.current.len() != cells {
            self.current = vec![0.0; cells];
            self.next = vec![0.0; cells];
            self.water = vec![false; cells];
        }
    }

    /// Re-seeds the sources from this turn's terrain. Cells that are neither a
    /// source nor water keep whatever heat they had at the end of last turn.
    fn seed<G>(&mut self, grid: &G, knowledge: &WorldKnowledge)
    where
        G: GridOracle + ?Sized,
    {
        for index in 0..grid.cell_count() {
            let cell = Cell::from_index(index);
            let terrain = grid.item(cell);
            if terrain == Terrain::Water || knowledge.is_water(cell) {
                self.water[index] = true;
                self.current[index] = 0.0;
            } else if terrain == Terrain::Unknown {
                self.current[index] = self.config.unknown_heat;
            } else if terrain.is_own_hill() {
                self.current[index] = self.config.own_hill_heat;
            }
        }
    }

    fn diffuse_once<G>(&mut self, grid: &G)
    where
        G: GridOracle + ?Sized,
    {
        for index in 0..self.current.len() {
            if self.water[index] {
                self.next[index] = 0.0;
                continue;
            }
            let cell = Cell::from_index(index);
            let sum: f32 = Direction::ALL
                .into_iter()
                .map(|direction| grid.step(cell, direction).index())
                .filter(|neighbor| !self.water[*neighbor])
                .map(|neighbor| self.current[neighbor])
                .sum();
            self.next[index] = self.config.decay * sum;
        }
        mem::swap(&mut self.current, &mut self.next);
    }

    /// Hottest dry neighbour of `cell`, ties going to the first direction
    /// starting from the rotating bias. `None` when every neighbour is water.
    fn hottest_neighbor<G>(
        &self,
        grid: &G,
        knowledge: &WorldKnowledge,
        cell: Cell,
    ) -> Option<(Direction, f32)>
    where
        G: GridOracle + ?Sized,
    {
        let mut best: Option<(Direction, f32)> = None;
        for offset in 0..Direction::ALL.len() {
            let direction = Direction::ALL[(self.bias + offset) % Direction::ALL.len()];
            let neighbor = grid.step(cell, direction);
            if knowledge.is_water(neighbor) {
                continue;
            }
            let heat = self.heat(neighbor);
            if best.is_none_or(|(_, hottest)| heat > hottest) {
                best = Some((direction, heat));
            }
        }
        best
    }
}

impl ExplorationStrategy for DiffusionField {
    fn prepare_turn<G>(&mut self, grid: &G, knowledge: &WorldKnowledge)
    where
        G: GridOracle + ?Sized,
    {
        self.resize(grid.cell_count());
        self.seed(grid, knowledge);
        for _ in 0..self.config.iterations {
            self.diffuse_once(grid);
        }
        self.bias = (self.bias + 1) % Direction::ALL.len();
    }

    fn next_explore_direction<G>(
        &mut self,
        ctx: &ExploreContext<'_, G>,
        agent: &mut Agent,
    ) -> Option<Direction>
    where
        G: GridOracle + ?Sized,
    {
        agent.task = Task::Explore { target: None };
        agent.clear_path();

        match self.hottest_neighbor(ctx.grid, ctx.knowledge, agent.location) {
            Some((direction, heat)) if heat > 0.0 => Some(direction),
            // Flat field: fall back to walking toward the nearest unseen cell.
            _ => find_direction_toward(
                ctx.grid,
                agent.location,
                |cell| ctx.grid.item(cell) == Terrain::Unknown,
                |cell| ctx.knowledge.is_water(cell),
            ),
        }
    }
}
