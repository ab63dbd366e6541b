//! Sector balancing: split the map into a coarse grid and send explorers to
//! sectors that few agents currently occupy.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use tracing::debug;

use super::{ExplorationStrategy, ExploreContext};
use crate::map::GridOracle;
use crate::tracker::{Agent, Task};
use crate::types::*;

/// Occupancy counts for a `size x size` partition of the map.
#[derive(Clone, Debug)]
pub struct SectorGrid {
    size: usize,
    counts: Vec<u32>,
}

impl SectorGrid {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self { size, counts: vec![0; size * size] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn occupant_count(&self, sector: usize) -> u32 {
        self.counts.get(sector).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn sector_of<G>(&self, grid: &G, cell: Cell) -> usize
    where
        G: GridOracle + ?Sized,
    {
        let (row, col) = grid.row_col(cell);
        let sector_row = row * self.size / grid.rows();
        let sector_col = col * self.size / grid.cols();
        sector_row * self.size + sector_col
    }

    /// Top-left row/col of a sector.
    pub fn origin<G>(&self, grid: &G, sector: usize) -> (usize, usize)
    where
        G: GridOracle + ?Sized,
    {
        let sector_row = sector / self.size;
        let sector_col = sector % self.size;
        (sector_row * grid.rows() / self.size, sector_col * grid.cols() / self.size)
    }

    pub(crate) fn enter<G>(&mut self, grid: &G, cell: Cell)
    where
        G: GridOracle + ?Sized,
    {
        let sector = self.sector_of(grid, cell);
        self.counts[sector] += 1;
    }

    pub(crate) fn leave<G>(&mut self, grid: &G, cell: Cell)
    where
        G: GridOracle + ?Sized,
    {
        let sector = self.sector_of(grid, cell);
        self.counts[sector] = self.counts[sector].saturating_sub(1);
    }

    pub(crate) fn relocate<G>(&mut self, grid: &G, from: Cell, to: Cell)
    where
        G: GridOracle + ?Sized,
    {
        self.leave(grid, from);
        self.enter(grid, to);
    }
}

/// Picks a sector with probability rising as its occupancy falls, aims at a
/// jittered cell inside it, and walks there along a cached route.
#[derive(Clone, Debug)]
pub struct SectorBalancer {
    rng: ChaCha8Rng,
}

impl SectorBalancer {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.rng.next_u64() % bound }
    }

    /// Weighted pick: a sector's weight is `max_count - count + 1`, so the
    /// emptiest sectors are the likeliest and no sector is ever excluded.
    pub fn pick_sector(&mut self, sectors: &SectorGrid) -> usize {
        let counts = sectors.counts();
        let busiest = counts.iter().copied().max().unwrap_or(0);
        let weight = |count: u32| u64::from(busiest - count) + 1;
        let total: u64 = counts.iter().map(|count| weight(*count)).sum();

        let mut roll = self.below(total);
        for (sector, count) in counts.iter().enumerate() {
            let w = weight(*count);
            if roll < w {
                return sector;
            }
            roll -= w;
        }
        counts.len() - 1
    }

    /// A uniformly drawn cell within the bounding box of `sector`.
    fn point_in_sector<G>(&mut self, grid: &G, sectors: &SectorGrid, sector: usize) -> Cell
    where
        G: GridOracle + ?Sized,
    {
        let (row, col) = sectors.origin(grid, sector);
        let height = (grid.rows() / sectors.size()).max(1) as u64;
        let width = (grid.cols() / sectors.size()).max(1) as u64;
        let row = row + self.below(height) as usize;
        let col = col + self.below(width) as usize;
        grid.cell(row as i32, col as i32)
    }

    /// A dry cell somewhere in a lightly occupied sector, or `None` if every
    /// cell we tried is known water.
    pub fn pick_target<G>(&mut self, ctx: &ExploreContext<'_, G>) -> Option<Cell>
    where
        G: GridOracle + ?Sized,
    {
        let grid = ctx.grid;
        let sector = self.pick_sector(ctx.sectors);
        let mut target = self.point_in_sector(grid, ctx.sectors, sector);

        // Fixed north-north-east walk off water.
        for _ in 0..grid.cell_count() {
            if !ctx.knowledge.is_water(target) {
                return Some(target);
            }
            target = grid.step(target, Direction::North);
            target = grid.step(target, Direction::North);
            target = grid.step(target, Direction::East);
        }
        None
    }
}

impl ExplorationStrategy for SectorBalancer {
    fn next_explore_direction<G>(
        &mut self,
        ctx: &ExploreContext<'_, G>,
        agent: &mut Agent,
    ) -> Option<Direction>
    where
        G: GridOracle + ?Sized,
    {
        let target = match agent.explore_target() {
            Some(target) if agent.has_path() => target,
            _ => {
                let target = self.pick_target(ctx)?;
                debug!(location = ?agent.location, ?target, "new exploration target");
                agent.task = Task::Explore { target: Some(target) };
                agent.clear_path();
                target
            }
        };

        let direction = agent.next_path_step(ctx.grid, ctx.knowledge, target, false);
        if direction.is_none() {
            agent.task = Task::Explore { target: None };
        }
        direction
    }
}
