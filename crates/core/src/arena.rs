//! A minimal single-player local match for tests and offline runs.
//! This module exists to drive a [`Bot`] end to end without the match server.
//! It does not model combat, enemy players or hill razing.

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::bot::Bot;
use crate::config::{BotConfig, ConfigError};
use crate::explore::Strategy;
use crate::map::{GridOracle, Map};
use crate::types::*;

/// Ants closer than this (squared) to food gather it.
const GATHER_RADIUS2: i32 = 1;
/// Water is never generated this close (squared) to the hill.
const HILL_CLEARANCE2: i32 = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaSettings {
    pub rows: usize,
    pub cols: usize,
    pub view_radius2: i32,
    pub water_clusters: usize,
    pub cluster_size: usize,
    /// Food cells kept on the map; eaten food respawns elsewhere.
    pub food: usize,
    pub seed: u64,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            view_radius2: 77,
            water_clusters: 8,
            cluster_size: 10,
            food: 12,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ArenaReport {
    pub turns: u64,
    pub ants_alive: usize,
    pub food_gathered: u64,
    pub orders_issued: u64,
    pub orders_rejected: u64,
    pub cells_seen: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("ant standing on water at {0:?}")]
    AntOnWater(Cell),
    #[error("two ants share {0:?}")]
    StackedAnts(Cell),
    #[error("bot tracks {tracked} agents but {live} ants were alive at its last turn")]
    TrackedCount { tracked: usize, live: usize },
    #[error("sector occupancy sums to {occupancy} for {tracked} tracked agents")]
    SectorOccupancy { occupancy: u32, tracked: usize },
}

pub struct Arena {
    settings: ArenaSettings,
    rng: ChaCha8Rng,
    water: Vec<bool>,
    hill: Cell,
    ants: Vec<Cell>,
    food: BTreeSet<Cell>,
    seen: Vec<bool>,
    map: Map,
    bot: Bot<Strategy>,
    pending_spawns: u32,
    spawned_last_step: usize,
    report: ArenaReport,
}

impl Arena {
    pub fn new(settings: ArenaSettings, config: BotConfig) -> Result<Self, ConfigError> {
        let bot = Bot::from_config(config, settings.seed)?;
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let cells = settings.rows * settings.cols;
        let map = Map::new(settings.rows, settings.cols, settings.view_radius2);
        let hill = Cell::from_index(below(&mut rng, cells as u64) as usize);

        let mut arena = Self {
            water: vec![false; cells],
            hill,
            ants: vec![hill],
            food: BTreeSet::new(),
            seen: vec![false; cells],
            map,
            bot,
            pending_spawns: 0,
            spawned_last_step: 0,
            report: ArenaReport { ants_alive: 1, ..ArenaReport::default() },
            rng,
            settings,
        };
        arena.generate_water();
        arena.top_up_food();
        Ok(arena)
    }

    pub fn bot(&self) -> &Bot<Strategy> {
        &self.bot
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn ants(&self) -> &[Cell] {
        &self.ants
    }

    pub fn hill(&self) -> Cell {
        self.hill
    }

    pub fn is_water(&self, cell: Cell) -> bool {
        self.water[cell.index()]
    }

    pub fn report(&self) -> ArenaReport {
        ArenaReport {
            ants_alive: self.ants.len(),
            cells_seen: self.seen.iter().filter(|seen| **seen).count(),
            ..self.report.clone()
        }
    }

    /// One full turn: observe, decide, move, gather, respawn.
    pub fn step(&mut self) -> Result<TurnReport, TurnError> {
        self.observe();
        let turn = self.bot.do_turn(&self.map)?;
        self.apply_orders(&turn.orders);
        self.gather_food();
        self.top_up_food();
        self.report.turns += 1;
        Ok(turn)
    }

    pub fn run(&mut self, turns: u64) -> Result<ArenaReport, TurnError> {
        for _ in 0..turns {
            self.step()?;
        }
        Ok(self.report())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut occupied = BTreeSet::new();
        for ant in &self.ants {
            if self.water[ant.index()] {
                return Err(InvariantViolation::AntOnWater(*ant));
            }
            if !occupied.insert(*ant) {
                return Err(InvariantViolation::StackedAnts(*ant));
            }
        }

        if self.report.turns > 0 {
            let tracked = self.bot.tracker().len();
            let live = self.ants.len() - self.spawned_last_step;
            if tracked != live {
                return Err(InvariantViolation::TrackedCount { tracked, live });
            }
            let occupancy = self.bot.tracker().sectors().total();
            if occupancy as usize != tracked {
                return Err(InvariantViolation::SectorOccupancy { occupancy, tracked });
            }
        }
        Ok(())
    }

    fn generate_water(&mut self) {
        for _ in 0..self.settings.water_clusters {
            let mut cell = self.random_cell();
            for _ in 0..self.settings.cluster_size {
                if self.map.distance2(cell, self.hill) > HILL_CLEARANCE2 {
                    self.water[cell.index()] = true;
                }
                let direction = Direction::ALL[below(&mut self.rng, 4) as usize];
                cell = self.map.step(cell, direction);
            }
        }
    }

    fn top_up_food(&mut self) {
        let attempts = self.water.len();
        for _ in 0..attempts {
            if self.food.len() >= self.settings.food {
                break;
            }
            let cell = self.random_cell();
            if !self.water[cell.index()] && cell != self.hill && !self.ants.contains(&cell) {
                self.food.insert(cell);
            }
        }
    }

    /// Feeds the bot's map what our ants can currently see, the way the
    /// match server would.
    fn observe(&mut self) {
        let mut visible = vec![false; self.water.len()];
        for ant in &self.ants {
            self.map.for_each_in_radius(*ant, self.settings.view_radius2, &mut |cell| {
                visible[cell.index()] = true;
            });
        }

        self.map.begin_update();
        for (index, seen) in visible.iter().enumerate() {
            if !seen {
                continue;
            }
            self.seen[index] = true;
            let cell = Cell::from_index(index);
            let (row, col) = self.map.row_col(cell);
            let (row, col) = (row as i32, col as i32);
            if self.water[index] {
                self.map.add_water(row, col);
            }
            if self.food.contains(&cell) {
                self.map.add_food(row, col);
            }
            if cell == self.hill {
                self.map.add_hill(row, col, FRIENDLY);
            }
        }
        for ant in &self.ants {
            let (row, col) = self.map.row_col(*ant);
            self.map.add_ant(row as i32, col as i32, FRIENDLY);
        }
        self.map.finish_update();
    }

    /// Moves are resolved the way the server does: orders from cells without
    /// one of our ants, into water, or onto an already claimed destination are
    /// rejected, and a mover whose destination is held by a stationary ant
    /// stays put instead.
    fn apply_orders(&mut self, orders: &[Order]) {
        let ants: BTreeSet<Cell> = self.ants.iter().copied().collect();
        let mut moves: BTreeMap<Cell, Cell> = BTreeMap::new();
        let mut claimed = BTreeSet::new();

        for order in orders {
            self.report.orders_issued += 1;
            let to = self.map.step(order.cell, order.direction);
            if !ants.contains(&order.cell)
                || moves.contains_key(&order.cell)
                || self.water[to.index()]
                || !claimed.insert(to)
            {
                self.report.orders_rejected += 1;
                continue;
            }
            moves.insert(order.cell, to);
        }

        loop {
            let blocked: Vec<Cell> = moves
                .iter()
                .filter(|(_, to)| ants.contains(*to) && !moves.contains_key(*to))
                .map(|(from, _)| *from)
                .collect();
            if blocked.is_empty() {
                break;
            }
            for from in blocked {
                moves.remove(&from);
                self.report.orders_rejected += 1;
            }
        }

        for ant in &mut self.ants {
            if let Some(to) = moves.get(ant) {
                *ant = *to;
            }
        }
        self.ants.sort();
    }

    fn gather_food(&mut self) {
        let eaten: Vec<Cell> = self
            .food
            .iter()
            .copied()
            .filter(|food| {
                self.ants.iter().any(|ant| self.map.distance2(*ant, *food) <= GATHER_RADIUS2)
            })
            .collect();
        for food in eaten {
            self.food.remove(&food);
            self.report.food_gathered += 1;
            self.pending_spawns += 1;
        }

        self.spawned_last_step = 0;
        if self.pending_spawns > 0 && !self.ants.contains(&self.hill) {
            self.pending_spawns -= 1;
            self.ants.push(self.hill);
            self.ants.sort();
            self.spawned_last_step = 1;
            debug!(hill = ?self.hill, ants = self.ants.len(), "ant spawned");
        }
    }

    fn random_cell(&mut self) -> Cell {
        Cell::from_index(below(&mut self.rng, self.water.len() as u64) as usize)
    }
}

fn below(rng: &mut ChaCha8Rng, bound: u64) -> u64 {
    if bound == 0 { 0 } else { rng.next_u64() % bound }
}
