//! Agent identity across turns, per-agent task state, and cached routes.
//! The match engine gives our ants no stable ids, so identity is re-derived each
//! turn by matching occupied cells against where we last committed each agent.
//! It does not own move arbitration; see `dispatch`.

use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::config::FoodMetric;
use crate::dispatch::PendingMove;
use crate::explore::SectorGrid;
use crate::knowledge::WorldKnowledge;
use crate::map::GridOracle;
use crate::pathfinding::{Path, find_nearest_path, find_path};
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Idle,
    Explore { target: Option<Cell> },
    HuntFood { food: Cell },
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    pub location: Cell,
    pub task: Task,
    pub cached_path: Option<Path>,
    pub cached_path_target: Option<Cell>,
    pub seen_this_turn: bool,
}

impl Agent {
    fn new(location: Cell) -> Self {
        Self {
            id: AgentId::default(),
            location,
            task: Task::Explore { target: None },
            cached_path: None,
            cached_path_target: None,
            seen_this_turn: true,
        }
    }

    pub fn target_food(&self) -> Option<Cell> {
        match self.task {
            Task::HuntFood { food } => Some(food),
            _ => None,
        }
    }

    pub fn explore_target(&self) -> Option<Cell> {
        match self.task {
            Task::Explore { target } => target,
            _ => None,
        }
    }

    pub fn has_path(&self) -> bool {
        self.cached_path.as_ref().is_some_and(|path| !path.is_empty())
    }

    pub fn clear_path(&mut self) {
        self.cached_path = None;
        self.cached_path_target = None;
    }

    /// Next direction along the cached route to `target`, rebuilding the route
    /// when there is none, when `retarget_now` asks for a different target, or
    /// when the next cell has turned out to be water.
    ///
    /// Nothing is consumed here; call [`Agent::commit_step`] once the move is accepted.
    pub fn next_path_step<G>(
        &mut self,
        grid: &G,
        knowledge: &WorldKnowledge,
        target: Cell,
        retarget_now: bool,
    ) -> Option<Direction>
    where
        G: GridOracle + ?Sized,
    {
        let reusable = self.has_path() && (!retarget_now || self.cached_path_target == Some(target));
        if !reusable && !self.rebuild_path(grid, knowledge, target) {
            return None;
        }

        let mut direction = *self.cached_path.as_ref()?.front()?;
        if knowledge.is_water(grid.step(self.location, direction)) {
            debug!(location = ?self.location, ?target, "cached path runs into water, rebuilding");
            if !self.rebuild_path(grid, knowledge, target) {
                return None;
            }
            direction = *self.cached_path.as_ref()?.front()?;
        }
        Some(direction)
    }

    /// Drops the step just taken from the cached route. Any other move invalidates the route.
    pub fn commit_step(&mut self, direction: Direction) {
        let Some(path) = &mut self.cached_path else {
            return;
        };
        if path.front() == Some(&direction) {
            path.pop_front();
            if path.is_empty() {
                self.cached_path = None;
            }
        } else {
            self.clear_path();
        }
    }

    fn rebuild_path<G>(&mut self, grid: &G, knowledge: &WorldKnowledge, target: Cell) -> bool
    where
        G: GridOracle + ?Sized,
    {
        match find_path(grid, self.location, target, |cell| knowledge.is_water(cell)) {
            Some(path) => {
                self.cached_path = Some(path);
                self.cached_path_target = Some(target);
                true
            }
            None => {
                self.clear_path();
                false
            }
        }
    }
}

/// All of our live agents, keyed both by stable slot and by committed cell.
#[derive(Clone, Debug)]
pub struct AgentTracker {
    agents: SlotMap<AgentId, Agent>,
    by_cell: BTreeMap<Cell, AgentId>,
    sectors: SectorGrid,
}

impl AgentTracker {
    pub fn new(sector_grid_size: usize) -> Self {
        Self {
            agents: SlotMap::with_key(),
            by_cell: BTreeMap::new(),
            sectors: SectorGrid::new(sector_grid_size),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn agent_at(&self, cell: Cell) -> Option<&Agent> {
        self.by_cell.get(&cell).and_then(|id| self.agents.get(*id))
    }

    /// Agents in ascending cell order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.by_cell.values().filter_map(|id| self.agents.get(*id))
    }

    pub fn ids_in_cell_order(&self) -> Vec<AgentId> {
        self.by_cell.values().copied().collect()
    }

    pub fn sectors(&self) -> &SectorGrid {
        &self.sectors
    }

    /// Splits the borrow so an exploration strategy can read sector occupancy
    /// while it updates one agent.
    pub fn agent_with_sectors(&mut self, id: AgentId) -> Option<(&mut Agent, &SectorGrid)> {
        let agent = self.agents.get_mut(id)?;
        Some((agent, &self.sectors))
    }

    /// Matches this turn's friendly ants against tracked agents.
    ///
    /// Unknown cells spawn a fresh exploring agent. Agents that no ant matched
    /// are dropped along with their sector occupancy.
    pub fn reconcile<G>(&mut self, grid: &G) -> Vec<Observation>
    where
        G: GridOracle + ?Sized,
    {
        for agent in self.agents.values_mut() {
            agent.seen_this_turn = false;
        }

        let mut observations = Vec::new();
        for cell in grid.friendly_ants() {
            let Some(id) = self.by_cell.get(&cell).copied() else {
                self.spawn(grid, cell);
                continue;
            };
            if let Some(agent) = self.agents.get_mut(id) {
                if agent.location != cell {
                    // Trust the recorded state; a mismatch means reconciliation is broken.
                    warn!(?cell, recorded = ?agent.location, "agent tracking state corrupted");
                    observations.push(Observation::TrackingFault { cell, recorded: agent.location });
                }
                agent.seen_this_turn = true;
            }
        }

        let lost: Vec<(Cell, AgentId)> = self
            .by_cell
            .iter()
            .filter(|(_, id)| self.agents.get(**id).is_none_or(|agent| !agent.seen_this_turn))
            .map(|(cell, id)| (*cell, *id))
            .collect();
        for (cell, id) in lost {
            self.by_cell.remove(&cell);
            if let Some(agent) = self.agents.remove(id) {
                self.sectors.leave(grid, agent.location);
                info!(?cell, "agent lost");
                observations.push(Observation::AgentLost(agent.location));
            }
        }

        observations
    }

    /// Runs the per-turn task transitions in priority order: hunters whose food
    /// vanished go back to exploring, then idle or exploring agents that can
    /// see unclaimed food start hunting it.
    pub fn update_tasks<G>(&mut self, grid: &G, knowledge: &mut WorldKnowledge, metric: FoodMetric)
    where
        G: GridOracle + ?Sized,
    {
        for id in self.ids_in_cell_order() {
            let Some(agent) = self.agents.get_mut(id) else {
                continue;
            };

            if let Task::HuntFood { food } = agent.task
                && !grid.is_food(food)
            {
                knowledge.release_food(food, id);
                agent.task = Task::Explore { target: None };
                agent.clear_path();
            }

            if matches!(agent.task, Task::Idle | Task::Explore { .. })
                && let Some((food, path)) = choose_food(grid, knowledge, agent, metric)
            {
                debug!(location = ?agent.location, ?food, "agent starts hunting");
                agent.task = Task::HuntFood { food };
                agent.cached_path = Some(path);
                agent.cached_path_target = Some(food);
                knowledge.claim_food(food, id);
            }
        }
    }

    /// Applies accepted moves in the order they were issued.
    pub fn commit<G>(&mut self, grid: &G, moves: &[PendingMove])
    where
        G: GridOracle + ?Sized,
    {
        for pending in moves {
            let Some(agent) = self.agents.get_mut(pending.agent) else {
                continue;
            };
            self.sectors.relocate(grid, agent.location, pending.to);
            if self.by_cell.get(&agent.location) == Some(&pending.agent) {
                self.by_cell.remove(&agent.location);
            }
            if let Some(previous) = self.by_cell.insert(pending.to, pending.agent)
                && previous != pending.agent
            {
                warn!(cell = ?pending.to, "two agents committed to the same cell");
            }
            agent.location = pending.to;
            agent.seen_this_turn = false;
        }
    }

    fn spawn<G>(&mut self, grid: &G, cell: Cell)
    where
        G: GridOracle + ?Sized,
    {
        let id = self.agents.insert(Agent::new(cell));
        self.agents[id].id = id;
        self.by_cell.insert(cell, id);
        self.sectors.enter(grid, cell);
        debug!(?cell, "agent spawned");
    }
}

/// Nearest visible food nobody else hunts, with a route to it. Food walled
/// off by known water is never chosen.
fn choose_food<G>(
    grid: &G,
    knowledge: &WorldKnowledge,
    agent: &Agent,
    metric: FoodMetric,
) -> Option<(Cell, Path)>
where
    G: GridOracle + ?Sized,
{
    let mut candidates = BTreeSet::new();
    grid.for_each_in_radius(agent.location, grid.view_radius2(), &mut |cell| {
        if cell != agent.location
            && grid.is_food(cell)
            && !knowledge.is_claimed_by_other(cell, agent.id)
        {
            candidates.insert(cell);
        }
    });
    if candidates.is_empty() {
        return None;
    }

    let blocked = |cell: Cell| knowledge.is_water(cell);
    match metric {
        FoodMetric::PathLength => {
            find_nearest_path(grid, agent.location, |cell| candidates.contains(&cell), blocked)
        }
        FoodMetric::SquaredDistance => {
            let mut ranked: Vec<Cell> = candidates.into_iter().collect();
            ranked.sort_by_key(|food| grid.distance2(agent.location, *food));
            ranked.into_iter().find_map(|food| {
                find_path(grid, agent.location, food, blocked).map(|path| (food, path))
            })
        }
    }
}
