//! The per-turn decision pass.
//! This module exists to sequence reconciliation, knowledge, tasks and dispatch in one place.
//! It does not own the match protocol or the grid snapshot itself.

use std::time::Instant;

use tracing::debug;

use crate::config::{BotConfig, ConfigError};
use crate::dispatch::Dispatcher;
use crate::explore::{ExplorationStrategy, ExploreContext, Strategy};
use crate::knowledge::WorldKnowledge;
use crate::map::GridOracle;
use crate::tracker::{AgentTracker, Task};
use crate::types::*;

mod hash;

pub struct Bot<S> {
    config: BotConfig,
    knowledge: WorldKnowledge,
    tracker: AgentTracker,
    strategy: S,
    turn: u64,
    dims: Option<(usize, usize)>,
}

impl Bot<Strategy> {
    /// Validates `config` and builds the strategy it names, seeded from the
    /// config override or else `match_seed`.
    pub fn from_config(config: BotConfig, match_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = Strategy::from_config(&config, config.effective_seed(match_seed));
        Ok(Self::new(config, strategy))
    }
}

impl<S: ExplorationStrategy> Bot<S> {
    pub fn new(config: BotConfig, strategy: S) -> Self {
        let tracker = AgentTracker::new(config.sectors.grid_size);
        Self {
            config,
            knowledge: WorldKnowledge::new(),
            tracker,
            strategy,
            turn: 0,
            dims: None,
        }
    }

    /// Runs one full decision pass and returns the turn's orders.
    ///
    /// Only a grid that cannot be reasoned about is an error. Unreachable
    /// targets, missing food and blocked moves all degrade to fallback moves.
    pub fn do_turn<G>(&mut self, grid: &G) -> Result<TurnReport, TurnError>
    where
        G: GridOracle + ?Sized,
    {
        let started = Instant::now();
        let found = (grid.rows(), grid.cols());
        if found.0 == 0 || found.1 == 0 {
            return Err(TurnError::EmptyGrid { rows: found.0, cols: found.1 });
        }
        match self.dims {
            Some(expected) if expected != found => {
                return Err(TurnError::GridResized { expected, found });
            }
            _ => self.dims = Some(found),
        }
        self.turn += 1;

        let mut observations = self.tracker.reconcile(grid);
        let tracker = &self.tracker;
        observations.extend(self.knowledge.refresh(grid, |id| tracker.contains(id)));
        self.tracker.update_tasks(grid, &mut self.knowledge, self.config.food_metric);
        self.strategy.prepare_turn(grid, &self.knowledge);

        let mut dispatcher = Dispatcher::new();
        let ids = self.tracker.ids_in_cell_order();
        let (hunters, others): (Vec<AgentId>, Vec<AgentId>) = ids.into_iter().partition(|id| {
            self.tracker.get(*id).is_some_and(|agent| agent.target_food().is_some())
        });
        for id in hunters {
            self.dispatch_hunter(grid, &mut dispatcher, id);
        }
        for id in others {
            self.dispatch_explorer(grid, &mut dispatcher, id);
        }

        let orders = dispatcher.orders();
        self.tracker.commit(grid, dispatcher.moves());

        debug!(
            turn = self.turn,
            agents = self.tracker.len(),
            orders = orders.len(),
            known_water = self.knowledge.known_water().len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "turn complete"
        );
        Ok(TurnReport { turn: self.turn, orders, observations })
    }

    fn dispatch_hunter<G>(&mut self, grid: &G, dispatcher: &mut Dispatcher, id: AgentId)
    where
        G: GridOracle + ?Sized,
    {
        let Some(agent) = self.tracker.get_mut(id) else {
            return;
        };
        let Task::HuntFood { food } = agent.task else {
            return;
        };

        match agent.next_path_step(grid, &self.knowledge, food, true) {
            Some(direction) => {
                if dispatcher.safe_move(grid, agent, direction) {
                    agent.commit_step(direction);
                    return;
                }
            }
            None => {
                debug!(location = ?agent.location, ?food, "food unreachable, giving up the hunt");
                self.knowledge.release_food(food, id);
                agent.task = Task::Idle;
            }
        }

        if dispatcher.try_any_move(grid, agent).is_some() {
            agent.clear_path();
        }
    }

    fn dispatch_explorer<G>(&mut self, grid: &G, dispatcher: &mut Dispatcher, id: AgentId)
    where
        G: GridOracle + ?Sized,
    {
        let Some((agent, sectors)) = self.tracker.agent_with_sectors(id) else {
            return;
        };
        if agent.task == Task::Idle {
            agent.task = Task::Explore { target: None };
        }

        let ctx = ExploreContext { grid, knowledge: &self.knowledge, sectors };
        if let Some(direction) = self.strategy.next_explore_direction(&ctx, agent)
            && dispatcher.safe_move(grid, agent, direction)
        {
            agent.commit_step(direction);
            return;
        }

        agent.task = Task::Idle;
        agent.clear_path();
        dispatcher.try_any_move(grid, agent);
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn knowledge(&self) -> &WorldKnowledge {
        &self.knowledge
    }

    pub fn tracker(&self) -> &AgentTracker {
        &self.tracker
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Number of completed decision passes.
    pub fn turn(&self) -> u64 {
        self.turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FoodMetric, StrategyKind};
    use crate::map::Map;
    use crate::test_support::*;

    fn sector_bot() -> Bot<Strategy> {
        Bot::from_config(BotConfig::default(), 42).expect("default config is valid")
    }

    #[test]
    fn empty_grid_is_fatal() {
        let mut bot = sector_bot();
        let map = Map::new(0, 4, 77);
        assert_eq!(bot.do_turn(&map), Err(TurnError::EmptyGrid { rows: 0, cols: 4 }));
        assert_eq!(bot.turn(), 0);
    }

    #[test]
    fn grid_dimensions_may_not_change_mid_match() {
        let mut bot = sector_bot();
        bot.do_turn(&open_map(6, 6)).expect("first turn");
        assert_eq!(
            bot.do_turn(&open_map(6, 7)),
            Err(TurnError::GridResized { expected: (6, 6), found: (6, 7) })
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = BotConfig::default();
        config.sectors.grid_size = 0;
        assert!(Bot::from_config(config, 1).is_err());
    }

    #[test]
    fn hunter_heads_for_visible_food() {
        let mut bot = sector_bot();
        let map = map_from_rows(&["a..*....", "........", "........"]);
        let report = bot.do_turn(&map).expect("turn");
        assert_eq!(report.turn, 1);
        assert_eq!(report.orders, vec![Order { cell: map.cell(0, 0), direction: Direction::East }]);
        let agent = bot.tracker().agent_at(map.cell(0, 1)).expect("agent moved east");
        assert_eq!(agent.task, Task::HuntFood { food: map.cell(0, 3) });
    }

    #[test]
    fn walled_in_agent_issues_no_order_and_goes_idle() {
        for strategy in [StrategyKind::Sectors, StrategyKind::Diffusion] {
            let config = BotConfig { strategy, ..BotConfig::default() };
            let mut bot = Bot::from_config(config, 9).expect("config");
            let map = map_from_rows(&["%%%", "%a%", "%%%"]);
            let report = bot.do_turn(&map).expect("turn");
            assert!(report.orders.is_empty(), "{strategy:?}");
            let agent = bot.tracker().agent_at(map.cell(1, 1)).expect("agent");
            assert_eq!(agent.task, Task::Idle, "{strategy:?}");
        }
    }

    #[test]
    fn sealed_food_does_not_keep_an_agent_from_exploring() {
        let config = BotConfig { food_metric: FoodMetric::SquaredDistance, ..BotConfig::default() };
        let mut bot = Bot::from_config(config, 3).expect("config");
        let mut map = map_from_rows(&[
            "..............",
            "..%...........",
            ".%*%..........",
            "..%...........",
            "..............",
            "..a...........",
            "..............",
            "..............",
        ]);
        let food = map.cell(2, 2);

        let mut explored = false;
        for _ in 0..6 {
            bot.do_turn(&map).expect("turn");
            let agent = bot.tracker().iter().next().expect("agent");
            assert_eq!(agent.target_food(), None);
            explored |= agent.explore_target().is_some();
            let location = agent.location;
            refeed(&mut map, &[location], &[food]);
        }
        assert!(explored, "the sector balancer never ran");
        assert_eq!(bot.knowledge().claimant(food), None);
    }

    #[test]
    fn every_agent_gets_at_most_one_order_to_a_distinct_cell() {
        let mut bot = sector_bot();
        let map = map_from_rows(&["aa.a", "a%.*", "..aa", "...."]);
        let report = bot.do_turn(&map).expect("turn");

        let mut sources: Vec<Cell> = report.orders.iter().map(|order| order.cell).collect();
        let mut targets: Vec<Cell> =
            report.orders.iter().map(|order| map.step(order.cell, order.direction)).collect();
        sources.sort();
        sources.dedup();
        targets.sort();
        targets.dedup();
        assert_eq!(sources.len(), report.orders.len());
        assert_eq!(targets.len(), report.orders.len());
        assert!(targets.iter().all(|cell| !map.is_water(*cell)));
        assert_eq!(bot.tracker().len(), 6);
        assert_eq!(bot.tracker().sectors().total(), 6);
    }
}
