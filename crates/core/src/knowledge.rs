//! Map facts accumulated over the whole match.
//! This module exists so terrain memory outlives a single turn's visibility.
//! It does not own agent identity or movement.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::map::GridOracle;
use crate::types::*;

#[derive(Clone, Debug, Default)]
pub struct WorldKnowledge {
    known_water: BTreeSet<Cell>,
    known_enemy_hills: BTreeSet<Cell>,
    food_claims: BTreeMap<Cell, AgentId>,
}

impl WorldKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds this turn's terrain into the accumulated facts.
    ///
    /// Water is only ever added. Enemy hills are dropped when a cell we knew as
    /// a hill is in view and no longer shows one; hills out of view stay known. Food claims are dropped when the food is
    /// gone or `is_live` says the claiming agent did not survive the turn.
    pub fn refresh<G, IsLive>(&mut self, grid: &G, is_live: IsLive) -> Vec<Observation>
    where
        G: GridOracle + ?Sized,
        IsLive: Fn(AgentId) -> bool,
    {
        let mut observations = Vec::new();
        for index in 0..grid.cell_count() {
            let cell = Cell::from_index(index);
            match grid.item(cell) {
                Terrain::Water => {
                    self.known_water.insert(cell);
                }
                Terrain::EnemyHill => {
                    self.known_enemy_hills.insert(cell);
                }
                Terrain::Unknown => {}
                _ => {
                    if self.known_enemy_hills.remove(&cell) {
                        info!(?cell, "enemy hill destroyed");
                        observations.push(Observation::HillDestroyed(cell));
                    }
                }
            }
        }
        self.food_claims.retain(|food, agent| grid.is_food(*food) && is_live(*agent));
        observations
    }

    pub fn is_water(&self, cell: Cell) -> bool {
        self.known_water.contains(&cell)
    }

    pub fn known_water(&self) -> &BTreeSet<Cell> {
        &self.known_water
    }

    pub fn known_enemy_hills(&self) -> &BTreeSet<Cell> {
        &self.known_enemy_hills
    }

    pub fn claimant(&self, food: Cell) -> Option<AgentId> {
        self.food_claims.get(&food).copied()
    }

    /// True when some agent other than `agent` already hunts `food`.
    pub fn is_claimed_by_other(&self, food: Cell, agent: AgentId) -> bool {
        self.claimant(food).is_some_and(|owner| owner != agent)
    }

    pub fn claim_food(&mut self, food: Cell, agent: AgentId) {
        self.food_claims.insert(food, agent);
    }

    pub fn release_food(&mut self, food: Cell, agent: AgentId) {
        if self.claimant(food) == Some(agent) {
            self.food_claims.remove(&food);
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::map::Map;
    use crate::test_support::*;

    fn two_agent_ids() -> (AgentId, AgentId) {
        let mut ids: SlotMap<AgentId, ()> = SlotMap::with_key();
        (ids.insert(()), ids.insert(()))
    }

    #[test]
    fn water_is_remembered_after_it_leaves_view() {
        let mut map = map_from_rows(&["%...", "....", "...."]);
        let mut knowledge = WorldKnowledge::new();
        knowledge.refresh(&map, |_| true);

        let mut fresh = Map::new(3, 4, 77);
        fresh.begin_update();
        fresh.finish_update();
        map = fresh;
        knowledge.refresh(&map, |_| true);

        assert!(knowledge.is_water(map.cell(0, 0)));
        assert_eq!(knowledge.known_water().len(), 1);
    }

    #[test]
    fn vanished_enemy_hill_is_reported_once() {
        let with_hill = map_from_rows(&["....", ".1..", "...."]);
        let without_hill = map_from_rows(&["....", "....", "...."]);
        let mut knowledge = WorldKnowledge::new();

        assert!(knowledge.refresh(&with_hill, |_| true).is_empty());
        assert_eq!(knowledge.known_enemy_hills().len(), 1);

        let observations = knowledge.refresh(&without_hill, |_| true);
        assert_eq!(observations, vec![Observation::HillDestroyed(without_hill.cell(1, 1))]);
        assert!(knowledge.known_enemy_hills().is_empty());
        assert!(knowledge.refresh(&without_hill, |_| true).is_empty());
    }

    #[test]
    fn enemy_hill_out_of_view_stays_known() {
        let mut map = Map::new(14, 14, 5);
        map.begin_update();
        map.add_ant(2, 2, FRIENDLY);
        map.add_hill(2, 4, 1);
        map.finish_update();
        let hill = map.cell(2, 4);
        let mut knowledge = WorldKnowledge::new();
        knowledge.refresh(&map, |_| true);
        assert!(knowledge.known_enemy_hills().contains(&hill));

        map.begin_update();
        map.add_ant(12, 12, FRIENDLY);
        map.finish_update();
        assert_eq!(map.item(hill), Terrain::Unknown);

        assert!(knowledge.refresh(&map, |_| true).is_empty());
        assert!(knowledge.known_enemy_hills().contains(&hill));
    }

    #[test]
    fn claims_drop_when_food_is_eaten_or_hunter_dies() {
        let (hunter, other) = two_agent_ids();
        let map = map_from_rows(&["*..*", "....", "...."]);
        let eaten = map.cell(0, 0);
        let remaining = map.cell(0, 3);
        let gone = map.cell(2, 2);

        let mut knowledge = WorldKnowledge::new();
        knowledge.claim_food(remaining, hunter);
        knowledge.claim_food(eaten, other);
        knowledge.claim_food(gone, hunter);

        let after = map_from_rows(&["...*", "....", "...."]);
        knowledge.refresh(&after, |_| true);
        assert_eq!(knowledge.claimant(eaten), None);
        assert_eq!(knowledge.claimant(gone), None);
        assert_eq!(knowledge.claimant(remaining), Some(hunter));

        knowledge.refresh(&after, |agent| agent != hunter);
        assert_eq!(knowledge.claimant(remaining), None);
    }

    #[test]
    fn only_the_claimant_can_release_a_claim() {
        let (hunter, other) = two_agent_ids();
        let mut knowledge = WorldKnowledge::new();
        let food = Cell::from_index(3);
        knowledge.claim_food(food, hunter);

        assert!(knowledge.is_claimed_by_other(food, other));
        assert!(!knowledge.is_claimed_by_other(food, hunter));
        knowledge.release_food(food, other);
        assert_eq!(knowledge.claimant(food), Some(hunter));
        knowledge.release_food(food, hunter);
        assert_eq!(knowledge.claimant(food), None);
    }
}
