//! Per-turn move arbitration. Moves are recorded as intents here and only
//! applied to tracked agents by [`crate::tracker::AgentTracker::commit`] once
//! every agent has been handled, so decision order never leaks into state.

use std::collections::BTreeSet;

use tracing::trace;

use crate::map::GridOracle;
use crate::tracker::Agent;
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMove {
    pub agent: AgentId,
    pub from: Cell,
    pub to: Cell,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    moves: Vec<PendingMove>,
    claimed: BTreeSet<Cell>,
    vacated: BTreeSet<Cell>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a move for `agent` if its destination is open.
    ///
    /// A destination is open when it is not already claimed this turn and the
    /// grid calls it safe, or it is dry land whose occupant already moved away.
    /// Each agent gets at most one order per turn.
    pub fn safe_move<G>(&mut self, grid: &G, agent: &Agent, direction: Direction) -> bool
    where
        G: GridOracle + ?Sized,
    {
        let from = agent.location;
        if self.vacated.contains(&from) {
            return false;
        }
        let to = grid.step(from, direction);
        if self.claimed.contains(&to) {
            return false;
        }
        let open = grid.safe_destination(to)
            || (self.vacated.contains(&to) && grid.item(to) != Terrain::Water);
        if !open {
            return false;
        }

        trace!(?from, ?to, ?direction, "order issued");
        self.moves.push(PendingMove { agent: agent.id, from, to, direction });
        self.claimed.insert(to);
        self.vacated.insert(from);
        true
    }

    /// Issues the first direction in [`Direction::ALL`] that `safe_move` accepts.
    pub fn try_any_move<G>(&mut self, grid: &G, agent: &Agent) -> Option<Direction>
    where
        G: GridOracle + ?Sized,
    {
        Direction::ALL.into_iter().find(|direction| self.safe_move(grid, agent, *direction))
    }

    pub fn has_moved(&self, agent: &Agent) -> bool {
        self.vacated.contains(&agent.location)
    }

    pub fn moves(&self) -> &[PendingMove] {
        &self.moves
    }

    pub fn orders(&self) -> Vec<Order> {
        self.moves
            .iter()
            .map(|pending| Order { cell: pending.from, direction: pending.direction })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::test_support::*;
    use crate::tracker::AgentTracker;

    fn tracked(map: &Map) -> AgentTracker {
        let mut tracker = AgentTracker::new(2);
        tracker.reconcile(map);
        tracker
    }

    #[test]
    fn two_agents_cannot_claim_the_same_destination() {
        let map = map_from_rows(&[".....", "a.a..", "....."]);
        let tracker = tracked(&map);
        let west = tracker.agent_at(map.cell(1, 0)).expect("west agent");
        let east = tracker.agent_at(map.cell(1, 2)).expect("east agent");

        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.safe_move(&map, west, Direction::East));
        assert!(!dispatcher.safe_move(&map, east, Direction::West));

        let fallback = dispatcher.try_any_move(&map, east);
        assert_eq!(fallback, Some(Direction::North));
        let destinations: BTreeSet<Cell> = dispatcher.moves().iter().map(|m| m.to).collect();
        assert_eq!(destinations.len(), dispatcher.moves().len());
    }

    #[test]
    fn water_and_standing_agents_block_moves() {
        let map = map_from_rows(&["..%..", ".aa..", "....."]);
        let tracker = tracked(&map);
        let agent = tracker.agent_at(map.cell(1, 1)).expect("agent");
        let neighbor = tracker.agent_at(map.cell(1, 2)).expect("neighbor");

        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.safe_move(&map, agent, Direction::East), "occupied");
        assert!(!dispatcher.safe_move(&map, neighbor, Direction::North), "water");
        assert!(dispatcher.safe_move(&map, neighbor, Direction::South));
        assert!(!dispatcher.safe_move(&map, neighbor, Direction::East), "one order per agent");
        assert!(dispatcher.has_moved(neighbor));
    }

    #[test]
    fn a_cell_vacated_earlier_this_turn_can_be_entered() {
        let map = map_from_rows(&[".....", ".aa..", "....."]);
        let tracker = tracked(&map);
        let back = tracker.agent_at(map.cell(1, 1)).expect("back");
        let front = tracker.agent_at(map.cell(1, 2)).expect("front");

        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.safe_move(&map, back, Direction::East));
        assert!(dispatcher.safe_move(&map, front, Direction::East));
        assert!(dispatcher.safe_move(&map, back, Direction::East));
        assert_eq!(
            dispatcher.orders(),
            vec![
                Order { cell: map.cell(1, 2), direction: Direction::East },
                Order { cell: map.cell(1, 1), direction: Direction::East },
            ]
        );
    }
}
