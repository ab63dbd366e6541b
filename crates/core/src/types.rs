use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct AgentId;
}

/// Player index as reported by the match engine. We are always player 0.
pub type Owner = u8;

pub const FRIENDLY: Owner = 0;

/// One grid position, stored as a dense `row * cols + col` index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell(u32);

impl Cell {
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Order used when an agent just needs any legal step.
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    /// Neighbor expansion order for breadth-first search. Path tie-breaks follow it.
    pub const SEARCH_ORDER: [Direction; 4] =
        [Direction::West, Direction::South, Direction::North, Direction::East];

    pub const fn inverse(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Row and column delta of one step.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::North => 'N',
            Self::East => 'E',
            Self::South => 'S',
            Self::West => 'W',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terrain {
    Unknown,
    Land,
    Water,
    Food,
    OwnAnt,
    EnemyAnt,
    OwnHill,
    EnemyHill,
    OwnOccupiedHill,
}

impl Terrain {
    pub fn is_enemy_hill(self) -> bool {
        self == Terrain::EnemyHill
    }

    pub fn is_own_hill(self) -> bool {
        matches!(self, Terrain::OwnHill | Terrain::OwnOccupiedHill)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub cell: Cell,
    pub direction: Direction,
}

/// Non-fatal facts noticed during a turn. They are logged as they happen and
/// also returned to the caller in the turn report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    HillDestroyed(Cell),
    AgentLost(Cell),
    TrackingFault { cell: Cell, recorded: Cell },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u64,
    pub orders: Vec<Order>,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("grid has no cells ({rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("grid changed size from {expected:?} to {found:?} mid-match")]
    GridResized { expected: (usize, usize), found: (usize, usize) },
}
