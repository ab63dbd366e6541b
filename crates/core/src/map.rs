//! Toroidal grid snapshot and the query surface the decision engine consumes.
//! This module exists so the engine can be driven by any grid that answers these queries.
//! It does not own accumulated knowledge or per-agent decisions.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::*;

/// Per-turn grid queries. Row and column arithmetic wraps in both axes.
pub trait GridOracle {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn view_radius2(&self) -> i32;

    fn item(&self, cell: Cell) -> Terrain;

    /// Whether an ant may be ordered onto `cell` right now.
    fn safe_destination(&self, cell: Cell) -> bool;

    fn ants(&self) -> &BTreeMap<Cell, Owner>;

    fn food(&self) -> &BTreeSet<Cell>;

    fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Wraps any row/col pair onto the grid.
    fn cell(&self, row: i32, col: i32) -> Cell {
        let row = row.rem_euclid(self.rows() as i32) as usize;
        let col = col.rem_euclid(self.cols() as i32) as usize;
        Cell::from_index(row * self.cols() + col)
    }

    fn row_col(&self, cell: Cell) -> (usize, usize) {
        (cell.index() / self.cols(), cell.index() % self.cols())
    }

    fn step(&self, cell: Cell, direction: Direction) -> Cell {
        let (row, col) = self.row_col(cell);
        let (dr, dc) = direction.offset();
        self.cell(row as i32 + dr, col as i32 + dc)
    }

    fn distance2(&self, a: Cell, b: Cell) -> i32 {
        let (ar, ac) = self.row_col(a);
        let (br, bc) = self.row_col(b);
        let dr = ar.abs_diff(br).min(self.rows() - ar.abs_diff(br)) as i32;
        let dc = ac.abs_diff(bc).min(self.cols() - ac.abs_diff(bc)) as i32;
        dr * dr + dc * dc
    }

    /// Calls `visit` for every cell within squared distance `radius2` of `center`.
    /// On grids smaller than the radius a cell can be visited more than once.
    fn for_each_in_radius(&self, center: Cell, radius2: i32, visit: &mut dyn FnMut(Cell)) {
        walk_radius(self.rows(), self.cols(), center, radius2, visit);
    }

    fn is_food(&self, cell: Cell) -> bool {
        self.food().contains(&cell)
    }

    fn friendly_ants(&self) -> Vec<Cell> {
        self.ants().iter().filter(|(_, owner)| **owner == FRIENDLY).map(|(cell, _)| *cell).collect()
    }
}

/// Grid snapshot fed by the match protocol (or the local arena).
///
/// Water persists between turns. Ants, food and hills are replaced on every
/// update, and visibility is recomputed from our ants in [`Map::finish_update`].
#[derive(Clone, Debug)]
pub struct Map {
    rows: usize,
    cols: usize,
    view_radius2: i32,
    water: Vec<bool>,
    visible: Vec<bool>,
    ants: BTreeMap<Cell, Owner>,
    food: BTreeSet<Cell>,
    hills: BTreeMap<Cell, Owner>,
}

impl Map {
    pub fn new(rows: usize, cols: usize, view_radius2: i32) -> Self {
        Self {
            rows,
            cols,
            view_radius2,
            water: vec![false; rows * cols],
            visible: vec![false; rows * cols],
            ants: BTreeMap::new(),
            food: BTreeSet::new(),
            hills: BTreeMap::new(),
        }
    }

    pub fn begin_update(&mut self) {
        self.ants.clear();
        self.food.clear();
        self.hills.clear();
        self.visible.fill(false);
    }

    pub fn add_water(&mut self, row: i32, col: i32) {
        let cell = self.cell(row, col);
        self.water[cell.index()] = true;
    }

    pub fn add_food(&mut self, row: i32, col: i32) {
        let cell = self.cell(row, col);
        self.food.insert(cell);
    }

    pub fn add_ant(&mut self, row: i32, col: i32, owner: Owner) {
        let cell = self.cell(row, col);
        self.ants.insert(cell, owner);
    }

    pub fn add_hill(&mut self, row: i32, col: i32, owner: Owner) {
        let cell = self.cell(row, col);
        self.hills.insert(cell, owner);
    }

    pub fn finish_update(&mut self) {
        let (rows, cols, radius2) = (self.rows, self.cols, self.view_radius2);
        for ant in self.friendly_ants() {
            let visible = &mut self.visible;
            walk_radius(rows, cols, ant, radius2, &mut |cell| visible[cell.index()] = true);
        }
    }

    /// Marks every cell visible, for fixtures that want a fully observed grid.
    pub fn reveal_all(&mut self) {
        self.visible.fill(true);
    }

    pub fn is_water(&self, cell: Cell) -> bool {
        self.water[cell.index()]
    }

    pub fn hills(&self) -> &BTreeMap<Cell, Owner> {
        &self.hills
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = self.cell(row as i32, col as i32);
                let glyph = match (self.ants.get(&cell), self.hills.get(&cell)) {
                    (Some(owner), _) => (b'a' + owner) as char,
                    (None, Some(owner)) => (b'0' + owner) as char,
                    (None, None) if self.water[cell.index()] => '%',
                    (None, None) if self.food.contains(&cell) => '*',
                    (None, None) if !self.visible[cell.index()] => '?',
                    (None, None) => '.',
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl GridOracle for Map {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn view_radius2(&self) -> i32 {
        self.view_radius2
    }

    fn item(&self, cell: Cell) -> Terrain {
        if self.water[cell.index()] {
            return Terrain::Water;
        }
        let ant = self.ants.get(&cell).copied();
        match (self.hills.get(&cell).copied(), ant) {
            (Some(FRIENDLY), Some(FRIENDLY)) => return Terrain::OwnOccupiedHill,
            (Some(FRIENDLY), _) => return Terrain::OwnHill,
            (Some(_), _) => return Terrain::EnemyHill,
            (None, _) => {}
        }
        match ant {
            Some(FRIENDLY) => Terrain::OwnAnt,
            Some(_) => Terrain::EnemyAnt,
            None if self.food.contains(&cell) => Terrain::Food,
            None if self.visible[cell.index()] => Terrain::Land,
            None => Terrain::Unknown,
        }
    }

    fn safe_destination(&self, cell: Cell) -> bool {
        !self.water[cell.index()] && !self.ants.contains_key(&cell)
    }

    fn ants(&self) -> &BTreeMap<Cell, Owner> {
        &self.ants
    }

    fn food(&self) -> &BTreeSet<Cell> {
        &self.food
    }
}

fn walk_radius(rows: usize, cols: usize, center: Cell, radius2: i32, visit: &mut dyn FnMut(Cell)) {
    let (row, col) = ((center.index() / cols) as i32, (center.index() % cols) as i32);
    let reach = f64::from(radius2.max(0)).sqrt() as i32;
    for dr in -reach..=reach {
        for dc in -reach..=reach {
            if dr * dr + dc * dc > radius2 {
                continue;
            }
            let r = (row + dr).rem_euclid(rows as i32) as usize;
            let c = (col + dc).rem_euclid(cols as i32) as usize;
            visit(Cell::from_index(r * cols + c));
        }
    }
}
