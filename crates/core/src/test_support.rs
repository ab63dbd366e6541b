//! Shared test fixtures for the crate's unit test suites.
//! This module exists to avoid repeating map setup across many tests.
//! It does not own production decision logic.

use crate::map::{GridOracle, Map};
use crate::types::*;

pub(crate) fn open_map(rows: usize, cols: usize) -> Map {
    let mut map = Map::new(rows, cols, 77);
    map.begin_update();
    map.finish_update();
    map.reveal_all();
    map
}

/// Builds a fully visible map from ASCII rows: `%` water, `*` food, `a` our
/// ant, `b` an enemy ant, `0` our hill, `1` an enemy hill, anything else land.
pub(crate) fn map_from_rows(rows: &[&str]) -> Map {
    let mut map = Map::new(rows.len(), rows[0].len(), 77);
    map.begin_update();
    for (row, line) in rows.iter().enumerate() {
        for (col, glyph) in line.chars().enumerate() {
            let (row, col) = (row as i32, col as i32);
            match glyph {
                '%' => map.add_water(row, col),
                '*' => map.add_food(row, col),
                'a' => map.add_ant(row, col, FRIENDLY),
                'b' => map.add_ant(row, col, 1),
                '0' => map.add_hill(row, col, FRIENDLY),
                '1' => map.add_hill(row, col, 1),
                _ => {}
            }
        }
    }
    map.finish_update();
    map.reveal_all();
    map
}

/// Re-feeds `map` with a new set of ants and food, keeping its water.
pub(crate) fn refeed(map: &mut Map, ants: &[Cell], food: &[Cell]) {
    let ants: Vec<(usize, usize)> = ants.iter().map(|cell| map.row_col(*cell)).collect();
    let food: Vec<(usize, usize)> = food.iter().map(|cell| map.row_col(*cell)).collect();
    map.begin_update();
    for (row, col) in ants {
        map.add_ant(row as i32, col as i32, FRIENDLY);
    }
    for (row, col) in food {
        map.add_food(row as i32, col as i32);
    }
    map.finish_update();
    map.reveal_all();
}
