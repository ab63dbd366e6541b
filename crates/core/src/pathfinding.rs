//! Breadth-first wavefront search over the toroidal grid.
//! This module exists so routing rules are shared by hunting and exploration.
//! It does not own path caching or target selection.

use std::collections::VecDeque;

use crate::map::GridOracle;
use crate::types::*;

/// Directions to walk, front first.
pub type Path = VecDeque<Direction>;

/// Shortest route from `source` to `destination` avoiding `blocked` cells.
///
/// Returns `None` when the two cells are equal (nothing to walk) or when the
/// destination is not reachable.
pub fn find_path<G, Blocked>(
    grid: &G,
    source: Cell,
    destination: Cell,
    blocked: Blocked,
) -> Option<Path>
where
    G: GridOracle + ?Sized,
    Blocked: Fn(Cell) -> bool,
{
    if source == destination {
        return None;
    }
    find_nearest_path(grid, source, |cell| cell == destination, blocked).map(|(_, path)| path)
}

/// Route to the closest cell other than `source` that satisfies `is_goal`.
pub fn find_nearest_path<G, IsGoal, Blocked>(
    grid: &G,
    source: Cell,
    is_goal: IsGoal,
    blocked: Blocked,
) -> Option<(Cell, Path)>
where
    G: GridOracle + ?Sized,
    IsGoal: Fn(Cell) -> bool,
    Blocked: Fn(Cell) -> bool,
{
    let mut waves: Vec<Option<u32>> = vec![None; grid.cell_count()];
    let mut queue = VecDeque::new();
    waves[source.index()] = Some(0);
    queue.push_back((source, 0u32));

    while let Some((current, wave)) = queue.pop_front() {
        if current != source && is_goal(current) {
            return Some((current, reconstruct_path(grid, &waves, source, current)));
        }
        for direction in Direction::SEARCH_ORDER {
            let next = grid.step(current, direction);
            if waves[next.index()].is_some() || blocked(next) {
                continue;
            }
            waves[next.index()] = Some(wave + 1);
            queue.push_back((next, wave + 1));
        }
    }

    None
}

/// First step toward the closest cell other than `source` that satisfies `is_goal`.
pub fn find_direction_toward<G, IsGoal, Blocked>(
    grid: &G,
    source: Cell,
    is_goal: IsGoal,
    blocked: Blocked,
) -> Option<Direction>
where
    G: GridOracle + ?Sized,
    IsGoal: Fn(Cell) -> bool,
    Blocked: Fn(Cell) -> bool,
{
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    visited[source.index()] = true;
    for direction in Direction::SEARCH_ORDER {
        let next = grid.step(source, direction);
        if visited[next.index()] || blocked(next) {
            continue;
        }
        visited[next.index()] = true;
        queue.push_back((next, direction));
    }

    while let Some((current, first)) = queue.pop_front() {
        if is_goal(current) {
            return Some(first);
        }
        for direction in Direction::SEARCH_ORDER {
            let next = grid.step(current, direction);
            if visited[next.index()] || blocked(next) {
                continue;
            }
            visited[next.index()] = true;
            queue.push_back((next, first));
        }
    }

    None
}

// Walks back from the goal, always to the visited neighbor with the smallest
// wave. Ties go to the earliest direction in `SEARCH_ORDER`.
fn reconstruct_path<G>(grid: &G, waves: &[Option<u32>], source: Cell, goal: Cell) -> Path
where
    G: GridOracle + ?Sized,
{
    let mut path = Path::new();
    let mut current = goal;
    while current != source {
        let mut best: Option<(u32, Direction, Cell)> = None;
        for direction in Direction::SEARCH_ORDER {
            let neighbor = grid.step(current, direction);
            if let Some(wave) = waves[neighbor.index()]
                && best.is_none_or(|(best_wave, _, _)| wave < best_wave)
            {
                best = Some((wave, direction.inverse(), neighbor));
            }
        }
        let Some((_, direction, previous)) = best else {
            break;
        };
        path.push_front(direction);
        current = previous;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::test_support::*;

    fn walk(map: &Map, start: Cell, path: &Path) -> Vec<Cell> {
        let mut cells = vec![start];
        let mut current = start;
        for direction in path {
            current = map.step(current, *direction);
            cells.push(current);
        }
        cells
    }

    #[test]
    fn same_cell_is_not_a_path() {
        let map = open_map(6, 6);
        let cell = map.cell(2, 2);
        assert!(find_path(&map, cell, cell, |_| false).is_none());
    }

    #[test]
    fn open_grid_paths_match_toroidal_manhattan_distance() {
        let map = open_map(7, 9);
        let source = map.cell(1, 2);
        for row in 0..7 {
            for col in 0..9 {
                let destination = map.cell(row, col);
                if destination == source {
                    continue;
                }
                let path = find_path(&map, source, destination, |_| false)
                    .expect("open grid is fully connected");
                let dr = (row - 1).unsigned_abs().min(7 - (row - 1).unsigned_abs());
                let dc = (col - 2).unsigned_abs().min(9 - (col - 2).unsigned_abs());
                assert_eq!(path.len() as u32, dr + dc, "to ({row}, {col})");
                assert_eq!(walk(&map, source, &path).last(), Some(&destination));
            }
        }
    }

    #[test]
    fn path_detours_around_water_and_never_enters_it() {
        let map = map_from_rows(&[
            "..........",
            "..%%%%%%..",
            "..%....%..",
            "..%.%%.%..",
            "..........",
        ]);
        let water = |cell: Cell| map.is_water(cell);
        let source = map.cell(0, 0);
        let destination = map.cell(2, 4);

        let path = find_path(&map, source, destination, water).expect("route exists");
        let cells = walk(&map, source, &path);
        assert_eq!(cells.last(), Some(&destination));
        assert!(cells.iter().all(|cell| !map.is_water(*cell)));
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn walled_off_destination_is_unreachable() {
        let map = map_from_rows(&[
            "......",
            "..%%%.",
            "..%.%.",
            "..%%%.",
            "......",
        ]);
        let found = find_path(&map, map.cell(0, 0), map.cell(2, 3), |cell| map.is_water(cell));
        assert!(found.is_none());
    }

    #[test]
    fn equal_length_routes_resolve_the_same_way_every_time() {
        let map = open_map(10, 10);
        let source = map.cell(2, 2);
        let destination = map.cell(4, 4);
        let first = find_path(&map, source, destination, |_| false).expect("path");
        for _ in 0..5 {
            assert_eq!(find_path(&map, source, destination, |_| false), Some(first.clone()));
        }
        assert_eq!(
            first,
            Path::from(vec![Direction::South, Direction::South, Direction::East, Direction::East])
        );
    }

    #[test]
    fn nearest_path_reports_the_closest_goal() {
        let map = open_map(9, 9);
        let near = map.cell(4, 6);
        let far = map.cell(0, 4);
        let (goal, path) = find_nearest_path(
            &map,
            map.cell(4, 4),
            |cell| cell == near || cell == far,
            |_| false,
        )
        .expect("goal in reach");
        assert_eq!(goal, near);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn direction_toward_frontier_takes_the_first_step_of_a_shortest_route() {
        let map = map_from_rows(&[
            ".....",
            ".%%%.",
            ".%...",
            ".%%%.",
            ".....",
        ]);
        let target = map.cell(2, 0);
        let direction = find_direction_toward(
            &map,
            map.cell(2, 2),
            |cell| cell == target,
            |cell| map.is_water(cell),
        );
        // Every other exit is water; the route east wraps around to column 0.
        assert_eq!(direction, Some(Direction::East));
    }

    #[test]
    fn direction_toward_gives_up_when_nothing_matches() {
        let map = open_map(4, 4);
        assert_eq!(find_direction_toward(&map, map.cell(0, 0), |_| false, |_| false), None);
    }
}
