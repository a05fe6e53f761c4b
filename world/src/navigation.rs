//! Deterministic grid pathfinder used by pursuers.

use std::{cmp::Reverse, collections::BinaryHeap};

use maze_chase_core::{CellCoord, Direction};

use crate::maze::Maze;

/// Computes a shortest four-directional route from `from` to `to`.
///
/// The route excludes `from` and ends with `to`. An empty route means there is
/// nothing to walk: the endpoints coincide, one of them lies off the grid, the
/// destination is a wall, or no route exists. Frontier ties are broken by
/// insertion order and neighbours are expanded Up, Down, Left, Right, so equal
/// inputs always produce the same route.
#[must_use]
pub fn find_path(maze: &Maze, from: CellCoord, to: CellCoord) -> Vec<CellCoord> {
    if from == to || maze.is_blocked(to) {
        return Vec::new();
    }

    let (Some(start), Some(goal)) = (maze.index(from), maze.index(to)) else {
        return Vec::new();
    };

    let width = usize::try_from(maze.columns()).unwrap_or(0);
    let cell_count = width * usize::try_from(maze.rows()).unwrap_or(0);
    let mut best_cost = vec![u32::MAX; cell_count];
    let mut came_from: Vec<Option<usize>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();
    let mut sequence = 0_u64;

    best_cost[start] = 0;
    open.push(Reverse(Frontier {
        estimate: from.manhattan_distance(to),
        sequence,
        index: start,
    }));

    while let Some(Reverse(node)) = open.pop() {
        if closed[node.index] {
            continue;
        }
        if node.index == goal {
            return reconstruct(&came_from, start, goal, width);
        }
        closed[node.index] = true;

        let cell = cell_at(width, node.index);
        let next_cost = best_cost[node.index].saturating_add(1);

        for neighbor in neighbors(cell) {
            if maze.is_blocked(neighbor) {
                continue;
            }
            let Some(neighbor_index) = maze.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || next_cost >= best_cost[neighbor_index] {
                continue;
            }

            best_cost[neighbor_index] = next_cost;
            came_from[neighbor_index] = Some(node.index);
            sequence += 1;
            open.push(Reverse(Frontier {
                estimate: next_cost + neighbor.manhattan_distance(to),
                sequence,
                index: neighbor_index,
            }));
        }
    }

    Vec::new()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    estimate: u32,
    sequence: u64,
    index: usize,
}

fn neighbors(cell: CellCoord) -> impl Iterator<Item = CellCoord> {
    Direction::MOVES.into_iter().filter_map(move |direction| {
        let (dx, dy) = direction.delta();
        let column = cell.column().checked_add_signed(dx)?;
        let row = cell.row().checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    })
}

fn reconstruct(came_from: &[Option<usize>], start: usize, goal: usize, width: usize) -> Vec<CellCoord> {
    let mut route = Vec::new();
    let mut cursor = goal;
    while cursor != start {
        route.push(cell_at(width, cursor));
        match came_from[cursor] {
            Some(previous) => cursor = previous,
            None => return Vec::new(),
        }
    }
    route.reverse();
    route
}

fn cell_at(width: usize, index: usize) -> CellCoord {
    CellCoord::new((index % width) as u32, (index / width) as u32)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::maze::CLASSIC_LAYOUT;

    fn open_room() -> Maze {
        Maze::parse(&["XXXXX", "XP  X", "X   X", "X   X", "XXXXX"]).expect("layout is valid")
    }

    fn breadth_first_distance(maze: &Maze, from: CellCoord, to: CellCoord) -> Option<usize> {
        let mut seen = vec![from];
        let mut queue = VecDeque::from([(from, 0)]);
        while let Some((cell, distance)) = queue.pop_front() {
            if cell == to {
                return Some(distance);
            }
            for neighbor in neighbors(cell) {
                if maze.is_blocked(neighbor) || seen.contains(&neighbor) {
                    continue;
                }
                seen.push(neighbor);
                queue.push_back((neighbor, distance + 1));
            }
        }
        None
    }

    #[test]
    fn equal_cost_routes_follow_direction_order() {
        let maze = open_room();
        let path = find_path(&maze, CellCoord::new(1, 1), CellCoord::new(3, 3));

        assert_eq!(
            path,
            vec![
                CellCoord::new(1, 2),
                CellCoord::new(1, 3),
                CellCoord::new(2, 3),
                CellCoord::new(3, 3),
            ]
        );
    }

    #[test]
    fn straight_route_has_expected_length() {
        let maze = Maze::parse(&[
            "XXXXXXX", "X     X", "X     X", "X     X", "X     X", "X    PX", "XXXXXXX",
        ])
        .expect("layout is valid");

        let path = find_path(&maze, CellCoord::new(5, 3), CellCoord::new(5, 5));

        assert_eq!(path, vec![CellCoord::new(5, 4), CellCoord::new(5, 5)]);
    }

    #[test]
    fn routes_are_shortest_and_contiguous() {
        let maze = Maze::parse(&CLASSIC_LAYOUT).expect("classic layout is valid");
        let cells = maze.open_cells();
        let origins = [cells[0], cells[cells.len() / 2], cells[cells.len() - 1]];

        for &from in &origins {
            for &to in cells.iter().step_by(7) {
                let path = find_path(&maze, from, to);
                let expected = breadth_first_distance(&maze, from, to);
                match expected {
                    Some(0) | None => assert!(path.is_empty()),
                    Some(distance) => {
                        assert_eq!(path.len(), distance, "route {from:?} -> {to:?} is not shortest");
                        let mut previous = from;
                        for &cell in &path {
                            assert_eq!(previous.manhattan_distance(cell), 1);
                            assert!(!maze.is_blocked(cell));
                            previous = cell;
                        }
                        assert_eq!(previous, to);
                    }
                }
            }
        }
    }

    #[test]
    fn identical_queries_return_identical_routes() {
        let maze = Maze::parse(&CLASSIC_LAYOUT).expect("classic layout is valid");
        let from = CellCoord::new(1, 1);
        let to = CellCoord::new(26, 29);

        let first = find_path(&maze, from, to);
        let second = find_path(&maze, from, to);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn unreachable_destination_yields_empty_route() {
        let maze = Maze::parse(&["XXXXXX", "XP X X", "XXXXXX"]).expect("layout is valid");

        assert!(find_path(&maze, CellCoord::new(1, 1), CellCoord::new(4, 1)).is_empty());
    }

    #[test]
    fn degenerate_queries_yield_empty_routes() {
        let maze = open_room();

        assert!(find_path(&maze, CellCoord::new(2, 2), CellCoord::new(2, 2)).is_empty());
        assert!(find_path(&maze, CellCoord::new(1, 1), CellCoord::new(0, 0)).is_empty());
        assert!(find_path(&maze, CellCoord::new(1, 1), CellCoord::new(9, 9)).is_empty());
    }
}
