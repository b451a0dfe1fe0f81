//! Breadth-first shortest paths over 4-connected path tiles
//!
//! Invoked per pursuer per recompute tick, not per frame, so a call is allowed
//! one parent grid and one queue but nothing superlinear in the grid size.

use std::collections::VecDeque;

use super::maze::{Maze, Tile};

/// Shortest tile route from `start` to `goal`, or `None` if unreachable
///
/// The returned sequence excludes `start` and includes `goal`: the first
/// element is the first step to take. `start == goal` yields an empty path.
/// Returns `None` when either endpoint is a wall or out of bounds. Among
/// equal-length routes the choice is unspecified; callers must not depend on
/// which one comes back.
pub fn shortest_path(maze: &Maze, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
    if !maze.is_path(start) || !maze.is_path(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let index = |tile: Tile| (tile.y * maze.width() + tile.x) as usize;
    let mut parent: Vec<Option<Tile>> = vec![None; (maze.width() * maze.height()) as usize];
    parent[index(start)] = Some(start);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(tile) = queue.pop_front() {
        if tile == goal {
            let mut route = Vec::new();
            let mut cursor = goal;
            while cursor != start {
                route.push(cursor);
                cursor = parent[index(cursor)].unwrap_or(start);
            }
            route.reverse();
            return Some(route);
        }
        for next in tile.neighbors() {
            if maze.is_path(next) && parent[index(next)].is_none() {
                parent[index(next)] = Some(tile);
                queue.push_back(next);
            }
        }
    }

    None
}
