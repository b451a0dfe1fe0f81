//! Perfect-maze generation over a tile grid
//!
//! The generator runs a randomized depth-first backtracker on the odd-coordinate
//! sub-lattice, producing a spanning tree over path cells: every path tile is
//! reachable from every other, with no loops. The outer border ring is forced to
//! `Wall` after carving so movement code never needs wraparound checks.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One grid unit of the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Path,
}

/// Integer grid coordinate, authoritative for all game logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center of the tile in continuous tile units (one tile = 1.0)
    pub fn center(self) -> glam::Vec2 {
        glam::Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    pub fn manhattan(self, other: Tile) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// 4-connected neighbors (up, down, left, right)
    pub fn neighbors(self) -> [Tile; 4] {
        [
            Tile::new(self.x, self.y - 1),
            Tile::new(self.x, self.y + 1),
            Tile::new(self.x - 1, self.y),
            Tile::new(self.x + 1, self.y),
        ]
    }
}

/// Rectangular maze grid, row-major
///
/// Immutable after generation except for [`Maze::clear_area`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maze {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

/// Coerce a requested dimension to a valid odd size >= 5
///
/// Even or undersized requests are a caller error class we correct rather than
/// reject: the generator's odd-lattice structure requires odd dimensions.
fn coerce_dimension(requested: i32) -> i32 {
    let mut dim = requested.max(5);
    if dim % 2 == 0 {
        dim += 1;
    }
    if dim != requested {
        log::warn!("maze dimension {requested} coerced to {dim}");
    }
    dim
}

impl Maze {
    /// Generate a perfect maze with the given dimensions
    ///
    /// Dimensions are coerced to odd values >= 5. Carving uses an explicit
    /// stack so large grids cannot overflow the call stack.
    pub fn generate(width: i32, height: i32, rng: &mut impl Rng) -> Self {
        let width = coerce_dimension(width);
        let height = coerce_dimension(height);

        let mut maze = Self {
            width,
            height,
            cells: vec![Cell::Wall; (width * height) as usize],
        };

        // Odd-lattice cells start open and fully enclosed by walls
        for y in (1..height).step_by(2) {
            for x in (1..width).step_by(2) {
                maze.set(Tile::new(x, y), Cell::Path);
            }
        }

        // Depth-first backtracker over the odd lattice, carving connecting walls
        let start = Tile::new(1, 1);
        let mut visited = vec![false; (width * height) as usize];
        visited[maze.index(start)] = true;
        let mut stack = vec![start];
        let mut candidates: Vec<Tile> = Vec::with_capacity(4);

        while let Some(&current) = stack.last() {
            candidates.clear();
            for (dx, dy) in [(0, -2), (0, 2), (-2, 0), (2, 0)] {
                let next = Tile::new(current.x + dx, current.y + dy);
                if next.x >= 1
                    && next.x < width
                    && next.y >= 1
                    && next.y < height
                    && !visited[maze.index(next)]
                {
                    candidates.push(next);
                }
            }

            if candidates.is_empty() {
                stack.pop();
            } else {
                let next = candidates[rng.random_range(0..candidates.len())];
                let wall = Tile::new((current.x + next.x) / 2, (current.y + next.y) / 2);
                maze.set(wall, Cell::Path);
                visited[maze.index(next)] = true;
                stack.push(next);
            }
        }

        // Hard boundary regardless of what carving touched
        for x in 0..width {
            maze.set(Tile::new(x, 0), Cell::Wall);
            maze.set(Tile::new(x, height - 1), Cell::Wall);
        }
        for y in 0..height {
            maze.set(Tile::new(0, y), Cell::Wall);
            maze.set(Tile::new(width - 1, y), Cell::Wall);
        }

        maze
    }

    /// Force a square neighborhood to `Path`, clamped inside the border ring
    ///
    /// This is the one sanctioned violation of the perfect-maze invariant,
    /// used during level setup to open catch-free spawn and gate zones.
    pub fn clear_area(&mut self, center: Tile, radius: i32) {
        for y in (center.y - radius)..=(center.y + radius) {
            for x in (center.x - radius)..=(center.x + radius) {
                if x >= 1 && x < self.width - 1 && y >= 1 && y < self.height - 1 {
                    self.set(Tile::new(x, y), Cell::Path);
                }
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.x < self.width && tile.y >= 0 && tile.y < self.height
    }

    pub fn cell(&self, tile: Tile) -> Cell {
        self.cells[self.index(tile)]
    }

    /// True if the tile is in bounds and walkable
    pub fn is_path(&self, tile: Tile) -> bool {
        self.in_bounds(tile) && self.cell(tile) == Cell::Path
    }

    /// Row-major cell grid for rendering
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Total number of walkable tiles
    pub fn path_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Path).count()
    }

    /// Number of path tiles reachable from `from` via 4-connected moves
    ///
    /// Flood fill, used for level validation and connectivity tests.
    pub fn reachable_count(&self, from: Tile) -> usize {
        if !self.is_path(from) {
            return 0;
        }
        let mut seen = vec![false; self.cells.len()];
        seen[self.index(from)] = true;
        let mut frontier = vec![from];
        let mut count = 0usize;
        while let Some(tile) = frontier.pop() {
            count += 1;
            for next in tile.neighbors() {
                if self.is_path(next) && !seen[self.index(next)] {
                    seen[self.index(next)] = true;
                    frontier.push(next);
                }
            }
        }
        count
    }

    /// Random odd-lattice tile; always walkable by construction
    pub fn random_path_tile(&self, rng: &mut impl Rng) -> Tile {
        let x = 2 * rng.random_range(0..(self.width - 1) / 2) + 1;
        let y = 2 * rng.random_range(0..(self.height - 1) / 2) + 1;
        let tile = Tile::new(x, y);
        debug_assert!(self.is_path(tile));
        tile
    }

    fn index(&self, tile: Tile) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    fn set(&mut self, tile: Tile, cell: Cell) {
        let idx = self.index(tile);
        self.cells[idx] = cell;
    }
}
