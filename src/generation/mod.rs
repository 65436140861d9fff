//! # Generation Module
//!
//! Procedural board generation for dungeon stages.
//!
//! The board is a fixed-size grid of wall/floor cells. Dungeon layouts come
//! from [`WalkCarver`], a randomized walk with backtracking that guarantees
//! the walkable region is fully connected.

pub mod board;

pub use board::WalkCarver;

use crate::{DuskholdError, DuskholdResult};
use crate::game::Position;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Floor,
    Wall,
}

impl Cell {
    /// Glyph used when the board is rendered.
    pub fn glyph(self) -> char {
        match self {
            Cell::Floor => '.',
            Cell::Wall => '#',
        }
    }

    /// True if an entity may occupy this cell.
    pub fn is_walkable(self) -> bool {
        matches!(self, Cell::Floor)
    }
}

/// Configuration for board generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Carve iteration budget per cell before generation is abandoned
    pub max_iterations_per_cell: u32,
    /// Fresh-seed retries after a failed generation
    pub retry_limit: u32,
}

impl BoardConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            max_iterations_per_cell: crate::config::MAX_CARVE_ITERATIONS_PER_CELL,
            retry_limit: crate::config::BOARD_RETRY_LIMIT,
        }
    }

    /// Small boards for fast tests.
    pub fn for_testing() -> Self {
        Self::new(8, 4)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(crate::config::DUNGEON_WIDTH, crate::config::DUNGEON_HEIGHT)
    }
}

/// Fixed-size 2D board of cells, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with every cell set to `fill`.
    pub fn new_filled(width: usize, height: usize, fill: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Creates a grid by evaluating `f` at every position, row-major.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(Position) -> Cell) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(Position::new(x as i32, y as i32)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Position) -> usize {
        pos.y as usize * self.width + pos.x as usize
    }

    pub fn get(&self, pos: Position) -> Option<Cell> {
        if self.in_bounds(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    pub fn set(&mut self, pos: Position, cell: Cell) -> DuskholdResult<()> {
        if !self.in_bounds(pos) {
            return Err(DuskholdError::InvalidState(format!(
                "position ({}, {}) outside {}x{} board",
                pos.x, pos.y, self.width, self.height
            )));
        }
        let idx = self.index(pos);
        self.cells[idx] = cell;
        Ok(())
    }

    /// True if the cell exists and an entity may occupy it.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get(pos).map(Cell::is_walkable).unwrap_or(false)
    }

    /// All walkable positions in row-major order.
    pub fn walkable_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x as i32, y as i32);
                if self.is_walkable(pos) {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_walkable()).count()
    }

    /// Flood-fills from `start` across walkable cells (cardinal adjacency).
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        let mut visited = HashSet::new();
        if !self.is_walkable(start) {
            return visited;
        }
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(pos) = queue.pop_front() {
            for adjacent in pos.cardinal_adjacent_positions() {
                if self.is_walkable(adjacent) && visited.insert(adjacent) {
                    queue.push_back(adjacent);
                }
            }
        }
        visited
    }

    /// True if every walkable cell is reachable from every other walkable
    /// cell.
    pub fn is_fully_connected(&self) -> bool {
        let walkable = self.walkable_positions();
        match walkable.first() {
            None => true,
            Some(&start) => self.reachable_from(start).len() == walkable.len(),
        }
    }

    /// Carves an L-shaped floor corridor between two points, horizontal leg
    /// first. Used to connect forced cells (spawn, exit portal) to the
    /// carved region.
    pub fn carve_l_corridor(&mut self, start: Position, end: Position) -> DuskholdResult<()> {
        let min_x = start.x.min(end.x);
        let max_x = start.x.max(end.x);
        for x in min_x..=max_x {
            let pos = Position::new(x, start.y);
            if self.in_bounds(pos) {
                self.set(pos, Cell::Floor)?;
            }
        }
        let min_y = start.y.min(end.y);
        let max_y = start.y.max(end.y);
        for y in min_y..=max_y {
            let pos = Position::new(end.x, y);
            if self.in_bounds(pos) {
                self.set(pos, Cell::Floor)?;
            }
        }
        Ok(())
    }

    /// The walkable cell nearest to `from` by Manhattan distance, excluding
    /// `from` itself.
    pub fn nearest_walkable(&self, from: Position) -> Option<Position> {
        self.walkable_positions()
            .into_iter()
            .filter(|&p| p != from)
            .min_by_key(|&p| from.manhattan_distance(p))
    }

    /// Renders the bare terrain as one string per row.
    pub fn render_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        self.get(Position::new(x as i32, y as i32))
                            .map(Cell::glyph)
                            .unwrap_or(' ')
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_bounds() {
        let grid = Grid::new_filled(4, 3, Cell::Wall);
        assert!(grid.in_bounds(Position::new(0, 0)));
        assert!(grid.in_bounds(Position::new(3, 2)));
        assert!(!grid.in_bounds(Position::new(4, 0)));
        assert!(!grid.in_bounds(Position::new(0, -1)));
        assert!(grid.get(Position::new(9, 9)).is_none());
    }

    #[test]
    fn test_set_rejects_out_of_bounds() {
        let mut grid = Grid::new_filled(4, 3, Cell::Wall);
        assert!(grid.set(Position::new(-1, 0), Cell::Floor).is_err());
        assert!(grid.set(Position::new(2, 1), Cell::Floor).is_ok());
        assert!(grid.is_walkable(Position::new(2, 1)));
    }

    #[test]
    fn test_reachable_from_walled_off_region() {
        // Two floor cells separated by a wall column are mutually
        // unreachable.
        let mut grid = Grid::new_filled(3, 1, Cell::Wall);
        grid.set(Position::new(0, 0), Cell::Floor).unwrap();
        grid.set(Position::new(2, 0), Cell::Floor).unwrap();

        assert!(!grid.is_fully_connected());
        assert_eq!(grid.reachable_from(Position::new(0, 0)).len(), 1);
    }

    #[test]
    fn test_l_corridor_connects() {
        let mut grid = Grid::new_filled(10, 10, Cell::Wall);
        grid.carve_l_corridor(Position::new(1, 1), Position::new(7, 6))
            .unwrap();
        assert!(grid.is_walkable(Position::new(1, 1)));
        assert!(grid.is_walkable(Position::new(7, 6)));
        assert!(grid.is_fully_connected());
    }

    #[test]
    fn test_nearest_walkable() {
        let mut grid = Grid::new_filled(5, 5, Cell::Wall);
        grid.set(Position::new(4, 4), Cell::Floor).unwrap();
        grid.set(Position::new(2, 0), Cell::Floor).unwrap();
        assert_eq!(
            grid.nearest_walkable(Position::new(0, 0)),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn test_render_rows_glyphs() {
        let mut grid = Grid::new_filled(2, 2, Cell::Wall);
        grid.set(Position::new(0, 0), Cell::Floor).unwrap();
        let rows = grid.render_rows();
        assert_eq!(rows, vec![".#".to_string(), "##".to_string()]);
    }
}
