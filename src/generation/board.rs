//! Randomized-walk board carver.
//!
//! The carver starts at a random cell and walks one uniformly chosen
//! cardinal step at a time, claiming cells as it goes. A step is blocked
//! when it would leave the board or land on a cell the walk already holds.
//! When all four directions are blocked the walker backtracks: the current
//! cell is popped off the path stack and handed to the backtrack pass (a
//! distinct marker, so the retry from the new stack top is not instantly
//! re-blocked by it) and the walk resumes from the stack top. The loop ends
//! once no unvisited cell remains, and every cell touched by either pass
//! comes out walkable, so a finished board is covered wall to wall.
//!
//! Each cell is claimed at most once and popped at most once, which bounds
//! the walk at `2 * area` steps. The iteration cap stays on anyway: the
//! walk's termination is the one property this module refuses to take on
//! faith, and blowing the budget is a recoverable generation failure retried
//! under a fresh seed.

use super::{BoardConfig, Cell, Grid};
use crate::game::{Direction, Position};
use crate::{DuskholdError, DuskholdResult};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Carve state of one cell during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Never touched by either pass
    Unvisited,
    /// Currently held by the walk pass
    Walked,
    /// Released to the backtrack pass
    Backtracked,
}

/// Board generator using a randomized walk with backtracking.
#[derive(Debug, Clone)]
pub struct WalkCarver {
    /// Iteration budget per grid cell
    pub max_iterations_per_cell: u32,
}

impl WalkCarver {
    pub fn new() -> Self {
        Self {
            max_iterations_per_cell: crate::config::MAX_CARVE_ITERATIONS_PER_CELL,
        }
    }

    /// Carves a board with the given RNG.
    ///
    /// Returns `GenerationFailed` if the iteration cap is exceeded before
    /// full coverage.
    pub fn generate(&self, width: usize, height: usize, rng: &mut StdRng) -> DuskholdResult<Grid> {
        if width == 0 || height == 0 {
            return Err(DuskholdError::GenerationFailed(format!(
                "degenerate board size {}x{}",
                width, height
            )));
        }

        let mut marks = vec![Mark::Unvisited; width * height];
        let index = |pos: Position| pos.y as usize * width + pos.x as usize;
        let in_bounds = |pos: Position| {
            pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < width && (pos.y as usize) < height
        };

        let start = Position::new(
            rng.gen_range(0..width) as i32,
            rng.gen_range(0..height) as i32,
        );
        marks[index(start)] = Mark::Walked;
        let mut unvisited = width * height - 1;
        let mut stack = vec![start];

        let budget = (width * height) as u64 * self.max_iterations_per_cell as u64;
        let mut iterations: u64 = 0;

        while unvisited > 0 {
            iterations += 1;
            if iterations > budget {
                return Err(DuskholdError::GenerationFailed(format!(
                    "carve budget exhausted after {} iterations on {}x{} board",
                    iterations, width, height
                )));
            }

            let current = match stack.last() {
                Some(&pos) => pos,
                None => {
                    return Err(DuskholdError::GenerationFailed(
                        "path stack emptied before full coverage".to_string(),
                    ));
                }
            };

            let mut open: Vec<Position> = Vec::with_capacity(4);
            for dir in Direction::all() {
                let target = current + dir.to_delta();
                if in_bounds(target) && marks[index(target)] == Mark::Unvisited {
                    open.push(target);
                }
            }

            if let Some(&next) = open.choose(rng) {
                marks[index(next)] = Mark::Walked;
                unvisited -= 1;
                stack.push(next);
            } else {
                // Stuck: release the current cell to the backtrack pass and
                // resume from the one beneath it.
                let popped = stack.pop().unwrap_or(current);
                marks[index(popped)] = Mark::Backtracked;
            }
        }

        // Full coverage: every cell was visited by one of the two passes,
        // and visited cells are walkable.
        let grid = Grid::new_filled(width, height, Cell::Floor);

        debug!(
            "carved {}x{} board: {} floor cells in {} iterations",
            width,
            height,
            grid.walkable_count(),
            iterations
        );
        Ok(grid)
    }

    /// Carves a board, retrying under derived fresh seeds when an attempt
    /// blows the iteration budget.
    pub fn generate_with_retries(&self, config: &BoardConfig, seed: u64) -> DuskholdResult<Grid> {
        let mut last_err = None;
        for attempt in 0..config.retry_limit.max(1) {
            let attempt_seed = seed ^ (attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let mut rng = StdRng::seed_from_u64(attempt_seed);
            match self.generate(config.width, config.height, &mut rng) {
                Ok(grid) => return Ok(grid),
                Err(err) => {
                    warn!("board generation attempt {} failed: {}", attempt + 1, err);
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            DuskholdError::GenerationFailed("no generation attempts were made".to_string())
        }))
    }
}

impl Default for WalkCarver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_board_terminates_immediately() {
        let carver = WalkCarver::new();
        let mut rng = StdRng::seed_from_u64(1);
        let grid = carver.generate(1, 1, &mut rng).unwrap();
        assert_eq!(grid.walkable_count(), 1);
    }

    #[test]
    fn test_one_wide_corridor_covers_fully() {
        let carver = WalkCarver::new();
        for seed in 0..10u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = carver.generate(1, 9, &mut rng).unwrap();
            assert_eq!(grid.walkable_count(), 9);
            assert!(grid.is_fully_connected());
        }
    }

    #[test]
    fn test_generated_boards_cover_and_connect() {
        let carver = WalkCarver::new();
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = carver.generate(30, 15, &mut rng).unwrap();
            assert!(grid.is_fully_connected(), "seed {} disconnected", seed);
            assert_eq!(grid.walkable_count(), 30 * 15, "seed {} not covered", seed);
        }
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let carver = WalkCarver::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(carver.generate(0, 4, &mut rng).is_err());
    }

    #[test]
    fn test_starved_iteration_budget_fails_recoverably() {
        // One iteration per cell cannot cover a board that needs any real
        // amount of backtracking.
        let carver = WalkCarver {
            max_iterations_per_cell: 1,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let result = carver.generate(30, 15, &mut rng);
        assert!(matches!(result, Err(DuskholdError::GenerationFailed(_))));
    }

    #[test]
    fn test_generate_with_retries_default_config() {
        let carver = WalkCarver::new();
        let config = BoardConfig::default();
        let grid = carver.generate_with_retries(&config, 1234).unwrap();
        assert_eq!(grid.width(), 30);
        assert_eq!(grid.height(), 15);
        assert!(grid.is_fully_connected());
    }
}
