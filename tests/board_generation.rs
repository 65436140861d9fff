//! Integration tests for procedural board generation.

use duskhold::{BoardConfig, Cell, Grid, Position, WalkCarver};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn generated_board_is_fully_covered_and_connected() {
    let carver = WalkCarver::new();
    let mut rng = StdRng::seed_from_u64(2024);
    let grid = carver.generate(30, 15, &mut rng).expect("generation failed");

    assert_eq!(grid.walkable_count(), 30 * 15);
    assert!(grid.is_fully_connected());
}

#[test]
fn flood_fill_reaches_every_walkable_cell_from_any_start() {
    let carver = WalkCarver::new();
    let mut rng = StdRng::seed_from_u64(17);
    let grid = carver.generate(12, 9, &mut rng).expect("generation failed");

    let total = grid.walkable_count();
    for start in grid.walkable_positions() {
        assert_eq!(grid.reachable_from(start).len(), total);
    }
}

#[test]
fn degenerate_grids_terminate() {
    let carver = WalkCarver::new();
    for (w, h) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = carver.generate(w, h, &mut rng).expect("generation failed");
        assert_eq!(grid.walkable_count(), w * h);
    }
}

#[test]
fn exhausted_budget_is_a_recoverable_failure() {
    let carver = WalkCarver {
        max_iterations_per_cell: 1,
    };
    let mut rng = StdRng::seed_from_u64(3);
    assert!(carver.generate(30, 15, &mut rng).is_err());

    // The retry wrapper with a sane budget succeeds.
    let healthy = WalkCarver::new();
    let config = BoardConfig::default();
    assert!(healthy.generate_with_retries(&config, 3).is_ok());
}

#[test]
fn forced_cells_stay_connected_through_corridor_carving() {
    // A hand-built walled board: carving an access corridor from an isolated
    // forced cell to the nearest walkable region restores full connectivity.
    let mut grid = Grid::new_filled(10, 6, Cell::Wall);
    for x in 4..10 {
        grid.set(Position::new(x, 3), Cell::Floor).unwrap();
    }
    let forced = Position::new(0, 0);
    grid.set(forced, Cell::Floor).unwrap();
    assert!(!grid.is_fully_connected());

    let anchor = grid.nearest_walkable(forced).unwrap();
    grid.carve_l_corridor(forced, anchor).unwrap();
    assert!(grid.is_fully_connected());
}

proptest! {
    // Board connectivity: for all sizes with W,H >= 2 and any seed, every
    // walkable cell reaches every other walkable cell.
    #[test]
    fn prop_board_connectivity(width in 2usize..24, height in 2usize..12, seed in any::<u64>()) {
        let carver = WalkCarver::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = carver.generate(width, height, &mut rng).unwrap();
        prop_assert!(grid.is_fully_connected());
        prop_assert_eq!(grid.walkable_count(), width * height);
    }
}
