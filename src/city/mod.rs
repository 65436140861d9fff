//! # City Module
//!
//! The static city hub: a walled board with the dungeon portal on its east
//! side. Entering the portal resets the dungeon to stage 1; leaving the
//! dungeon drops the player at a safe spot beside the portal.

use crate::config;
use crate::game::Position;
use crate::generation::{Cell, Grid};
use serde::{Deserialize, Serialize};

/// The city hub map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityMap {
    pub grid: Grid,
    /// Portal into the dungeon
    pub dungeon_portal: Position,
    /// Where new players appear
    pub spawn: Position,
}

impl CityMap {
    /// Builds the hub: border walls, an open plaza, and the dungeon portal
    /// set into the east wall at mid-height.
    pub fn new() -> Self {
        Self::with_size(config::CITY_WIDTH, config::CITY_HEIGHT)
    }

    /// Builds a hub of arbitrary size (small ones for tests).
    pub fn with_size(width: usize, height: usize) -> Self {
        let dungeon_portal = Position::new(width as i32 - 2, height as i32 / 2);
        let spawn = Position::new(width as i32 / 2, height as i32 / 2);

        let grid = Grid::from_fn(width, height, |pos| {
            let border = pos.x == 0
                || pos.y == 0
                || pos.x == width as i32 - 1
                || pos.y == height as i32 - 1;
            if border {
                Cell::Wall
            } else {
                Cell::Floor
            }
        });

        Self {
            grid,
            dungeon_portal,
            spawn,
        }
    }

    /// True if `pos` is the dungeon portal.
    pub fn portal_at(&self, pos: Position) -> bool {
        self.dungeon_portal == pos
    }

    /// Safe landing spot when returning from the dungeon: two cells west of
    /// the portal, so the player does not immediately re-enter it.
    pub fn return_spawn(&self) -> Position {
        Position::new(self.dungeon_portal.x - 2, self.dungeon_portal.y)
    }
}

impl Default for CityMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_layout() {
        let city = CityMap::new();
        assert_eq!(city.grid.width(), 60);
        assert_eq!(city.grid.height(), 30);
        // Border is walled, plaza and portal are open.
        assert!(!city.grid.is_walkable(Position::new(0, 0)));
        assert!(!city.grid.is_walkable(Position::new(59, 15)));
        assert!(city.grid.is_walkable(city.spawn));
        assert!(city.grid.is_walkable(city.dungeon_portal));
    }

    #[test]
    fn test_return_spawn_is_off_portal_and_walkable() {
        let city = CityMap::new();
        let spawn = city.return_spawn();
        assert_ne!(spawn, city.dungeon_portal);
        assert!(city.grid.is_walkable(spawn));
    }

    #[test]
    fn test_city_interior_connected() {
        let city = CityMap::new();
        assert!(city.grid.is_fully_connected());
    }
}
