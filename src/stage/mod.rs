//! # Stage Module
//!
//! The dungeon stage controller: board generation, enemy/chest population
//! scaled by stage depth, boss-stage rules, portal spawning and stage
//! transitions.

use crate::content::{ContentPack, Item};
use crate::game::{new_entity_id, Combatant, Enemy, EntityId, Position};
use crate::generation::{BoardConfig, Cell, Grid, WalkCarver};
use crate::{config, DuskholdResult};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stage lifecycle. Generation and population happen inside
/// [`DungeonStage::generate`]; the interesting transitions afterwards are
/// `InProgress → PortalActive` (last enemy dies) and
/// `PortalActive → Transitioning → Generating` (player steps through).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagePhase {
    Generating,
    Populated,
    InProgress,
    PortalActive,
    Transitioning,
}

/// Something the stage did during a tick that the UI should report.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    PortalSpawned(Position),
}

/// A loot chest. The loot is rolled when the chest is created, not when it
/// is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chest {
    pub id: EntityId,
    pub position: Position,
    pub open: bool,
    loot: Item,
}

impl Chest {
    /// Creates a chest with loot pre-rolled from the pack's chest pool.
    pub fn roll(position: Position, content: &ContentPack, rng: &mut StdRng) -> Option<Self> {
        let pool = content.chest_loot_pool();
        let loot = pool.choose(rng)?;
        Some(Self {
            id: new_entity_id(),
            position,
            open: false,
            loot: (*loot).clone(),
        })
    }

    /// Opens the chest, yielding its loot exactly once.
    pub fn open_once(&mut self) -> Option<Item> {
        if self.open {
            return None;
        }
        self.open = true;
        Some(self.loot.clone())
    }

    /// Board glyph: filled while closed, hollow afterwards.
    pub fn glyph(&self) -> char {
        if self.open {
            '□'
        } else {
            '▣'
        }
    }
}

/// One dungeon stage: its board, rosters and portals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonStage {
    pub stage_number: u32,
    pub grid: Grid,
    pub enemies: Vec<Enemy>,
    pub chests: Vec<Chest>,
    /// Where the player lands when the stage starts
    pub spawn: Position,
    /// Always-active portal back to the city, next to the spawn point
    pub exit_portal: Position,
    /// Next-level portal, spawned once the stage is cleared
    pub portal: Option<Position>,
    pub phase: StagePhase,
    board_config: BoardConfig,
}

impl DungeonStage {
    /// Generates and populates stage `stage_number`.
    pub fn generate(
        stage_number: u32,
        board_config: BoardConfig,
        content: &ContentPack,
        carver: &WalkCarver,
        seed: u64,
        rng: &mut StdRng,
    ) -> DuskholdResult<Self> {
        let mut grid = carver.generate_with_retries(&board_config, seed)?;

        // The spawn corner and the exit portal beside it are always
        // walkable; tie them into the carved region so the connectivity
        // invariant survives.
        let spawn = Position::origin();
        let exit_portal = Position::new(1, 0);
        grid.set(spawn, Cell::Floor)?;
        grid.set(exit_portal, Cell::Floor)?;
        let anchor = grid
            .walkable_positions()
            .into_iter()
            .filter(|&p| p != spawn && p != exit_portal)
            .min_by_key(|&p| spawn.manhattan_distance(p));
        if let Some(anchor) = anchor {
            grid.carve_l_corridor(spawn, anchor)?;
        }

        let mut stage = Self {
            stage_number,
            grid,
            enemies: Vec::new(),
            chests: Vec::new(),
            spawn,
            exit_portal,
            portal: None,
            phase: StagePhase::Generating,
            board_config,
        };
        stage.populate(content, rng);
        stage.phase = StagePhase::Populated;
        Ok(stage)
    }

    /// Every fifth stage belongs to a boss.
    pub fn is_boss_stage(&self) -> bool {
        self.stage_number % 5 == 0
    }

    /// Spawns the stage's enemies and chests at random walkable positions.
    ///
    /// Non-boss stages get `5 + stage` enemies; boss stages get one boss
    /// plus 2–5 minions. Chests: `3 + stage/2`. Placement resamples up to a
    /// bounded attempt count and then settles for however many fit.
    fn populate(&mut self, content: &ContentPack, rng: &mut StdRng) {
        let mut occupied: HashSet<Position> = HashSet::new();
        occupied.insert(self.spawn);
        occupied.insert(self.exit_portal);

        let level = self.stage_number;
        if self.is_boss_stage() {
            if let Some(pos) = self.place(&mut occupied, rng) {
                self.enemies
                    .push(Enemy::spawn(&content.boss, level, true, pos, content, rng));
            }
            let minions = rng.gen_range(2..=5);
            for _ in 0..minions {
                self.spawn_minion(content, &mut occupied, rng);
            }
        } else {
            let count = 5 + level;
            for _ in 0..count {
                self.spawn_minion(content, &mut occupied, rng);
            }
        }

        let chest_count = 3 + level / 2;
        for _ in 0..chest_count {
            if let Some(pos) = self.place(&mut occupied, rng) {
                if let Some(chest) = Chest::roll(pos, content, rng) {
                    self.chests.push(chest);
                }
            }
        }

        info!(
            "stage {}: {} enemies, {} chests on {} walkable cells",
            self.stage_number,
            self.enemies.len(),
            self.chests.len(),
            self.grid.walkable_count()
        );
    }

    fn spawn_minion(
        &mut self,
        content: &ContentPack,
        occupied: &mut HashSet<Position>,
        rng: &mut StdRng,
    ) {
        let Some(pos) = self.place(occupied, rng) else {
            return;
        };
        if let Some(archetype) = content.enemies.choose(rng) {
            self.enemies.push(Enemy::spawn(
                archetype,
                self.stage_number,
                false,
                pos,
                content,
                rng,
            ));
        }
    }

    /// Picks a random walkable, unoccupied cell, resampling up to the
    /// placement cap. `None` means the board is too crowded; the caller
    /// places as many entities as fit.
    fn place(&self, occupied: &mut HashSet<Position>, rng: &mut StdRng) -> Option<Position> {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        for _ in 0..config::MAX_PLACEMENT_ATTEMPTS {
            let pos = Position::new(rng.gen_range(0..width), rng.gen_range(0..height));
            if self.grid.is_walkable(pos) && !occupied.contains(&pos) {
                occupied.insert(pos);
                return Some(pos);
            }
        }
        warn!(
            "stage {}: no free cell found after {} attempts",
            self.stage_number,
            config::MAX_PLACEMENT_ATTEMPTS
        );
        None
    }

    /// Marks the stage as running. Populated stages become ticking stages
    /// the moment the player arrives.
    pub fn begin(&mut self) {
        if self.phase == StagePhase::Populated {
            self.phase = StagePhase::InProgress;
        }
    }

    /// One game tick: enemies wander, the dead are culled, and clearing the
    /// stage spawns the next-level portal.
    pub fn tick(&mut self, rng: &mut StdRng) -> Vec<StageEvent> {
        let mut events = Vec::new();

        self.enemies.retain(|e| e.combat().is_alive());
        for enemy in &mut self.enemies {
            enemy.wander(&self.grid, rng);
        }

        if self.enemies.is_empty()
            && self.portal.is_none()
            && matches!(self.phase, StagePhase::InProgress)
        {
            if let Some(pos) = self.pick_portal_cell(rng) {
                self.portal = Some(pos);
                self.phase = StagePhase::PortalActive;
                events.push(StageEvent::PortalSpawned(pos));
            }
        }
        events
    }

    fn pick_portal_cell(&self, rng: &mut StdRng) -> Option<Position> {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        for _ in 0..config::MAX_PLACEMENT_ATTEMPTS {
            let pos = Position::new(rng.gen_range(0..width), rng.gen_range(0..height));
            if self.grid.is_walkable(pos) && pos != self.spawn && pos != self.exit_portal {
                return Some(pos);
            }
        }
        // Crowded or tiny board: fall back to any walkable cell.
        self.grid
            .walkable_positions()
            .into_iter()
            .find(|&p| p != self.spawn && p != self.exit_portal)
    }

    /// True if the player standing at `pos` is on the active next-level
    /// portal.
    pub fn portal_at(&self, pos: Position) -> bool {
        matches!(self.phase, StagePhase::PortalActive) && self.portal == Some(pos)
    }

    /// True if `pos` is the always-active exit portal back to the city.
    pub fn exit_portal_at(&self, pos: Position) -> bool {
        self.exit_portal == pos
    }

    /// Index of a living enemy standing at `pos`.
    pub fn enemy_at(&self, pos: Position) -> Option<usize> {
        self.enemies
            .iter()
            .position(|e| e.position == pos && e.combat().is_alive())
    }

    /// Opens the chest at `pos`, if there is an unopened one.
    pub fn open_chest_at(&mut self, pos: Position) -> Option<Item> {
        self.chests
            .iter_mut()
            .find(|c| c.position == pos)
            .and_then(Chest::open_once)
    }

    /// Regenerates this controller for the next stage: stage number
    /// increments, rosters clear, and a fresh board is carved and populated.
    pub fn advance(
        &mut self,
        content: &ContentPack,
        carver: &WalkCarver,
        seed: u64,
        rng: &mut StdRng,
    ) -> DuskholdResult<()> {
        self.phase = StagePhase::Transitioning;
        let next = Self::generate(
            self.stage_number + 1,
            self.board_config.clone(),
            content,
            carver,
            seed,
            rng,
        )?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn build_stage(stage_number: u32, seed: u64) -> DungeonStage {
        let content = ContentPack::builtin();
        let carver = WalkCarver::new();
        let mut rng = StdRng::seed_from_u64(seed);
        DungeonStage::generate(
            stage_number,
            BoardConfig::default(),
            &content,
            &carver,
            seed,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_normal_stage_population() {
        let stage = build_stage(1, 11);
        assert_eq!(stage.phase, StagePhase::Populated);
        assert_eq!(stage.enemies.len(), 6); // 5 + stage
        assert!(!stage.enemies.iter().any(|e| e.is_boss));
        assert_eq!(stage.chests.len(), 3); // 3 + stage/2
        assert!(stage.grid.is_walkable(stage.spawn));
        assert!(stage.grid.is_walkable(stage.exit_portal));
        assert!(stage.grid.is_fully_connected());
    }

    #[test]
    fn test_boss_stage_composition() {
        let stage = build_stage(5, 21);
        assert!(stage.is_boss_stage());
        let bosses = stage.enemies.iter().filter(|e| e.is_boss).count();
        let minions = stage.enemies.len() - bosses;
        assert_eq!(bosses, 1);
        assert!(
            (2..=5).contains(&minions),
            "expected 2..=5 minions, got {}",
            minions
        );
    }

    #[test]
    fn test_entities_spawn_on_walkable_unique_cells() {
        let stage = build_stage(3, 33);
        let mut seen = HashSet::new();
        for enemy in &stage.enemies {
            assert!(stage.grid.is_walkable(enemy.position));
            assert!(seen.insert(enemy.position), "overlapping spawn");
        }
        for chest in &stage.chests {
            assert!(stage.grid.is_walkable(chest.position));
            assert!(seen.insert(chest.position), "overlapping spawn");
        }
    }

    #[test]
    fn test_portal_spawns_when_cleared() {
        let mut stage = build_stage(1, 7);
        stage.begin();
        assert_eq!(stage.phase, StagePhase::InProgress);

        let mut rng = StdRng::seed_from_u64(8);
        assert!(stage.tick(&mut rng).is_empty());
        assert!(stage.portal.is_none());

        for enemy in &mut stage.enemies {
            enemy.combat_mut().set_hp(0);
        }
        let events = stage.tick(&mut rng);
        assert!(matches!(events.as_slice(), [StageEvent::PortalSpawned(_)]));
        assert_eq!(stage.phase, StagePhase::PortalActive);
        let portal = stage.portal.unwrap();
        assert!(stage.grid.is_walkable(portal));
        assert!(stage.portal_at(portal));
    }

    #[test]
    fn test_exit_portal_always_active() {
        let stage = build_stage(1, 7);
        // Enemies still alive, no next-level portal, but the exit works.
        assert!(stage.exit_portal_at(Position::new(1, 0)));
        assert!(!stage.portal_at(Position::new(1, 0)));
    }

    #[test]
    fn test_chest_opens_exactly_once() {
        let mut stage = build_stage(1, 19);
        let pos = stage.chests[0].position;
        let first = stage.open_chest_at(pos);
        assert!(first.is_some());
        let second = stage.open_chest_at(pos);
        assert!(second.is_none());
        assert!(stage.chests[0].open);
    }

    #[test]
    fn test_advance_increments_and_repopulates() {
        let content = ContentPack::builtin();
        let carver = WalkCarver::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut stage = build_stage(1, 5);
        stage.enemies.clear();

        stage.advance(&content, &carver, 99, &mut rng).unwrap();
        assert_eq!(stage.stage_number, 2);
        assert_eq!(stage.phase, StagePhase::Populated);
        assert_eq!(stage.enemies.len(), 7);
        assert!(stage.portal.is_none());
    }

    #[test]
    fn test_crowded_board_places_what_fits() {
        // A board with a single free cell besides spawn and exit can hold at
        // most one entity; population must terminate regardless.
        let content = ContentPack::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = Grid::new_filled(4, 1, Cell::Wall);
        for x in 0..4 {
            grid.set(Position::new(x, 0), Cell::Floor).unwrap();
        }
        let mut stage = DungeonStage {
            stage_number: 9,
            grid,
            enemies: Vec::new(),
            chests: Vec::new(),
            spawn: Position::origin(),
            exit_portal: Position::new(1, 0),
            portal: None,
            phase: StagePhase::Generating,
            board_config: BoardConfig::for_testing(),
        };
        stage.populate(&content, &mut rng);
        assert!(stage.enemies.len() + stage.chests.len() <= 2);
    }
}
