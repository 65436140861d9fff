//! The game session: one player, one city, at most one active dungeon, and
//! the collaborator seams (relay, record API) the main loop drives.
//!
//! All shared mutable state lives here and is only ever touched from the
//! main loop. Remote events are applied during [`GameSession::tick`], never
//! from callbacks, so a board mutation is always a single atomic update per
//! entity per tick.

use crate::city::CityMap;
use crate::combat::BattleResult;
use crate::content::{ContentPack, ElementTable, Item};
use crate::game::{Combatant, Direction, Enemy, Player, Position};
use crate::generation::{BoardConfig, WalkCarver};
use crate::net::api::RecordsApi;
use crate::net::{InboundEvent, OutboundEvent, Relay};
use crate::stage::{DungeonStage, StageEvent};
use crate::{progression, DuskholdError, DuskholdResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// Which map currently owns the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    City,
    Dungeon,
}

/// Things the session did that the UI layer should surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Message(String),
    EnteredDungeon,
    ReturnedToCity,
    StageAdvanced(u32),
    /// The player collided with the enemy at this roster index
    BattleTriggered(usize),
    ChestOpened(Item),
    PlayerDied,
}

/// Split-borrow view of everything one battle needs.
pub struct BattleContext<'a> {
    pub player: &'a mut Player,
    pub enemy: &'a mut Enemy,
    pub content: &'a ContentPack,
    pub elements: &'a ElementTable,
    pub rng: &'a mut StdRng,
}

/// Central game state, owned by the main loop and passed by reference to
/// whichever subsystem needs it.
pub struct GameSession {
    pub player: Player,
    pub city: CityMap,
    pub dungeon: Option<DungeonStage>,
    pub location: Location,
    /// Remote party members, by player id
    pub remote_players: HashMap<String, Position>,
    pub content: ContentPack,
    elements: ElementTable,
    pub rng: StdRng,
    relay: Box<dyn Relay>,
    records: Box<dyn RecordsApi>,
    carver: WalkCarver,
    seed: u64,
    stages_entered: u64,
}

impl GameSession {
    /// Builds a session with the player standing at the city spawn and
    /// announces them to the relay.
    pub fn new(
        name: &str,
        class: crate::content::PlayerClass,
        seed: u64,
        content: ContentPack,
        relay: Box<dyn Relay>,
        records: Box<dyn RecordsApi>,
    ) -> DuskholdResult<Self> {
        let class_def = content
            .class_def(class)
            .ok_or_else(|| DuskholdError::Content(format!("no class table for {:?}", class)))?
            .clone();
        let city = CityMap::new();
        let player = Player::new(name, &class_def, city.spawn);
        let elements = content.element_table();

        let mut session = Self {
            player,
            city,
            dungeon: None,
            location: Location::City,
            remote_players: HashMap::new(),
            content,
            elements,
            rng: StdRng::seed_from_u64(seed),
            relay,
            records,
            carver: WalkCarver::new(),
            seed,
            stages_entered: 0,
        };
        session.emit(OutboundEvent::Join {
            player_id: session.player.name.clone(),
            position: session.player.position,
        });
        session.sync_records();
        Ok(session)
    }

    pub fn elements(&self) -> &ElementTable {
        &self.elements
    }

    /// Fire-and-forget emission: failures are logged and gameplay moves on.
    fn emit(&mut self, event: OutboundEvent) {
        if let Err(err) = self.relay.emit(&event) {
            debug!("relay emit dropped: {}", err);
        }
    }

    /// Fire-and-forget stat sync; an unreachable record service degrades to
    /// offline mode.
    fn sync_records(&mut self) {
        let record = self.player.record();
        if let Err(err) = self.records.upsert_player(&record) {
            debug!("record sync skipped: {}", err);
        }
    }

    /// Moves the player one step, then resolves whatever the destination
    /// cell holds: walls reject the move, portals transition, chests open,
    /// enemies start combat.
    pub fn handle_move(&mut self, direction: Direction) -> DuskholdResult<Vec<SessionEvent>> {
        let target = self.player.position + direction.to_delta();
        let walkable = match self.location {
            Location::City => self.city.grid.is_walkable(target),
            Location::Dungeon => self
                .dungeon
                .as_ref()
                .map(|s| s.grid.is_walkable(target))
                .unwrap_or(false),
        };
        if !walkable {
            return Ok(Vec::new());
        }

        self.player.position = target;
        self.emit(OutboundEvent::Move {
            player_id: self.player.name.clone(),
            position: target,
        });

        match self.location {
            Location::City => {
                if self.city.portal_at(target) {
                    return self.enter_dungeon();
                }
                Ok(Vec::new())
            }
            Location::Dungeon => self.resolve_dungeon_cell(target),
        }
    }

    fn resolve_dungeon_cell(&mut self, pos: Position) -> DuskholdResult<Vec<SessionEvent>> {
        let mut events = Vec::new();
        let Some(stage) = self.dungeon.as_mut() else {
            return Ok(events);
        };

        if let Some(idx) = stage.enemy_at(pos) {
            stage.enemies[idx].in_combat = true;
            events.push(SessionEvent::BattleTriggered(idx));
            return Ok(events);
        }

        if let Some(item) = stage.open_chest_at(pos) {
            let chest_id = stage
                .chests
                .iter()
                .find(|c| c.position == pos)
                .map(|c| c.id);
            self.player.add_to_inventory(item.clone());
            events.push(SessionEvent::Message(format!("You collected: {}!", item.name)));
            events.push(SessionEvent::ChestOpened(item));
            if let Some(chest_id) = chest_id {
                self.emit(OutboundEvent::ChestOpened { chest_id });
            }
            return Ok(events);
        }

        if stage.exit_portal_at(pos) {
            return self.return_to_city();
        }

        if stage.portal_at(pos) {
            return self.advance_stage();
        }

        Ok(events)
    }

    /// Enters the dungeon at stage 1 with a fresh board.
    pub fn enter_dungeon(&mut self) -> DuskholdResult<Vec<SessionEvent>> {
        self.stages_entered += 1;
        let board_seed = self.seed.wrapping_add(self.stages_entered.wrapping_mul(0xA5A5));
        let mut stage = DungeonStage::generate(
            1,
            BoardConfig::default(),
            &self.content,
            &self.carver,
            board_seed,
            &mut self.rng,
        )?;
        stage.begin();
        self.player.position = stage.spawn;
        self.player.record_dungeon_level(1);
        self.dungeon = Some(stage);
        self.location = Location::Dungeon;
        self.sync_records();
        info!("entered dungeon (stage 1)");
        Ok(vec![
            SessionEvent::EnteredDungeon,
            SessionEvent::Message("=== ENTERING DUNGEON === Prepare for battle...".to_string()),
        ])
    }

    /// Leaves the dungeon for the city, unconditionally.
    pub fn return_to_city(&mut self) -> DuskholdResult<Vec<SessionEvent>> {
        self.dungeon = None;
        self.location = Location::City;
        self.player.position = self.city.return_spawn();
        info!("returned to city");
        Ok(vec![
            SessionEvent::ReturnedToCity,
            SessionEvent::Message("=== LEAVING DUNGEON === Returning to city...".to_string()),
        ])
    }

    /// Advances through the next-level portal.
    pub fn advance_stage(&mut self) -> DuskholdResult<Vec<SessionEvent>> {
        self.stages_entered += 1;
        let board_seed = self.seed.wrapping_add(self.stages_entered.wrapping_mul(0xA5A5));
        let Some(stage) = self.dungeon.as_mut() else {
            return Err(DuskholdError::InvalidState(
                "no dungeon stage to advance".to_string(),
            ));
        };
        stage.advance(&self.content, &self.carver, board_seed, &mut self.rng)?;
        stage.begin();
        let number = stage.stage_number;
        let boss = stage.is_boss_stage();
        self.player.position = stage.spawn;
        self.player.record_dungeon_level(number);
        self.sync_records();
        info!("advanced to dungeon stage {}", number);

        let mut events = vec![
            SessionEvent::StageAdvanced(number),
            SessionEvent::Message(format!("=== STAGE {} ===", number)),
        ];
        if boss {
            events.push(SessionEvent::Message(
                "!!! WARNING: BOSS ROOM AHEAD !!!".to_string(),
            ));
        }
        Ok(events)
    }

    /// One game tick: drain remote events, move enemies, detect collisions.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        for inbound in self.relay.drain() {
            self.apply_inbound(inbound);
        }

        if let Some(stage) = self.dungeon.as_mut() {
            for stage_event in stage.tick(&mut self.rng) {
                match stage_event {
                    StageEvent::PortalSpawned(_) => {
                        events.push(SessionEvent::Message(
                            "A portal to the next level has appeared!".to_string(),
                        ));
                    }
                }
            }
            // An enemy may have wandered onto the player.
            if let Some(idx) = stage.enemy_at(self.player.position) {
                stage.enemies[idx].in_combat = true;
                events.push(SessionEvent::BattleTriggered(idx));
            }
        }
        events
    }

    /// Applies one remote event to shared state. Inbound sync is
    /// informational: it never drives local combat.
    fn apply_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Joined { roster } => {
                for remote in roster {
                    if remote.player_id != self.player.name {
                        self.remote_players.insert(remote.player_id, remote.position);
                    }
                }
            }
            InboundEvent::Moved {
                player_id,
                position,
            } => {
                if player_id != self.player.name {
                    self.remote_players.insert(player_id, position);
                }
            }
            InboundEvent::Left { player_id } => {
                self.remote_players.remove(&player_id);
            }
            InboundEvent::ChestOpened { chest_id } => {
                if let Some(stage) = self.dungeon.as_mut() {
                    if let Some(chest) = stage.chests.iter_mut().find(|c| c.id == chest_id) {
                        // A party member claimed it; drop the loot locally.
                        let _ = chest.open_once();
                    }
                }
            }
            InboundEvent::EnemyDied { enemy_id } => {
                if let Some(stage) = self.dungeon.as_mut() {
                    if let Some(enemy) = stage
                        .enemies
                        .iter_mut()
                        .find(|e| e.id == enemy_id && !e.in_combat)
                    {
                        enemy.combat_mut().set_hp(0);
                    }
                }
            }
        }
    }

    /// Split-borrow access for the battle screen.
    pub fn battle_context(&mut self, enemy_index: usize) -> Option<BattleContext<'_>> {
        let stage = self.dungeon.as_mut()?;
        let enemy = stage.enemies.get_mut(enemy_index)?;
        Some(BattleContext {
            player: &mut self.player,
            enemy,
            content: &self.content,
            elements: &self.elements,
            rng: &mut self.rng,
        })
    }

    /// Applies a finished battle: victory pays out drops and experience,
    /// defeat ends the session, fleeing just unlocks the enemy.
    pub fn finish_battle(&mut self, enemy_index: usize, result: BattleResult) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match result {
            BattleResult::Victory => {
                let Some(stage) = self.dungeon.as_mut() else {
                    return events;
                };
                let Some(enemy) = stage.enemies.get_mut(enemy_index) else {
                    return events;
                };
                enemy.in_combat = false;
                let enemy_id = enemy.id;
                let drops = enemy.roll_drops(&mut self.rng);

                self.player.add_gold(drops.gold);
                events.push(SessionEvent::Message(format!(
                    "You earned {} gold and {} XP!",
                    drops.gold, drops.xp
                )));
                for item in drops.items {
                    events.push(SessionEvent::Message(format!("You got: {}!", item.name)));
                    self.player.add_to_inventory(item);
                }
                for level_up in progression::award_xp(&mut self.player, drops.xp) {
                    events.push(SessionEvent::Message(format!(
                        "LEVEL UP! You are now level {}! (+{} skill points)",
                        level_up.new_level, level_up.skill_points_gained
                    )));
                }
                self.emit(OutboundEvent::EnemyDied { enemy_id });
                self.sync_records();
            }
            BattleResult::Defeat => {
                events.push(SessionEvent::PlayerDied);
                self.sync_records();
            }
            BattleResult::Fled => {
                if let Some(stage) = self.dungeon.as_mut() {
                    if let Some(enemy) = stage.enemies.get_mut(enemy_index) {
                        enemy.in_combat = false;
                    }
                }
                events.push(SessionEvent::Message("You ran away!".to_string()));
            }
        }
        events
    }

    /// The grid rows of whichever map is active, with entities stamped on
    /// top. Composed fresh each frame so every entity appears exactly once.
    pub fn compose_frame(&self) -> Vec<String> {
        let grid = match self.location {
            Location::City => &self.city.grid,
            Location::Dungeon => match self.dungeon.as_ref() {
                Some(stage) => &stage.grid,
                None => &self.city.grid,
            },
        };
        let mut rows: Vec<Vec<char>> = grid
            .render_rows()
            .into_iter()
            .map(|r| r.chars().collect())
            .collect();

        let mut stamp = |pos: Position, glyph: char| {
            if let Some(row) = rows.get_mut(pos.y as usize) {
                if let Some(cell) = row.get_mut(pos.x as usize) {
                    *cell = glyph;
                }
            }
        };

        match self.location {
            Location::City => {
                stamp(self.city.dungeon_portal, 'U');
            }
            Location::Dungeon => {
                if let Some(stage) = self.dungeon.as_ref() {
                    for chest in &stage.chests {
                        stamp(chest.position, chest.glyph());
                    }
                    stamp(stage.exit_portal, 'U');
                    if let Some(portal) = stage.portal {
                        stamp(portal, 'U');
                    }
                    for enemy in &stage.enemies {
                        stamp(enemy.position, enemy.glyph());
                    }
                }
            }
        }

        for position in self.remote_players.values() {
            stamp(*position, 'x');
        }
        stamp(self.player.position, 'X');

        rows.into_iter().map(|r| r.into_iter().collect()).collect()
    }

    /// Fetches a ranking board from the record service.
    pub fn rankings(
        &mut self,
        category: crate::net::api::RankCategory,
    ) -> DuskholdResult<Vec<crate::net::api::RankEntry>> {
        self.records.fetch_rankings(category).map_err(|err| {
            warn!("rankings unavailable: {}", err);
            err
        })
    }
}
