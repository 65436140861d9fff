//! # Duskhold
//!
//! A terminal-rendered multiplayer dungeon-crawler RPG client.
//!
//! ## Architecture Overview
//!
//! Duskhold is built around a small set of cooperating subsystems:
//!
//! - **Game State**: a single [`GameSession`] owned by the main loop; no
//!   ambient globals
//! - **Combat Engine**: turn-based attack resolution shared by players and
//!   enemies through the [`Combatant`] trait
//! - **Progression Engine**: experience, levels and the skill-point economy
//! - **Generation System**: procedural maze carving for dungeon boards
//! - **Stage Controller**: enemy/chest population, portals and stage advance
//! - **Network Relay**: fire-and-forget position sync against a remote game
//!   server, drained once per tick on the main thread
//!
//! Rendering and key input live behind the [`ui::Display`] trait so the core
//! never depends on a terminal backend.

pub mod city;
pub mod combat;
pub mod content;
pub mod game;
pub mod generation;
pub mod net;
pub mod stage;
pub mod ui;

// Commonly used types, re-exported at the crate root.
pub use city::CityMap;
pub use combat::progression::{self, LevelUp};
pub use combat::{
    attempt_flee, end_of_turn, enemy_take_turn, resolve_attack, AttackOutcome, BattleResult,
    TurnEnd,
};
pub use content::{ContentPack, ElementKind, ElementTable, Item, ItemCategory, PlayerClass, Skill};
pub use game::{
    new_entity_id, CombatEntity, Combatant, Direction, DotEffect, DotTick, Enemy, EntityId,
    GameSession, Location, Player, Position, SessionEvent, StunState,
};
pub use generation::{BoardConfig, Cell, Grid, WalkCarver};
pub use net::api::{OfflineRecords, PlayerRecord, RankCategory, RankEntry, RecordsApi};
pub use net::{InboundEvent, LoopbackRelay, NullRelay, OutboundEvent, Relay, RemotePlayer};
pub use stage::{Chest, DungeonStage, StageEvent, StagePhase};

/// Core error type for the Duskhold client.
#[derive(thiserror::Error, Debug)]
pub enum DuskholdError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Board generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Content table is missing or malformed
    #[error("Content error: {0}")]
    Content(String),

    /// Remote collaborator (relay or record API) is unreachable
    #[error("Network unavailable: {0}")]
    NetUnavailable(String),
}

/// Result type used throughout the Duskhold codebase.
pub type DuskholdResult<T> = Result<T, DuskholdError>;

/// Version information for the client.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Dungeon board width in cells
    pub const DUNGEON_WIDTH: usize = 30;

    /// Dungeon board height in cells
    pub const DUNGEON_HEIGHT: usize = 15;

    /// City hub width in cells
    pub const CITY_WIDTH: usize = 60;

    /// City hub height in cells
    pub const CITY_HEIGHT: usize = 30;

    /// Experience required for the first level-up
    pub const BASE_XP_TO_LEVEL: i32 = 100;

    /// Maximum resample attempts when placing an enemy, chest or portal
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

    /// Carve iteration budget per grid cell before generation is abandoned
    pub const MAX_CARVE_ITERATIONS_PER_CELL: u32 = 200;

    /// Fresh-seed retries after a failed board generation
    pub const BOARD_RETRY_LIMIT: u32 = 8;

    /// Key-read timeout per tick, in milliseconds
    pub const INPUT_POLL_MS: u64 = 100;

    /// Chance per combat turn that a skill-bearing enemy casts instead of
    /// swinging
    pub const ENEMY_SKILL_CHANCE: f64 = 0.3;
}
