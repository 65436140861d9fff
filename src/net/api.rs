//! Player-record API collaborator.
//!
//! The REST service owns all persistent state: player records keyed by
//! name + class, bank accounts and the ranking boards. The combat and
//! progression core only ever calls "sync stats on change", and gameplay
//! must never block on this collaborator: callers treat every error as a
//! logged degradation to offline mode.

use crate::content::PlayerClass;
use crate::{DuskholdError, DuskholdResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persistent record for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub class: PlayerClass,
    pub max_dungeon_level: u32,
    pub max_gold: i32,
    pub max_level_reached: u32,
}

/// Ranking board categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankCategory {
    Gold,
    Level,
    Dungeon,
}

/// One row of a ranking board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub value: i64,
}

/// Abstract player-record service.
pub trait RecordsApi {
    /// Creates or updates the player's record.
    fn upsert_player(&mut self, record: &PlayerRecord) -> DuskholdResult<()>;

    /// Fetches a ranking board, best first.
    fn fetch_rankings(&mut self, category: RankCategory) -> DuskholdResult<Vec<RankEntry>>;

    // Bank operations, keyed by account id + password.
    fn create_account(&mut self, account: &str, password: &str) -> DuskholdResult<()>;
    fn verify_account(&mut self, account: &str, password: &str) -> DuskholdResult<bool>;
    fn deposit_gold(&mut self, account: &str, amount: i64) -> DuskholdResult<()>;
    fn withdraw_gold(&mut self, account: &str, amount: i64) -> DuskholdResult<i64>;
}

/// Offline stand-in: every call degrades to `NetUnavailable`, with a single
/// warning the first time so the log is not flooded.
#[derive(Debug, Default)]
pub struct OfflineRecords {
    warned: bool,
}

impl OfflineRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn unavailable(&mut self, what: &str) -> DuskholdError {
        if !self.warned {
            warn!("player-record service unreachable; running in offline mode");
            self.warned = true;
        }
        DuskholdError::NetUnavailable(format!("{} unavailable offline", what))
    }
}

impl RecordsApi for OfflineRecords {
    fn upsert_player(&mut self, _record: &PlayerRecord) -> DuskholdResult<()> {
        Err(self.unavailable("player sync"))
    }

    fn fetch_rankings(&mut self, _category: RankCategory) -> DuskholdResult<Vec<RankEntry>> {
        Err(self.unavailable("rankings"))
    }

    fn create_account(&mut self, _account: &str, _password: &str) -> DuskholdResult<()> {
        Err(self.unavailable("bank"))
    }

    fn verify_account(&mut self, _account: &str, _password: &str) -> DuskholdResult<bool> {
        Err(self.unavailable("bank"))
    }

    fn deposit_gold(&mut self, _account: &str, _amount: i64) -> DuskholdResult<()> {
        Err(self.unavailable("bank"))
    }

    fn withdraw_gold(&mut self, _account: &str, _amount: i64) -> DuskholdResult<i64> {
        Err(self.unavailable("bank"))
    }
}

/// In-memory record store, used by tests and as a reference for the wire
/// contract.
#[derive(Debug, Default)]
pub struct MemoryRecords {
    pub players: HashMap<String, PlayerRecord>,
    accounts: HashMap<String, (String, i64)>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn authed(&self, account: &str, password: &str) -> DuskholdResult<()> {
        match self.accounts.get(account) {
            Some((stored, _)) if stored == password => Ok(()),
            Some(_) => Err(DuskholdError::InvalidAction(
                "wrong bank password".to_string(),
            )),
            None => Err(DuskholdError::InvalidAction(
                "no such bank account".to_string(),
            )),
        }
    }
}

impl RecordsApi for MemoryRecords {
    fn upsert_player(&mut self, record: &PlayerRecord) -> DuskholdResult<()> {
        self.players.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn fetch_rankings(&mut self, category: RankCategory) -> DuskholdResult<Vec<RankEntry>> {
        let mut entries: Vec<RankEntry> = self
            .players
            .values()
            .map(|r| RankEntry {
                name: r.name.clone(),
                value: match category {
                    RankCategory::Gold => r.max_gold as i64,
                    RankCategory::Level => r.max_level_reached as i64,
                    RankCategory::Dungeon => r.max_dungeon_level as i64,
                },
            })
            .collect();
        entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    fn create_account(&mut self, account: &str, password: &str) -> DuskholdResult<()> {
        if self.accounts.contains_key(account) {
            return Err(DuskholdError::InvalidAction(
                "bank account already exists".to_string(),
            ));
        }
        self.accounts
            .insert(account.to_string(), (password.to_string(), 0));
        Ok(())
    }

    fn verify_account(&mut self, account: &str, password: &str) -> DuskholdResult<bool> {
        Ok(self.authed(account, password).is_ok())
    }

    fn deposit_gold(&mut self, account: &str, amount: i64) -> DuskholdResult<()> {
        if let Some((_, balance)) = self.accounts.get_mut(account) {
            *balance += amount;
            Ok(())
        } else {
            Err(DuskholdError::InvalidAction(
                "no such bank account".to_string(),
            ))
        }
    }

    fn withdraw_gold(&mut self, account: &str, amount: i64) -> DuskholdResult<i64> {
        if let Some((_, balance)) = self.accounts.get_mut(account) {
            if *balance < amount {
                return Err(DuskholdError::InvalidAction(
                    "insufficient bank balance".to_string(),
                ));
            }
            *balance -= amount;
            Ok(*balance)
        } else {
            Err(DuskholdError::InvalidAction(
                "no such bank account".to_string(),
            ))
        }
    }
}
