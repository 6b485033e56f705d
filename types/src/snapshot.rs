//! Serializable session snapshot.
//!
//! Snapshots carry everything needed to resume a session except the live
//! server seed, which is never exported. Fields introduced after the first
//! schema default to their empty value so older saves still parse; [`SessionSnapshot::upgrade`]
//! then fills in what the current schema expects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::liquidity::LpId;
use crate::money::{Amount, Delta, WinThreshold};
use crate::player::{DisableReason, PlayerId, Strategy};

/// Schema written by this version.
///
/// * 1: players, LPs, house and bank balances.
/// * 2: LP locks and tokens, session clock, automated flags.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate player {0}")]
    DuplicatePlayer(PlayerId),
    #[error("duplicate liquidity provider {0}")]
    DuplicateProvider(LpId),
    #[error("liquidity provider {lp} owned by unknown player {owner}")]
    UnknownOwner { lp: LpId, owner: PlayerId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    pub balance: Amount,
    #[serde(default)]
    pub strategy: Strategy,
    pub base_bet: Amount,
    #[serde(default)]
    pub stop_loss: Option<Amount>,
    #[serde(default)]
    pub take_profit: Option<Amount>,
    /// Absent before schema 2; inferred on upgrade (every seat but `P0` is simulated).
    #[serde(default)]
    pub automated: Option<bool>,
    #[serde(default)]
    pub autobet: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub disable_reason: Option<DisableReason>,
    #[serde(default)]
    pub total_wagered: Amount,
    #[serde(default)]
    pub total_won: Delta,
    #[serde(default)]
    pub total_lost: Amount,
    #[serde(default)]
    pub initial_balance: Option<Amount>,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpSnapshot {
    pub id: LpId,
    pub balance: Amount,
    #[serde(default)]
    pub available_cash: Amount,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub initial_stake: Amount,
    #[serde(default)]
    pub total_contributed: Amount,
    #[serde(default)]
    pub total_withdrawn: Amount,
    #[serde(default)]
    pub lock_until_ms: Option<u64>,
    /// Absent before schema 2.
    #[serde(default)]
    pub tokens: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Missing in the earliest saves, which are treated as schema 0.
    #[serde(default)]
    pub schema_version: u32,
    pub round: u64,
    #[serde(default)]
    pub clock_ms: u64,
    #[serde(default)]
    pub win_threshold: WinThreshold,
    #[serde(default)]
    pub client_seed: Option<String>,
    pub players: Vec<PlayerSnapshot>,
    pub lps: Vec<LpSnapshot>,
    pub house_fee_balance: Amount,
    pub bank_liquidity: Amount,
    #[serde(default)]
    pub total_token_supply: u64,
    #[serde(default)]
    pub initial_value: Amount,
}

/// Outcome of [`SessionSnapshot::upgrade`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaStatus {
    Current,
    Migrated { from: u32 },
    /// Written by a newer version; unknown fields were ignored.
    Newer { version: u32 },
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bring an older snapshot up to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// When `tokenize` is set, providers saved without tokens are minted one
    /// token per minor unit of balance.
    pub fn upgrade(&mut self, tokenize: bool) -> SchemaStatus {
        let from = self.schema_version;
        if from > CURRENT_SCHEMA_VERSION {
            return SchemaStatus::Newer { version: from };
        }
        if from == CURRENT_SCHEMA_VERSION {
            return SchemaStatus::Current;
        }

        for player in &mut self.players {
            if player.automated.is_none() {
                player.automated = Some(player.id != PlayerId(0));
            }
        }
        if tokenize && self.lps.iter().all(|lp| lp.tokens.is_none()) {
            let mut supply = 0u64;
            for lp in &mut self.lps {
                lp.tokens = Some(lp.balance);
                supply = supply.saturating_add(lp.balance);
            }
            self.total_token_supply = supply;
        }
        self.schema_version = CURRENT_SCHEMA_VERSION;
        SchemaStatus::Migrated { from }
    }

    /// Reject snapshots whose identifiers do not line up.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut players = BTreeSet::new();
        for player in &self.players {
            if !players.insert(player.id) {
                return Err(SnapshotError::DuplicatePlayer(player.id));
            }
        }
        let mut lps = BTreeSet::new();
        for lp in &self.lps {
            if !lps.insert(lp.id) {
                return Err(SnapshotError::DuplicateProvider(lp.id));
            }
            if let Some(owner) = lp.owner {
                if !players.contains(&owner) {
                    return Err(SnapshotError::UnknownOwner { lp: lp.id, owner });
                }
            }
        }
        Ok(())
    }
}
