use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::fairness::RollProof;
use crate::liquidity::LpId;
use crate::money::{Amount, Delta, WinThreshold};
use crate::player::PlayerId;

/// Resolved outcome of one wager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRecord {
    pub round: u64,
    pub player: PlayerId,
    pub stake: Amount,
    pub fee: Amount,
    pub net_stake: Amount,
    /// Internal payout multiplier (`100 / threshold`) in basis points.
    pub odds_bps: u64,
    pub threshold: WinThreshold,
    pub won: bool,
    /// Roll in `1..=1000`.
    pub roll: u16,
    pub payout: Amount,
    /// Signed change applied to the pool (negative when the pool paid out).
    pub pool_delta: Delta,
    pub proof: RollProof,
}

/// Expected, non-fatal failure of a bet or liquidity operation.
///
/// A rejection never leaves partial state behind.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    #[error("stake {stake} outside limits [{min}, {max}]")]
    StakeOutOfBounds { stake: Amount, min: Amount, max: Amount },
    #[error("balance {balance} cannot cover stake {stake}")]
    InsufficientBalance { balance: Amount, stake: Amount },
    #[error("odds derived from the win threshold are not usable")]
    InvalidOdds,
    #[error("potential payout {payout} exceeds pool coverage {coverage}")]
    InsufficientCoverage { payout: Amount, coverage: Amount },
    #[error("potential payout {payout} exceeds exposure cap {cap}")]
    ExposureLimit { payout: Amount, cap: Amount },
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("liquidity provider {0} not found")]
    ProviderNotFound(LpId),
    #[error("amount must be a positive number of minor units")]
    InvalidAmount,
    #[error("funds locked until {until_ms}ms")]
    FundsLocked { until_ms: u64 },
    #[error("player {player} does not own liquidity provider {lp}")]
    NotOwner { player: PlayerId, lp: LpId },
    #[error("available cash {available} cannot cover {requested}")]
    InsufficientCash { available: Amount, requested: Amount },
    #[error("nothing to claim")]
    NothingToClaim,
}

impl Rejection {
    /// Stable numeric code for UI and log consumers.
    pub fn code(&self) -> u8 {
        match self {
            Rejection::StakeOutOfBounds { .. } => ERROR_STAKE_OUT_OF_BOUNDS,
            Rejection::InsufficientBalance { .. } => ERROR_INSUFFICIENT_BALANCE,
            Rejection::InvalidOdds => ERROR_INVALID_ODDS,
            Rejection::InsufficientCoverage { .. } => ERROR_INSUFFICIENT_COVERAGE,
            Rejection::ExposureLimit { .. } => ERROR_EXPOSURE_LIMIT,
            Rejection::PlayerNotFound(_) => ERROR_PLAYER_NOT_FOUND,
            Rejection::ProviderNotFound(_) => ERROR_PROVIDER_NOT_FOUND,
            Rejection::InvalidAmount => ERROR_INVALID_AMOUNT,
            Rejection::FundsLocked { .. } => ERROR_FUNDS_LOCKED,
            Rejection::NotOwner { .. } => ERROR_NOT_OWNER,
            Rejection::InsufficientCash { .. } => ERROR_INSUFFICIENT_CASH,
            Rejection::NothingToClaim => ERROR_NOTHING_TO_CLAIM,
        }
    }
}
