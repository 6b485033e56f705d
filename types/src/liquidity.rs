use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::DELTA_HISTORY_LEN;
use crate::money::{Amount, Delta};
use crate::player::PlayerId;

/// Session-local liquidity provider identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LpId(pub u32);

impl fmt::Display for LpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LP{}", self.0)
    }
}

/// A single provider's position in the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProvider {
    pub id: LpId,
    /// Capital currently at risk in the pool.
    pub balance: Amount,
    /// Withdrawn funds not yet claimed or redeposited.
    pub available_cash: Amount,
    pub initial_stake: Amount,
    pub total_contributed: Amount,
    pub total_withdrawn: Amount,
    /// Cached share of the pool in parts per million. Derived, never authoritative.
    pub share_ppm: u64,
    pub owner: Option<PlayerId>,
    /// Session-clock time before which withdrawals are refused.
    pub lock_until_ms: Option<u64>,
    pub tokens: u64,
}

impl LiquidityProvider {
    pub fn new(id: LpId, balance: Amount) -> Self {
        Self {
            id,
            balance,
            available_cash: 0,
            initial_stake: balance,
            total_contributed: balance,
            total_withdrawn: 0,
            share_ppm: 0,
            owner: None,
            lock_until_ms: None,
            tokens: 0,
        }
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn is_locked(&self, now_ms: u64) -> bool {
        matches!(self.lock_until_ms, Some(until) if now_ms < until)
    }
}

/// Aggregate pool state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// Recorded liquidity; snapped to the provider balance sum on recompute.
    pub liquidity: Amount,
    /// Recent per-bet pool deltas, newest last.
    pub delta_history: VecDeque<Delta>,
    pub total_token_supply: u64,
}

impl Default for Bank {
    fn default() -> Self {
        Self {
            liquidity: 0,
            delta_history: VecDeque::with_capacity(DELTA_HISTORY_LEN),
            total_token_supply: 0,
        }
    }
}

impl Bank {
    pub fn push_delta(&mut self, delta: Delta) {
        if self.delta_history.len() == DELTA_HISTORY_LEN {
            self.delta_history.pop_front();
        }
        self.delta_history.push_back(delta);
    }

    /// Population standard deviation of the recorded deltas, in minor units.
    pub fn volatility(&self) -> f64 {
        let n = self.delta_history.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.delta_history.iter().map(|d| *d as f64).sum::<f64>() / n as f64;
        let variance = self
            .delta_history
            .iter()
            .map(|d| {
                let diff = *d as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;
        variance.sqrt()
    }
}

/// Operator account that collects bet fees.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub fee_balance: Amount,
}

/// Recorded liquidity disagreed with the provider balance sum and was snapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityDrift {
    pub recorded: Amount,
    pub actual: Amount,
}

impl LiquidityDrift {
    pub fn magnitude(&self) -> u64 {
        self.recorded.abs_diff(self.actual)
    }
}
