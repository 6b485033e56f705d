use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::bet::BetRecord;
use crate::constants::DEFAULT_BASE_BET;
use crate::money::{Amount, Delta};

/// Session-local participant identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Stake-sizing rule driving a player's automated bets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    #[default]
    Fixed,
    Random,
    Martingale,
    AntiMartingale,
    DAlembert,
    Fibonacci,
    Labouchere,
    #[serde(rename = "reverseLab")]
    ReverseLabouchere,
    Kelly,
    #[serde(rename = "stopAfterNWins")]
    StopAfterWins,
}

impl Strategy {
    /// Every strategy, in the order simulated seats are dealt them.
    pub const ALL: [Strategy; 10] = [
        Strategy::Random,
        Strategy::Martingale,
        Strategy::AntiMartingale,
        Strategy::DAlembert,
        Strategy::Fibonacci,
        Strategy::Labouchere,
        Strategy::ReverseLabouchere,
        Strategy::Kelly,
        Strategy::StopAfterWins,
        Strategy::Fixed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fixed => "fixed",
            Strategy::Random => "random",
            Strategy::Martingale => "martingale",
            Strategy::AntiMartingale => "antiMartingale",
            Strategy::DAlembert => "dAlembert",
            Strategy::Fibonacci => "fibonacci",
            Strategy::Labouchere => "labouchere",
            Strategy::ReverseLabouchere => "reverseLab",
            Strategy::Kelly => "kelly",
            Strategy::StopAfterWins => "stopAfterNWins",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Per-player progression state consumed by the strategies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyState {
    pub martingale_level: u32,
    pub anti_level: u32,
    pub dalembert_level: u32,
    pub fibonacci_index: u32,
    pub wins_this_cycle: u32,
    pub labouchere: Vec<u64>,
    pub reverse_labouchere: Vec<u64>,
    /// Result of the latest settled bet not yet folded into the progression.
    pub unapplied_outcome: Option<bool>,
}

pub const LABOUCHERE_START: [u64; 4] = [1, 2, 3, 4];
pub const REVERSE_LABOUCHERE_START: [u64; 3] = [1, 2, 3];

impl Default for StrategyState {
    fn default() -> Self {
        Self {
            martingale_level: 0,
            anti_level: 0,
            dalembert_level: 0,
            fibonacci_index: 0,
            wins_this_cycle: 0,
            labouchere: LABOUCHERE_START.to_vec(),
            reverse_labouchere: REVERSE_LABOUCHERE_START.to_vec(),
            unapplied_outcome: None,
        }
    }
}

/// Why the scheduler stopped betting for a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisableReason {
    /// Balance could not cover the minimum stake.
    InsufficientFunds,
    StopLoss,
    TakeProfit,
    /// The strategy itself asked to stop (e.g. target number of wins reached).
    StrategyHalt,
}

impl fmt::Display for DisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisableReason::InsufficientFunds => "insufficient",
            DisableReason::StopLoss => "stopLoss",
            DisableReason::TakeProfit => "takeProfit",
            DisableReason::StrategyHalt => "strategy",
        })
    }
}

/// Player state for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub balance: Amount,
    pub strategy: Strategy,
    pub strategy_state: StrategyState,
    pub base_bet: Amount,
    /// Positive for consecutive wins, negative for consecutive losses.
    pub streak: i32,
    /// Absolute balance floor; automated betting stops at or below it.
    pub stop_loss: Option<Amount>,
    /// Absolute balance cap; automated betting stops at or above it.
    pub take_profit: Option<Amount>,
    pub total_wagered: Amount,
    /// Net profit accumulated on winning bets (payout minus stake).
    pub total_won: Delta,
    /// Stakes forfeited on losing bets.
    pub total_lost: Amount,
    pub initial_balance: Amount,
    pub active: bool,
    pub disable_reason: Option<DisableReason>,
    /// Simulated seat driven by the scheduler every round.
    pub automated: bool,
    /// Manual seat opted into scheduler-driven bets.
    pub autobet: bool,
    pub last_bet: Option<BetRecord>,
    pub last_rebuy_round: Option<u64>,
}

impl Player {
    pub fn new(id: PlayerId, balance: Amount, strategy: Strategy, automated: bool) -> Self {
        Self {
            id,
            name: strategy.name().to_string(),
            balance,
            strategy,
            strategy_state: StrategyState::default(),
            base_bet: DEFAULT_BASE_BET,
            streak: 0,
            stop_loss: None,
            take_profit: None,
            total_wagered: 0,
            total_won: 0,
            total_lost: 0,
            initial_balance: balance,
            active: true,
            disable_reason: None,
            automated,
            autobet: false,
            last_bet: None,
            last_rebuy_round: None,
        }
    }

    /// Net betting result. Rebuys and pool transfers are not counted.
    pub fn pnl(&self) -> Delta {
        self.total_won.saturating_sub(self.total_lost as Delta)
    }

    /// Record a resolved bet in the streak counter.
    pub fn record_streak(&mut self, won: bool) {
        self.streak = match (won, self.streak) {
            (true, s) if s >= 0 => s.saturating_add(1),
            (true, _) => 1,
            (false, s) if s <= 0 => s.saturating_sub(1),
            (false, _) => -1,
        };
    }

    pub fn deactivate(&mut self, reason: DisableReason) {
        self.active = false;
        self.disable_reason = Some(reason);
    }

    pub fn reactivate(&mut self) {
        self.active = true;
        self.disable_reason = None;
    }

    /// Whether the scheduler should ask this player for a bet each round.
    pub fn is_scheduled(&self) -> bool {
        self.active && (self.automated || self.autobet)
    }

    /// Whether a stop bound has been reached at the current balance.
    pub fn stop_bound_reached(&self) -> Option<DisableReason> {
        if matches!(self.stop_loss, Some(floor) if self.balance <= floor) {
            return Some(DisableReason::StopLoss);
        }
        if matches!(self.take_profit, Some(cap) if self.balance >= cap) {
            return Some(DisableReason::TakeProfit);
        }
        None
    }
}
