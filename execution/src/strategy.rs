//! Stake planning for scheduled bets.
//!
//! [`plan_bet`] is a pure transition: it reads a player and returns the next
//! progression state alongside either a bet intent or the reason the player
//! should stop. The caller decides whether to commit the new state.

use fairstake_types::constants::*;
use fairstake_types::money::{mul_div_round, BASIS_POINTS_SCALE, ROLL_RANGE};
use fairstake_types::player::{LABOUCHERE_START, REVERSE_LABOUCHERE_START};
use fairstake_types::{Amount, DisableReason, EngineConfig, Player, Strategy, StrategyState, WinThreshold};
use rand::Rng;

/// Stake and threshold a strategy wants to play this round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetIntent {
    pub stake: Amount,
    pub threshold: WinThreshold,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetPlan {
    pub state: StrategyState,
    pub intent: Result<BetIntent, DisableReason>,
}

/// Kelly stakes never exceed this share of the bankroll (10%).
const KELLY_MAX_FRACTION_BPS: u64 = 1_000;
/// Edge estimate used by the Kelly sizing is clamped to +/- 5%.
const KELLY_EDGE_CLAMP_BPS: i64 = 500;

/// `fib(0) = fib(1) = 1`.
fn fibonacci(index: u32) -> u64 {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 1..index {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    b
}

fn ends_sum(sequence: &[u64]) -> u64 {
    match (sequence.first(), sequence.last()) {
        (Some(first), Some(last)) => first.saturating_add(*last),
        _ => 2,
    }
}

/// Remove both ends (or the only element), resetting to `start` once empty.
fn cancel_ends(sequence: &mut Vec<u64>, start: &[u64]) {
    if sequence.len() > 1 {
        sequence.remove(0);
    }
    sequence.pop();
    if sequence.is_empty() {
        sequence.extend_from_slice(start);
    }
}

fn extend_ends(sequence: &mut Vec<u64>) {
    if sequence.len() < LABOUCHERE_MAX_LEN {
        let add = ends_sum(sequence);
        sequence.push(add);
    }
}

fn kelly_stake(balance: Amount, threshold: WinThreshold, house_edge_bps: u16) -> Amount {
    let tenths = threshold.tenths() as i64;
    let edge_bps = (BASIS_POINTS_SCALE as i64 - house_edge_bps as i64 - tenths * 10)
        .clamp(-KELLY_EDGE_CLAMP_BPS, KELLY_EDGE_CLAMP_BPS);
    if edge_bps <= 0 {
        return 0;
    }
    // edge / (odds - 1) with odds - 1 = (1000 - tenths) / tenths.
    let stake = mul_div_round(
        balance,
        edge_bps as u64 * tenths as u64,
        BASIS_POINTS_SCALE * (ROLL_RANGE as u64 - tenths as u64),
    )
    .unwrap_or(0);
    let cap = mul_div_round(balance, KELLY_MAX_FRACTION_BPS, BASIS_POINTS_SCALE).unwrap_or(0);
    stake.min(cap)
}

/// Decide the next bet for a scheduled player.
pub fn plan_bet(player: &Player, config: &EngineConfig, rng: &mut impl Rng) -> BetPlan {
    let mut state = player.strategy_state.clone();
    let outcome = state.unapplied_outcome.take();
    let base = player.base_bet;
    let threshold = config.win_threshold;

    let raw = match player.strategy {
        Strategy::Fixed => base,
        Strategy::Random => {
            let upper = config.max_bet.min(config.min_bet.max(base).saturating_mul(2));
            rng.gen_range(config.min_bet..=upper.max(config.min_bet))
        }
        Strategy::Martingale => {
            state.martingale_level = match outcome {
                Some(false) => (state.martingale_level + 1).min(MARTINGALE_MAX_LEVEL),
                Some(true) => 0,
                None => state.martingale_level,
            };
            base.saturating_mul(1u64 << state.martingale_level)
        }
        Strategy::AntiMartingale => {
            state.anti_level = match outcome {
                Some(true) => (state.anti_level + 1).min(ANTI_MARTINGALE_MAX_LEVEL),
                Some(false) => 0,
                None => state.anti_level,
            };
            base.saturating_mul(1 + state.anti_level as u64)
        }
        Strategy::DAlembert => {
            match outcome {
                Some(false) => state.dalembert_level = state.dalembert_level.saturating_add(1),
                Some(true) => state.dalembert_level = state.dalembert_level.saturating_sub(1),
                None => {}
            }
            base.saturating_mul(1 + state.dalembert_level as u64)
        }
        Strategy::Fibonacci => {
            match outcome {
                Some(false) => {
                    state.fibonacci_index = (state.fibonacci_index + 1).min(FIBONACCI_MAX_INDEX)
                }
                Some(true) => state.fibonacci_index = state.fibonacci_index.saturating_sub(2),
                None => {}
            }
            base.saturating_mul(fibonacci(state.fibonacci_index))
        }
        Strategy::Labouchere => {
            if state.labouchere.is_empty() {
                state.labouchere = LABOUCHERE_START.to_vec();
            }
            match outcome {
                Some(true) => cancel_ends(&mut state.labouchere, &LABOUCHERE_START),
                Some(false) => extend_ends(&mut state.labouchere),
                None => {}
            }
            base.saturating_mul(ends_sum(&state.labouchere))
        }
        Strategy::ReverseLabouchere => {
            if state.reverse_labouchere.is_empty() {
                state.reverse_labouchere = REVERSE_LABOUCHERE_START.to_vec();
            }
            match outcome {
                Some(true) => extend_ends(&mut state.reverse_labouchere),
                Some(false) => {
                    cancel_ends(&mut state.reverse_labouchere, &REVERSE_LABOUCHERE_START)
                }
                None => {}
            }
            base.saturating_mul(ends_sum(&state.reverse_labouchere))
        }
        Strategy::Kelly => config
            .min_bet
            .max(kelly_stake(player.balance, threshold, config.house_edge_bps)),
        Strategy::StopAfterWins => {
            match outcome {
                Some(true) => state.wins_this_cycle += 1,
                Some(false) => state.wins_this_cycle = 0,
                None => {}
            }
            if state.wins_this_cycle >= DEFAULT_STOP_AFTER_WINS {
                return BetPlan {
                    state,
                    intent: Err(DisableReason::StrategyHalt),
                };
            }
            base
        }
    };

    let mut stake = raw.clamp(config.min_bet, config.max_bet);
    if player.automated {
        stake = stake.clamp(config.sim_min_bet, config.sim_max_bet);
    }
    stake = stake.min(player.balance);

    let intent = if let Some(reason) = player.stop_bound_reached() {
        Err(reason)
    } else {
        let floor = if player.automated {
            config.sim_min_bet
        } else {
            config.min_bet
        };
        if stake < floor {
            Err(DisableReason::InsufficientFunds)
        } else {
            Ok(BetIntent { stake, threshold })
        }
    };
    BetPlan { state, intent }
}
