//! Bounded, human-readable session log.
//!
//! Structured diagnostics go through `tracing`; this log holds the short
//! one-line history a front end shows to the player.

use commonware_utils::hex;
use fairstake_types::constants::LOG_CAPACITY;
use fairstake_types::money::{format_amount, format_delta};
use fairstake_types::{Amount, BetRecord};
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct SessionLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl SessionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Lines oldest first.
    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Roll in `1..=1000` shown as a percentage with one decimal.
fn format_roll(roll: u16) -> String {
    format!("{}.{}", roll / 10, roll % 10)
}

/// `R12 P3 BET 100.00 roll 37.2 <= 49.5? WIN +196.00 bal=5096.00 commit=ab12cd34 nonce=7`
pub fn bet_line(record: &BetRecord, balance: Amount) -> String {
    let result = if record.won {
        format!("WIN +{}", format_amount(record.payout))
    } else {
        "LOSE".to_string()
    };
    let commitment = hex(&record.proof.commitment);
    format!(
        "R{} {} BET {} roll {} <= {}? {} bal={} commit={} nonce={}",
        record.round,
        record.player,
        format_amount(record.stake),
        format_roll(record.roll),
        record.threshold,
        result,
        format_amount(balance),
        &commitment[..8],
        record.proof.nonce,
    )
}

/// `POOL Δ -0.97 newLiquidity=9999.03`
pub fn pool_line(delta: i64, liquidity: Amount) -> String {
    format!(
        "POOL Δ {} newLiquidity={}",
        format_delta(delta),
        format_amount(liquidity)
    )
}
