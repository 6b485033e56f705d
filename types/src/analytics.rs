use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::liquidity::LpId;
use crate::money::{Amount, Delta, MINOR_UNITS_PER_UNIT};
use crate::player::{PlayerId, Strategy};

/// Layout version of [`AnalyticsExport`].
pub const ANALYTICS_EXPORT_VERSION: u32 = 1;

/// Upper-exclusive display-unit boundaries of the wager histogram buckets.
///
/// A wager falls into the bucket labelled by the largest boundary it reaches;
/// anything under 25 lands in bucket 10, anything from 5000 up in bucket 5000.
pub const WAGER_BUCKETS: [u64; 9] = [10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000];

/// Histogram bucket label (display units) for a stake in minor units.
pub fn wager_bucket(stake: Amount) -> u64 {
    let display = stake / MINOR_UNITS_PER_UNIT;
    WAGER_BUCKETS
        .iter()
        .rev()
        .copied()
        .find(|bucket| display >= *bucket)
        .unwrap_or(WAGER_BUCKETS[0])
}

/// Streak that was unlikely under the configured win probability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub round: u64,
    pub player: PlayerId,
    pub streak: i32,
    pub probability: f64,
}

/// Aggregated session statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_bets: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    /// Gross stake volume in minor units.
    pub bet_volume: Amount,
    /// Pool-side profit: net stakes kept minus winnings paid above the net stake.
    pub house_profit: Delta,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    /// Wager histogram keyed by bucket label.
    pub wager_histogram: BTreeMap<u64, u64>,
    /// Streak occurrences keyed as `W<n>` / `L<n>`.
    pub streak_distribution: BTreeMap<String, u64>,
    pub anomalies: VecDeque<Anomaly>,
    /// Combined value of all wallets when the session started.
    pub initial_value: Amount,
}

impl Analytics {
    /// `house_profit / bet_volume`, zero before the first bet.
    pub fn realized_edge(&self) -> f64 {
        if self.bet_volume == 0 {
            return 0.0;
        }
        self.house_profit as f64 / self.bet_volume as f64
    }
}

/// A seat's standing at export time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub id: PlayerId,
    pub name: String,
    pub strategy: Strategy,
    pub balance: Amount,
    pub pnl: Delta,
    pub streak: i32,
    pub total_wagered: Amount,
    pub active: bool,
}

/// A provider's standing at export time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub id: LpId,
    pub owner: Option<PlayerId>,
    pub balance: Amount,
    pub available_cash: Amount,
    pub share_ppm: u64,
    pub tokens: u64,
}

/// Read-only report of a session's statistics, suitable for offline analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsExport {
    pub version: u32,
    pub round: u64,
    pub realized_edge: f64,
    /// Standard deviation of recent pool deltas, in minor units.
    pub volatility: f64,
    pub bank_liquidity: Amount,
    pub house_fee_balance: Amount,
    pub analytics: Analytics,
    pub players: Vec<PlayerStats>,
    pub providers: Vec<ProviderStats>,
}

impl AnalyticsExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wager_buckets_match_display_boundaries() {
        assert_eq!(wager_bucket(0), 10);
        assert_eq!(wager_bucket(2_499), 10);
        assert_eq!(wager_bucket(2_500), 25);
        assert_eq!(wager_bucket(10_000), 100);
        assert_eq!(wager_bucket(99_999), 500);
        assert_eq!(wager_bucket(500_000), 5_000);
        assert_eq!(wager_bucket(u64::MAX), 5_000);
    }

    #[test]
    fn realized_edge_without_volume_is_zero() {
        let mut analytics = Analytics::default();
        assert_eq!(analytics.realized_edge(), 0.0);
        analytics.bet_volume = 1_000;
        analytics.house_profit = 20;
        assert!((analytics.realized_edge() - 0.02).abs() < 1e-12);
    }
}
