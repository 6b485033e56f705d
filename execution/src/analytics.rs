//! Session statistics.

use fairstake_types::constants::{ANOMALY_LOG_LEN, ANOMALY_MIN_STREAK, ANOMALY_PROBABILITY_THRESHOLD};
use fairstake_types::{wager_bucket, Analytics, Anomaly, BetRecord, WinThreshold};
use tracing::info;

/// Probability of observing `streak` under a win probability of `threshold`.
pub fn streak_probability(streak: i32, threshold: WinThreshold) -> f64 {
    let p_win = threshold.percent() / 100.0;
    let p = if streak > 0 { p_win } else { 1.0 - p_win };
    p.powi(streak.unsigned_abs() as i32)
}

/// Fold a settled bet into the aggregates.
///
/// `streak` is the player's streak after the bet; `threshold` is the
/// configured win probability used to judge how surprising it is. Returns the
/// anomaly when one was flagged.
pub fn record_bet(
    analytics: &mut Analytics,
    record: &BetRecord,
    streak: i32,
    threshold: WinThreshold,
) -> Option<Anomaly> {
    analytics.total_bets += 1;
    analytics.bet_volume = analytics.bet_volume.saturating_add(record.stake);
    if record.won {
        analytics.total_wins += 1;
    } else {
        analytics.total_losses += 1;
    }
    analytics.house_profit += record.pool_delta;

    let length = streak.unsigned_abs();
    if streak > 0 {
        analytics.longest_win_streak = analytics.longest_win_streak.max(length);
    } else if streak < 0 {
        analytics.longest_loss_streak = analytics.longest_loss_streak.max(length);
    }
    if streak != 0 {
        let key = format!("{}{}", if streak > 0 { 'W' } else { 'L' }, length);
        *analytics.streak_distribution.entry(key).or_default() += 1;
    }
    *analytics
        .wager_histogram
        .entry(wager_bucket(record.stake))
        .or_default() += 1;

    if length < ANOMALY_MIN_STREAK {
        return None;
    }
    let probability = streak_probability(streak, threshold);
    if probability >= ANOMALY_PROBABILITY_THRESHOLD {
        return None;
    }
    let anomaly = Anomaly {
        round: record.round,
        player: record.player,
        streak,
        probability,
    };
    if analytics.anomalies.len() == ANOMALY_LOG_LEN {
        analytics.anomalies.pop_front();
    }
    analytics.anomalies.push_back(anomaly.clone());
    info!(
        round = record.round,
        player = %record.player,
        streak,
        probability,
        "improbable streak"
    );
    Some(anomaly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_types::{PlayerId, RollProof};

    fn record(stake: u64, won: bool, pool_delta: i64) -> BetRecord {
        BetRecord {
            round: 1,
            player: PlayerId(2),
            stake,
            fee: 0,
            net_stake: stake,
            odds_bps: 20_202,
            threshold: WinThreshold::default(),
            won,
            roll: if won { 1 } else { 1_000 },
            payout: 0,
            pool_delta,
            proof: RollProof {
                commitment: [0u8; 32],
                client_seed: "client".into(),
                nonce: 0,
                hash: [0u8; 32],
            },
        }
    }

    #[test]
    fn totals_and_edge() {
        let mut analytics = Analytics::default();
        record_bet(&mut analytics, &record(100, true, -97), 1, WinThreshold::default());
        record_bet(&mut analytics, &record(100, false, 99), -1, WinThreshold::default());
        assert_eq!(analytics.total_bets, 2);
        assert_eq!(analytics.total_wins, 1);
        assert_eq!(analytics.total_losses, 1);
        assert_eq!(analytics.bet_volume, 200);
        assert_eq!(analytics.house_profit, 2);
        assert!((analytics.realized_edge() - 0.01).abs() < 1e-12);
        assert_eq!(analytics.streak_distribution.get("W1"), Some(&1));
        assert_eq!(analytics.streak_distribution.get("L1"), Some(&1));
        assert_eq!(analytics.wager_histogram.get(&10), Some(&2));
    }

    #[test]
    fn long_streaks_are_flagged() {
        let mut analytics = Analytics::default();
        let threshold = WinThreshold::default();
        // 0.505^13 is about 1.4e-4; 0.505^14 about 7e-5.
        assert!(record_bet(&mut analytics, &record(1_000, false, 990), -13, threshold).is_none());
        let anomaly = record_bet(&mut analytics, &record(1_000, false, 990), -14, threshold).unwrap();
        assert_eq!(anomaly.streak, -14);
        assert!(anomaly.probability < ANOMALY_PROBABILITY_THRESHOLD);
        assert_eq!(analytics.longest_loss_streak, 14);
    }

    #[test]
    fn short_streaks_are_never_flagged() {
        let mut analytics = Analytics::default();
        // 1% threshold: a 7-win streak is wildly unlikely but below the minimum length.
        let threshold = WinThreshold::from_tenths(10);
        assert!(record_bet(&mut analytics, &record(1_000, true, 0), 7, threshold).is_none());
        assert!(record_bet(&mut analytics, &record(1_000, true, 0), 8, threshold).is_some());
    }

    #[test]
    fn anomaly_log_is_bounded() {
        let mut analytics = Analytics::default();
        let threshold = WinThreshold::from_tenths(10);
        for _ in 0..(ANOMALY_LOG_LEN + 3) {
            record_bet(&mut analytics, &record(1_000, true, 0), 9, threshold);
        }
        assert_eq!(analytics.anomalies.len(), ANOMALY_LOG_LEN);
    }
}
