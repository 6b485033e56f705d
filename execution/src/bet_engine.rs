//! Bet validation and settlement.
//!
//! A bet is quoted first (pure, no mutation) and only then settled. Every
//! rejection happens during the quote, so a rejected bet never touches state.
//!
//! Odds are always derived from the clamped win threshold. Any multiplier a
//! caller attaches to a request is ignored.

use fairstake_types::money::{apply_bps, mul_div_round, BASIS_POINTS_SCALE, ROLL_RANGE};
use fairstake_types::{
    Amount, BetRecord, Delta, EngineConfig, House, LiquidityDrift, Player, Rejection,
    WinThreshold,
};
use tracing::debug;

use crate::fairness::ProvablyFair;
use crate::liquidity::LiquidityPool;

/// A wager as submitted by a participant or a strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct BetRequest {
    pub stake: Amount,
    /// Win probability in percent (e.g. `49.5`).
    pub threshold: f64,
    /// Multiplier claimed by the caller. Never read.
    pub client_odds: Option<f64>,
}

impl BetRequest {
    pub fn new(stake: Amount, threshold: f64) -> Self {
        Self {
            stake,
            threshold,
            client_odds: None,
        }
    }
}

/// Validated terms of a bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub stake: Amount,
    pub fee: Amount,
    pub net_stake: Amount,
    pub threshold: WinThreshold,
    /// Amount credited to the player on a win.
    pub payout: Amount,
}

/// Result of a settled bet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub record: BetRecord,
    /// Set when distributing the pool delta required snapping the bank.
    pub drift: Option<LiquidityDrift>,
}

/// `round(net * (1 - edge) * 100 / threshold)` in integer arithmetic.
pub fn payout_for(net_stake: Amount, threshold: WinThreshold, house_edge_bps: u16) -> Option<Amount> {
    let keep = BASIS_POINTS_SCALE.checked_sub(house_edge_bps as u64)?;
    let numerator = keep.checked_mul(ROLL_RANGE as u64)?;
    let denominator = BASIS_POINTS_SCALE.checked_mul(threshold.tenths() as u64)?;
    mul_div_round(net_stake, numerator, denominator)
}

/// Validate a request against limits, the player's balance and pool coverage.
pub fn quote(
    config: &EngineConfig,
    pool: &LiquidityPool,
    balance: Amount,
    request: &BetRequest,
) -> Result<Quote, Rejection> {
    let stake = request.stake;
    if stake < config.min_bet || stake > config.max_bet {
        return Err(Rejection::StakeOutOfBounds {
            stake,
            min: config.min_bet,
            max: config.max_bet,
        });
    }
    if balance < stake {
        return Err(Rejection::InsufficientBalance { balance, stake });
    }
    let threshold = WinThreshold::from_percent(request.threshold).ok_or(Rejection::InvalidOdds)?;

    let fee = apply_bps(stake, config.fee_bps);
    let net_stake = stake - fee;
    let payout = payout_for(net_stake, threshold, config.house_edge_bps)
        .filter(|payout| *payout > 0)
        .ok_or(Rejection::InvalidOdds)?;

    let coverage = pool.liquidity().saturating_add(net_stake);
    if pool.is_empty() || payout > coverage {
        return Err(Rejection::InsufficientCoverage { payout, coverage });
    }
    let cap = (coverage as u128 * config.max_exposure_bps as u128 / BASIS_POINTS_SCALE as u128) as Amount;
    if payout > cap {
        return Err(Rejection::ExposureLimit { payout, cap });
    }

    Ok(Quote {
        stake,
        fee,
        net_stake,
        threshold,
        payout,
    })
}

/// Mutable view over the session state a bet touches.
pub struct BetEngine<'a> {
    pub config: &'a EngineConfig,
    pub pool: &'a mut LiquidityPool,
    pub house: &'a mut House,
    pub fairness: &'a mut ProvablyFair,
}

impl BetEngine<'_> {
    /// Quote, roll and settle one bet.
    pub fn resolve(
        &mut self,
        player: &mut Player,
        request: &BetRequest,
        round: u64,
    ) -> Result<Settlement, Rejection> {
        let quote = quote(self.config, self.pool, player.balance, request)?;

        player.balance -= quote.stake;
        self.house.fee_balance = self.house.fee_balance.saturating_add(quote.fee);

        let outcome = self.fairness.roll();
        let won = quote.threshold.wins(outcome.value);
        let (payout, pool_delta) = if won {
            player.balance = player.balance.saturating_add(quote.payout);
            (quote.payout, quote.net_stake as Delta - quote.payout as Delta)
        } else {
            (0, quote.net_stake as Delta)
        };
        let drift = self.pool.settle(pool_delta);

        player.record_streak(won);
        player.strategy_state.unapplied_outcome = Some(won);
        player.total_wagered = player.total_wagered.saturating_add(quote.stake);
        if won {
            player.total_won += payout as Delta - quote.stake as Delta;
        } else {
            player.total_lost = player.total_lost.saturating_add(quote.stake);
        }

        let record = BetRecord {
            round,
            player: player.id,
            stake: quote.stake,
            fee: quote.fee,
            net_stake: quote.net_stake,
            odds_bps: quote.threshold.odds_bps(),
            threshold: quote.threshold,
            won,
            roll: outcome.value,
            payout,
            pool_delta,
            proof: outcome.proof,
        };
        debug!(
            round,
            player = %player.id,
            stake = quote.stake,
            roll = outcome.value,
            won,
            payout,
            pool_delta,
            "bet settled"
        );
        player.last_bet = Some(record.clone());
        Ok(Settlement { record, drift })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fairness::compute_roll;
    use fairstake_types::{LiquidityProvider, LpId, PlayerId, Strategy};

    fn config() -> EngineConfig {
        EngineConfig {
            min_bet: 1,
            max_exposure_bps: 10_000,
            ..EngineConfig::default()
        }
    }

    fn pool(liquidity: Amount) -> LiquidityPool {
        let mut pool = LiquidityPool::new(false, 0);
        pool.add_provider(LiquidityProvider::new(LpId(0), liquidity));
        pool
    }

    /// Find a server seed whose first roll wins (or loses) at 49.5.
    fn rigged(win: bool) -> ProvablyFair {
        let mut fair = ProvablyFair::new(0, 500);
        for byte in 0..=u8::MAX {
            let seed = [byte; 32];
            let (roll, _) = compute_roll(&seed, fair.client_seed(), 0);
            if (roll <= 495) == win {
                fair.set_server_seed(seed);
                return fair;
            }
        }
        unreachable!("no seed found");
    }

    #[test]
    fn worked_example_win() {
        let config = config();
        let mut pool = pool(1_000_000);
        let mut house = House::default();
        let mut fairness = rigged(true);
        let mut player = Player::new(PlayerId(0), 5_000, Strategy::Fixed, false);

        let mut engine = BetEngine {
            config: &config,
            pool: &mut pool,
            house: &mut house,
            fairness: &mut fairness,
        };
        let settlement = engine
            .resolve(&mut player, &BetRequest::new(100, 49.5), 1)
            .unwrap();
        let record = settlement.record;
        assert!(record.won);
        assert_eq!(record.fee, 1);
        assert_eq!(record.net_stake, 99);
        assert_eq!(record.payout, 196);
        assert_eq!(record.pool_delta, -97);
        assert_eq!(player.balance, 5_096);
        assert_eq!(player.streak, 1);
        assert_eq!(player.total_won, 96);
        assert_eq!(house.fee_balance, 1);
        assert_eq!(pool.liquidity(), 1_000_000 - 97);
        assert_eq!(pool.bank().delta_history.back(), Some(&-97));
    }

    #[test]
    fn loss_credits_pool_with_net_stake() {
        let config = config();
        let mut pool = pool(1_000_000);
        let mut house = House::default();
        let mut fairness = rigged(false);
        let mut player = Player::new(PlayerId(0), 5_000, Strategy::Fixed, false);

        let mut engine = BetEngine {
            config: &config,
            pool: &mut pool,
            house: &mut house,
            fairness: &mut fairness,
        };
        let record = engine
            .resolve(&mut player, &BetRequest::new(100, 49.5), 1)
            .unwrap()
            .record;
        assert!(!record.won);
        assert_eq!(record.payout, 0);
        assert_eq!(record.pool_delta, 99);
        assert_eq!(player.balance, 4_900);
        assert_eq!(player.streak, -1);
        assert_eq!(player.total_lost, 100);
        assert_eq!(player.pnl(), -100);
        assert_eq!(pool.liquidity(), 1_000_099);
        assert_eq!(player.last_bet.as_ref(), Some(&record));
    }

    #[test]
    fn supplied_odds_are_ignored() {
        let config = config();
        let pool = pool(1_000_000);
        let honest = quote(&config, &pool, 5_000, &BetRequest::new(100, 49.5)).unwrap();
        let forged = BetRequest {
            client_odds: Some(1_000_000.0),
            ..BetRequest::new(100, 49.5)
        };
        assert_eq!(quote(&config, &pool, 5_000, &forged), Ok(honest));
        assert_eq!(honest.payout, 196);
    }

    #[test]
    fn threshold_is_clamped() {
        let config = config();
        let pool = pool(1_000_000);
        let low = quote(&config, &pool, 5_000, &BetRequest::new(1_000, 0.01)).unwrap();
        assert_eq!(low.threshold.tenths(), 10);
        let high = quote(&config, &pool, 5_000, &BetRequest::new(1_000, 150.0)).unwrap();
        assert_eq!(high.threshold.tenths(), 989);
    }

    #[test]
    fn rejections_in_order() {
        let config = EngineConfig::default();
        let pool = pool(1_000_000);
        assert!(matches!(
            quote(&config, &pool, 1_000_000, &BetRequest::new(999, 49.5)),
            Err(Rejection::StakeOutOfBounds { .. })
        ));
        assert!(matches!(
            quote(&config, &pool, 500, &BetRequest::new(1_000, 49.5)),
            Err(Rejection::InsufficientBalance { .. })
        ));
        for threshold in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                quote(&config, &pool, 10_000, &BetRequest::new(1_000, threshold)),
                Err(Rejection::InvalidOdds)
            );
        }
    }

    #[test]
    fn coverage_and_exposure() {
        let config = EngineConfig::default();
        let request = BetRequest::new(100_000, 49.5);

        let empty = LiquidityPool::new(false, 0);
        assert!(matches!(
            quote(&config, &empty, 1_000_000, &request),
            Err(Rejection::InsufficientCoverage { .. })
        ));

        let thin = pool(50_000);
        assert!(matches!(
            quote(&config, &thin, 1_000_000, &request),
            Err(Rejection::InsufficientCoverage { .. })
        ));

        // Covered but above 25% of coverage.
        let mid = pool(300_000);
        assert!(matches!(
            quote(&config, &mid, 1_000_000, &request),
            Err(Rejection::ExposureLimit { .. })
        ));

        let deep = pool(10_000_000);
        assert!(quote(&config, &deep, 1_000_000, &request).is_ok());
    }

    #[test]
    fn exposure_cap_is_inclusive() {
        // No fee or edge at 50%: payout is exactly twice the stake.
        let config = EngineConfig {
            min_bet: 1,
            fee_bps: 0,
            house_edge_bps: 0,
            max_exposure_bps: 2_500,
            ..EngineConfig::default()
        };
        let request = BetRequest::new(1_000, 50.0);

        // Coverage 8000, cap 2000, payout 2000.
        let at_cap = quote(&config, &pool(7_000), 10_000, &request).unwrap();
        assert_eq!(at_cap.payout, 2_000);

        // Coverage 7996, cap 1999: one unit over.
        assert_eq!(
            quote(&config, &pool(6_996), 10_000, &request),
            Err(Rejection::ExposureLimit {
                payout: 2_000,
                cap: 1_999
            })
        );
    }

    #[test]
    fn rejected_bet_leaves_state_untouched() {
        let config = EngineConfig::default();
        let mut pool = pool(50_000);
        let mut house = House::default();
        let mut fairness = ProvablyFair::new(3, 500);
        let mut player = Player::new(PlayerId(1), 1_000_000, Strategy::Fixed, true);
        let before = (player.clone(), pool.liquidity(), fairness.nonce());

        let mut engine = BetEngine {
            config: &config,
            pool: &mut pool,
            house: &mut house,
            fairness: &mut fairness,
        };
        assert!(engine
            .resolve(&mut player, &BetRequest::new(100_000, 49.5), 1)
            .is_err());
        assert_eq!(before, (player, pool.liquidity(), fairness.nonce()));
        assert_eq!(house.fee_balance, 0);
    }
}
