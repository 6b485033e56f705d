//! Round scheduler for automated play.
//!
//! Each call to [`Session::advance_round`] runs one batch: every scheduled
//! player gets exactly one bet attempt, in seat order, followed by a single
//! auto-reactivation pass. The outer driver (a timer, a CLI loop, a test)
//! decides when to call it; nothing here sleeps or reads wall-clock time.
//!
//! ## Per-round flow
//!
//! 1. **Limit** - once `max_rounds` rounds have run, the scheduler halts
//!    without touching state.
//! 2. **Sweep** - for each scheduled player, plan a bet from its strategy and
//!    resolve it. A failed plan deactivates a simulated player with the
//!    plan's reason. A manual player on autobet only bets while a stop bound
//!    is configured; reaching the bound switches autobet off.
//! 3. **Reactivation** - simulated players disabled for insufficient funds
//!    are topped up once their rebuy cooldown has elapsed; players stopped
//!    out whose balance recovered are re-enabled.
//! 4. **Clock** - the session clock advances by `round_duration_ms`.

use fairstake_types::money::format_amount;
use fairstake_types::{
    Amount, Anomaly, BetRecord, DisableReason, LiquidityDrift, Player, PlayerId, Rejection,
};
use tracing::{debug, info};

use crate::bet_engine::BetRequest;
use crate::session::Session;
use crate::strategy::plan_bet;

/// Why the scheduler stopped producing bets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// `max_rounds` reached.
    RoundLimit,
    /// No scheduled player attempted a bet this round.
    NoActivePlayers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reactivation {
    Rebuy { player: PlayerId, amount: Amount },
    StopLossCleared { player: PlayerId },
}

/// Everything that happened during one round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundReport {
    pub round: u64,
    pub bets: Vec<BetRecord>,
    pub rejections: Vec<(PlayerId, Rejection)>,
    pub disabled: Vec<(PlayerId, DisableReason)>,
    pub reactivated: Vec<Reactivation>,
    pub anomalies: Vec<Anomaly>,
    pub drift: Vec<LiquidityDrift>,
    pub halt: Option<HaltReason>,
}

impl RoundReport {
    pub fn halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Total credited by rebuys this round.
    pub fn rebuy_total(&self) -> Amount {
        self.reactivated
            .iter()
            .map(|reactivation| match reactivation {
                Reactivation::Rebuy { amount, .. } => *amount,
                Reactivation::StopLossCleared { .. } => 0,
            })
            .sum()
    }
}

/// What the scheduler should do with a manual player on autobet.
enum ManualGate {
    Bet,
    Skip,
    BoundReached,
}

fn manual_gate(player: &Player) -> ManualGate {
    if player.stop_loss.is_none() && player.take_profit.is_none() {
        return ManualGate::Skip;
    }
    if player.stop_bound_reached().is_some() {
        return ManualGate::BoundReached;
    }
    ManualGate::Bet
}

impl Session {
    /// Run one scheduled round.
    pub fn advance_round(&mut self) -> RoundReport {
        let max_rounds = self.config.max_rounds;
        if max_rounds > 0 && self.round >= max_rounds {
            self.log
                .push(format!("Round limit {max_rounds} reached; autoplay halted"));
            return RoundReport {
                round: self.round,
                halt: Some(HaltReason::RoundLimit),
                ..RoundReport::default()
            };
        }
        self.round += 1;
        let mut report = RoundReport {
            round: self.round,
            ..RoundReport::default()
        };

        let mut attempted = 0usize;
        for index in 0..self.players.len() {
            let player = &self.players[index];
            if !player.is_scheduled() {
                continue;
            }
            if !player.automated {
                match manual_gate(player) {
                    ManualGate::Skip => continue,
                    ManualGate::BoundReached => {
                        let id = player.id;
                        self.players[index].autobet = false;
                        self.log
                            .push(format!("{id} AUTOBET stopped: stop condition reached"));
                        continue;
                    }
                    ManualGate::Bet => {}
                }
            }

            let plan = plan_bet(&self.players[index], &self.config, self.fairness.fallback());
            let player = &mut self.players[index];
            player.strategy_state = plan.state;
            let id = player.id;
            let intent = match plan.intent {
                Ok(intent) => intent,
                Err(reason) => {
                    if player.automated {
                        player.deactivate(reason);
                        report.disabled.push((id, reason));
                        self.log.push(format!("{id} DISABLED ({reason})"));
                        debug!(player = %id, %reason, "player disabled");
                    }
                    continue;
                }
            };

            attempted += 1;
            let request = BetRequest::new(intent.stake, intent.threshold.percent());
            match self.resolve_bet(id, request) {
                Ok(outcome) => {
                    report.anomalies.extend(outcome.anomaly);
                    report.drift.extend(outcome.drift);
                    report.bets.push(outcome.record);
                }
                Err(rejection) => report.rejections.push((id, rejection)),
            }
        }

        if self.config.auto_reactivate {
            self.reactivate(&mut report);
        }

        self.clock_ms = self.clock_ms.saturating_add(self.config.round_duration_ms);

        if attempted == 0 {
            self.log
                .push("No active sim players; autoplay halted".to_string());
            report.halt = Some(HaltReason::NoActivePlayers);
        }
        info!(
            round = self.round,
            bets = report.bets.len(),
            rejections = report.rejections.len(),
            disabled = report.disabled.len(),
            reactivated = report.reactivated.len(),
            liquidity = self.pool.liquidity(),
            "round complete"
        );
        report
    }

    /// Rebuy and re-enable simulated players after the sweep.
    fn reactivate(&mut self, report: &mut RoundReport) {
        let round = self.round;
        let config = &self.config;
        for player in self.players.iter_mut() {
            if !player.automated || player.active {
                continue;
            }
            if matches!(player.last_rebuy_round, Some(last) if round.saturating_sub(last) < config.rebuy_cooldown_rounds)
            {
                continue;
            }
            match player.disable_reason {
                Some(DisableReason::InsufficientFunds)
                    if player.balance < config.rebuy_threshold =>
                {
                    player.balance = player.balance.saturating_add(config.rebuy_amount);
                    player.reactivate();
                    player.last_rebuy_round = Some(round);
                    report.reactivated.push(Reactivation::Rebuy {
                        player: player.id,
                        amount: config.rebuy_amount,
                    });
                    self.log.push(format!(
                        "{} REBUY +{} (bal={})",
                        player.id,
                        format_amount(config.rebuy_amount),
                        format_amount(player.balance)
                    ));
                }
                Some(DisableReason::StopLoss)
                    if player.balance > player.stop_loss.unwrap_or(0) =>
                {
                    player.reactivate();
                    report
                        .reactivated
                        .push(Reactivation::StopLossCleared { player: player.id });
                    self.log
                        .push(format!("{} REACTIVATED (stopLoss cleared)", player.id));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::demo_session;
    use crate::fairness::Entropy;
    use crate::mocks::session_with;
    use fairstake_types::{EngineConfig, Strategy};

    fn rebuy_config() -> EngineConfig {
        EngineConfig {
            auto_reactivate: true,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn round_limit_halts_without_advancing() {
        let config = EngineConfig {
            max_rounds: 2,
            ..EngineConfig::default()
        };
        let mut session = demo_session(config, Entropy::Replay(5)).unwrap();
        assert_eq!(session.advance_round().round, 1);
        let second = session.advance_round();
        assert_eq!(second.round, 2);
        assert!(second.bets.iter().all(|bet| bet.round == 2));

        let value = session.total_value();
        let third = session.advance_round();
        assert_eq!(third.halt, Some(HaltReason::RoundLimit));
        assert!(third.bets.is_empty());
        assert_eq!(session.round(), 2);
        assert_eq!(session.clock_ms(), 2 * session.config().round_duration_ms);
        assert_eq!(session.total_value(), value);
    }

    #[test]
    fn idle_table_reports_no_active_players() {
        let mut session = session_with(EngineConfig::default());
        session.add_player(100_000, Strategy::Fixed, false);
        session.add_liquidity_provider(1_000_000, None).unwrap();

        let report = session.advance_round();
        assert_eq!(report.halt, Some(HaltReason::NoActivePlayers));
        assert!(report.halted());
        assert_eq!(session.round(), 1);
        assert_eq!(session.clock_ms(), session.config().round_duration_ms);
    }

    #[test]
    fn short_stack_is_disabled_and_rebought_after_cooldown() {
        let mut session = session_with(rebuy_config());
        let player = session.add_player(500, Strategy::Fixed, true);
        session.add_liquidity_provider(1_000_000, None).unwrap();

        let first = session.advance_round();
        assert_eq!(
            first.disabled,
            vec![(player, DisableReason::InsufficientFunds)]
        );
        assert_eq!(
            first.reactivated,
            vec![Reactivation::Rebuy {
                player,
                amount: session.config().rebuy_amount
            }]
        );
        assert_eq!(first.rebuy_total(), 50_000);
        assert_eq!(session.player(player).unwrap().balance, 50_500);
        assert!(session.player(player).unwrap().active);

        // Broke again straight away: the cooldown keeps the seat empty.
        session.players[0].balance = 500;
        let cooldown = session.config().rebuy_cooldown_rounds;
        for _ in 2..(1 + cooldown) {
            let report = session.advance_round();
            assert!(report.reactivated.is_empty());
            assert!(!session.player(player).unwrap().active);
        }
        let report = session.advance_round();
        assert_eq!(report.round, 1 + cooldown);
        assert_eq!(report.rebuy_total(), 50_000);
        assert!(session.player(player).unwrap().active);
        assert!(session
            .log()
            .lines()
            .any(|line| line.starts_with("P0 REBUY +500.00")));
    }

    #[test]
    fn rebuy_requires_auto_reactivate() {
        let mut session = session_with(EngineConfig::default());
        let player = session.add_player(500, Strategy::Fixed, true);
        session.add_liquidity_provider(1_000_000, None).unwrap();
        for _ in 0..3 {
            assert!(session.advance_round().reactivated.is_empty());
        }
        let seat = session.player(player).unwrap();
        assert!(!seat.active);
        assert_eq!(seat.disable_reason, Some(DisableReason::InsufficientFunds));
        assert_eq!(seat.balance, 500);
    }

    #[test]
    fn stop_loss_seat_returns_once_bound_clears() {
        let mut session = session_with(rebuy_config());
        let player = session.add_player(100_000, Strategy::Fixed, true);
        session.add_liquidity_provider(1_000_000, None).unwrap();
        session.set_stop_bounds(player, Some(1_000.0), None).unwrap();

        let first = session.advance_round();
        assert_eq!(first.disabled, vec![(player, DisableReason::StopLoss)]);
        assert!(first.reactivated.is_empty());
        assert!(first.bets.is_empty());

        session.set_stop_bounds(player, None, None).unwrap();
        let second = session.advance_round();
        assert_eq!(
            second.reactivated,
            vec![Reactivation::StopLossCleared { player }]
        );
        assert!(session.player(player).unwrap().active);
        assert_eq!(session.advance_round().bets.len(), 1);
    }

    #[test]
    fn manual_autobet_needs_a_stop_bound() {
        let mut session = session_with(EngineConfig::default());
        let player = session.add_player(100_000, Strategy::Fixed, false);
        session.add_liquidity_provider(10_000_000, None).unwrap();
        session.set_autobet(player, true).unwrap();

        let unbounded = session.advance_round();
        assert!(unbounded.bets.is_empty());
        assert_eq!(unbounded.halt, Some(HaltReason::NoActivePlayers));

        session.set_stop_bounds(player, None, Some(5_000.0)).unwrap();
        let bounded = session.advance_round();
        assert_eq!(bounded.bets.len(), 1);
        assert_eq!(bounded.bets[0].player, player);
        assert_eq!(bounded.halt, None);

        session.set_stop_bounds(player, None, Some(1.0)).unwrap();
        let reached = session.advance_round();
        assert!(reached.bets.is_empty());
        assert!(!session.player(player).unwrap().autobet);
        assert!(session.player(player).unwrap().active);
        assert_eq!(
            session.log().lines().next_back(),
            Some("No active sim players; autoplay halted")
        );
    }

    #[test]
    fn failed_plan_leaves_manual_seat_active() {
        let mut session = session_with(EngineConfig::default());
        let player = session.add_player(500, Strategy::Fixed, false);
        session.add_liquidity_provider(1_000_000, None).unwrap();
        session.set_autobet(player, true).unwrap();
        session.set_stop_bounds(player, Some(0.0), None).unwrap();

        let report = session.advance_round();
        assert!(report.disabled.is_empty());
        assert!(report.bets.is_empty());
        let seat = session.player(player).unwrap();
        assert!(seat.active);
        assert!(seat.autobet);
    }

    #[test]
    fn demo_rounds_keep_pool_in_step() {
        let mut session = demo_session(rebuy_config(), Entropy::Replay(9)).unwrap();
        for _ in 0..50 {
            let report = session.advance_round();
            assert!(report.bets.len() <= session.players().len());
            let lp_total: u64 = session.pool().providers().iter().map(|lp| lp.balance).sum();
            assert_eq!(session.pool().liquidity(), lp_total);
        }
        let analytics = session.analytics();
        assert!(analytics.total_bets > 0);
        assert_eq!(
            analytics.total_bets,
            analytics.total_wins + analytics.total_losses
        );
    }
}
