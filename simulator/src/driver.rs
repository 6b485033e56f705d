//! Manual and timed drivers around [`Session::advance_round`].

use fairstake_execution::{HaltReason, RoundReport, Session};
use std::{future::Future, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// What a driver run produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub rounds: u64,
    pub bets: usize,
    pub rejections: usize,
    pub rebuys: u64,
    pub halt: Option<HaltReason>,
    pub interrupted: bool,
}

impl RunSummary {
    fn absorb(&mut self, report: &RoundReport) {
        if report.halt != Some(HaltReason::RoundLimit) {
            self.rounds += 1;
        }
        self.bets += report.bets.len();
        self.rejections += report.rejections.len();
        self.rebuys += report.rebuy_total();
        for (player, rejection) in &report.rejections {
            warn!(round = report.round, %player, %rejection, "scheduled bet rejected");
        }
        self.halt = report.halt;
    }
}

/// Run up to `rounds` rounds back to back (0 = until halted).
pub fn step(session: &mut Session, rounds: u64) -> RunSummary {
    let mut summary = RunSummary::default();
    while rounds == 0 || summary.rounds < rounds {
        let report = session.advance_round();
        summary.absorb(&report);
        if report.halted() {
            break;
        }
    }
    summary
}

/// Run one round per tick until `rounds` have run, the scheduler halts or
/// `shutdown` resolves. Shutdown is only observed between rounds.
pub async fn autoplay(
    session: &mut Session,
    tick: Duration,
    rounds: u64,
    shutdown: impl Future<Output = ()>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut ticker = interval(tick.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    info!(tick_ms = tick.as_millis() as u64, rounds, "autoplay started");
    loop {
        if rounds != 0 && summary.rounds >= rounds {
            break;
        }
        tokio::select! {
            _ = &mut shutdown => {
                summary.interrupted = true;
                info!(rounds = summary.rounds, "autoplay interrupted");
                break;
            }
            _ = ticker.tick() => {
                let report = session.advance_round();
                summary.absorb(&report);
                if report.halted() {
                    info!(round = report.round, halt = ?report.halt, "autoplay halted");
                    break;
                }
            }
        }
    }
    summary
}
