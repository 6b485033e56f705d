//! The demo table: ten seats and six liquidity providers.

use fairstake_types::{Amount, ConfigError, EngineConfig, Rejection, Strategy};
use thiserror::Error;
use tracing::info;

use crate::fairness::Entropy;
use crate::session::Session;

pub const DEMO_PLAYERS: usize = 10;
pub const DEMO_PROVIDERS: usize = 5;
/// Opening balance of every demo seat and provider (2000.00).
pub const DEMO_BALANCE: Amount = 200_000;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("provider setup rejected: {0}")]
    Provider(#[from] Rejection),
}

/// Build the demo session.
///
/// Seat 0 is the manual player with a fixed strategy. Seats 1 to 9 are
/// simulated and take strategies in [`Strategy::ALL`] order. Five independent
/// providers back the pool, plus a sixth owned by seat 0 that is funded
/// separately from its wallet.
pub fn demo_session(config: EngineConfig, entropy: Entropy) -> Result<Session, BootstrapError> {
    let mut session = Session::new(config, entropy)?;
    let manual = session.add_player(DEMO_BALANCE, Strategy::Fixed, false);
    for seat in 1..DEMO_PLAYERS {
        let strategy = Strategy::ALL[(seat - 1) % Strategy::ALL.len()];
        session.add_player(DEMO_BALANCE, strategy, true);
    }
    for _ in 0..DEMO_PROVIDERS {
        session.add_liquidity_provider(DEMO_BALANCE, None)?;
    }
    session.add_liquidity_provider(DEMO_BALANCE, Some(manual))?;
    session.log.push("Initialized state");
    info!(
        players = session.players().len(),
        providers = session.pool().providers().len(),
        liquidity = session.pool().liquidity(),
        "demo session ready"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_types::{LpId, PlayerId};

    #[test]
    fn demo_layout() {
        let session = demo_session(EngineConfig::default(), Entropy::Replay(3)).unwrap();
        let players = session.players();
        assert_eq!(players.len(), DEMO_PLAYERS);
        assert!(!players[0].automated);
        assert_eq!(players[0].strategy, Strategy::Fixed);
        assert_eq!(players[1].strategy, Strategy::Random);
        assert_eq!(players[9].strategy, Strategy::StopAfterWins);
        assert!(players[1..].iter().all(|p| p.automated));
        assert_eq!(players[4].name, "dAlembert");

        let pool = session.pool();
        assert_eq!(pool.providers().len(), DEMO_PROVIDERS + 1);
        assert_eq!(pool.liquidity(), 6 * DEMO_BALANCE);
        assert_eq!(pool.bank().total_token_supply, 6 * DEMO_BALANCE);
        assert_eq!(pool.provider(LpId(5)).unwrap().owner, Some(PlayerId(0)));
        assert!(pool.providers().iter().all(|lp| lp.share_ppm == 166_666 || lp.share_ppm == 166_667));
        assert_eq!(session.total_value(), 16 * DEMO_BALANCE);
        assert_eq!(session.analytics().initial_value, 16 * DEMO_BALANCE);
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = EngineConfig {
            rolls_per_seed: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            demo_session(config, Entropy::Replay(0)),
            Err(BootstrapError::Config(ConfigError::ZeroRollsPerSeed))
        ));
    }
}
