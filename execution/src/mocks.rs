//! Helpers for building sessions with predictable outcomes in tests.

use crate::fairness::{compute_roll, Entropy};
use crate::session::Session;
use fairstake_types::{EngineConfig, Seed};

/// Entropy used by [`session_with`].
pub const TEST_ENTROPY: u64 = 7;

/// An empty session with fixed entropy.
pub fn session_with(config: EngineConfig) -> Session {
    Session::new(config, Entropy::Replay(TEST_ENTROPY)).expect("test config should be valid")
}

/// Find a server seed whose first roll lands on the requested side of `tenths`.
pub fn seed_for_outcome(client_seed: &str, tenths: u16, win: bool) -> Seed {
    (0u16..=u16::MAX)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..2].copy_from_slice(&i.to_be_bytes());
            seed
        })
        .find(|seed| {
            let (roll, _) = compute_roll(seed, client_seed, 0);
            (roll <= tenths) == win
        })
        .expect("some seed should produce the requested outcome")
}

/// Install a server seed so the next roll wins (or loses) at the configured threshold.
///
/// Does not touch the session log.
pub fn rig_next_roll(session: &mut Session, win: bool) {
    let tenths = session.config.win_threshold.tenths();
    let seed = seed_for_outcome(session.fairness.client_seed(), tenths, win);
    session.fairness.set_server_seed(seed);
}
