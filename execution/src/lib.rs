//! Fairstake execution layer.
//!
//! This crate contains the bet engine, the provably-fair roll generator, the
//! liquidity pool ledger, player strategies and the round scheduler that
//! drives simulated play. Everything is reachable through [`Session`].
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution. Lock windows and rounds use
//!   the session clock, which only moves when the driver advances it.
//! - Outcomes come from the server seed, client seed and nonce alone. The
//!   fallback generator only shapes decorative stake jitter.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Money
//! All balances are integer minor units ([`fairstake_types::Amount`]). Display
//! values are converted once, at the [`Session`] boundary.
//!
//! ## Minimal session (example)
//! ```rust
//! use fairstake_execution::{bootstrap::demo_session, EngineConfig, Entropy};
//!
//! let mut session = demo_session(EngineConfig::default(), Entropy::Replay(42)).unwrap();
//! let report = session.advance_round();
//! assert_eq!(report.round, 1);
//! assert!(!report.bets.is_empty());
//! ```

pub mod analytics;
pub mod bet_engine;
pub mod bootstrap;
pub mod fairness;
pub mod liquidity;
pub mod logging;
pub mod round_scheduler;
pub mod session;
pub mod strategy;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use bet_engine::{payout_for, quote, BetEngine, BetRequest, Quote, Settlement};
pub use bootstrap::{demo_session, BootstrapError};
pub use fairness::{
    compute_commitment, compute_roll, verify_commitment, verify_roll, Entropy, ProvablyFair,
};
pub use fairstake_types::EngineConfig;
pub use liquidity::LiquidityPool;
pub use logging::SessionLog;
pub use round_scheduler::{HaltReason, Reactivation, RoundReport};
pub use session::Session;
pub use strategy::{plan_bet, BetIntent, BetPlan};
