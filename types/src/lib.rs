//! Common types used throughout fairstake.
//!
//! Plain data only: money, identifiers, configuration, participant and pool
//! state, bet records, fairness material and snapshots. Behaviour lives in
//! `fairstake-execution`.

pub mod analytics;
pub mod bet;
pub mod config;
pub mod constants;
pub mod fairness;
pub mod liquidity;
pub mod money;
pub mod player;
pub mod snapshot;

pub use analytics::{
    wager_bucket, Analytics, AnalyticsExport, Anomaly, PlayerStats, ProviderStats,
    ANALYTICS_EXPORT_VERSION,
};
pub use bet::{BetRecord, Rejection};
pub use config::{ConfigError, EngineConfig};
pub use fairness::{RevealedSeed, RollProof, Seed, SEED_LEN};
pub use liquidity::{Bank, House, LiquidityDrift, LiquidityProvider, LpId};
pub use money::{Amount, Delta, WinThreshold};
pub use player::{DisableReason, Player, PlayerId, Strategy, StrategyState, UnknownStrategy};
pub use snapshot::{
    LpSnapshot, PlayerSnapshot, SchemaStatus, SessionSnapshot, SnapshotError,
    CURRENT_SCHEMA_VERSION,
};

#[cfg(test)]
mod tests;
