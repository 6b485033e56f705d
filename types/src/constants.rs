/// Default house edge applied to winning payouts (2.00%).
pub const DEFAULT_HOUSE_EDGE_BPS: u16 = 200;

/// Default fee taken from every stake before odds apply (1.00%).
pub const DEFAULT_FEE_BPS: u16 = 100;

/// Default cap on a single payout relative to pool coverage (25%).
pub const DEFAULT_MAX_EXPOSURE_BPS: u16 = 2_500;

/// Bet limits in minor units (10.00 .. 5000.00).
pub const DEFAULT_MIN_BET: u64 = 1_000;
pub const DEFAULT_MAX_BET: u64 = 500_000;

/// Limits applied on top of the bet limits for simulated players (10.00 .. 500.00).
pub const DEFAULT_SIM_MIN_BET: u64 = 1_000;
pub const DEFAULT_SIM_MAX_BET: u64 = 50_000;

/// Default base bet for a new player (100.00).
pub const DEFAULT_BASE_BET: u64 = 10_000;

/// Rolls made with one server seed before it is rotated and revealed.
pub const DEFAULT_ROLLS_PER_SEED: u64 = 500;

/// Revealed seeds kept for retrospective verification.
pub const REVEALED_SEED_ARCHIVE_LEN: usize = 20;

/// Client seed used until a participant supplies their own.
pub const DEFAULT_CLIENT_SEED: &str = "client";

/// Recent pool deltas kept for volatility estimation.
pub const DELTA_HISTORY_LEN: usize = 200;

/// Rolling session log length.
pub const LOG_CAPACITY: usize = 400;

/// Anomalies kept for inspection.
pub const ANOMALY_LOG_LEN: usize = 50;

/// Shortest streak considered for anomaly flagging.
pub const ANOMALY_MIN_STREAK: u32 = 8;

/// Streaks less likely than this under the configured win probability are flagged.
pub const ANOMALY_PROBABILITY_THRESHOLD: f64 = 1e-4;

/// Auto-rebuy defaults: threshold 50.00, credit 500.00, 20 rounds between rebuys.
pub const DEFAULT_REBUY_THRESHOLD: u64 = 5_000;
pub const DEFAULT_REBUY_AMOUNT: u64 = 50_000;
pub const DEFAULT_REBUY_COOLDOWN_ROUNDS: u64 = 20;

/// Session clock advance per scheduled round.
pub const DEFAULT_ROUND_DURATION_MS: u64 = 400;

/// Cached LP shares are expressed in parts per million.
pub const SHARE_SCALE: u64 = 1_000_000;

/// Strategy escalation caps.
pub const MARTINGALE_MAX_LEVEL: u32 = 8;
pub const ANTI_MARTINGALE_MAX_LEVEL: u32 = 5;
pub const FIBONACCI_MAX_INDEX: u32 = 15;
pub const LABOUCHERE_MAX_LEN: usize = 20;
pub const DEFAULT_STOP_AFTER_WINS: u32 = 3;

/// Rejection codes reported alongside a [`crate::Rejection`].
pub const ERROR_STAKE_OUT_OF_BOUNDS: u8 = 1;
pub const ERROR_INSUFFICIENT_BALANCE: u8 = 2;
pub const ERROR_INVALID_ODDS: u8 = 3;
pub const ERROR_INSUFFICIENT_COVERAGE: u8 = 4;
pub const ERROR_EXPOSURE_LIMIT: u8 = 5;
pub const ERROR_PLAYER_NOT_FOUND: u8 = 6;
pub const ERROR_PROVIDER_NOT_FOUND: u8 = 7;
pub const ERROR_INVALID_AMOUNT: u8 = 8;
pub const ERROR_FUNDS_LOCKED: u8 = 9;
pub const ERROR_NOT_OWNER: u8 = 10;
pub const ERROR_INSUFFICIENT_CASH: u8 = 11;
pub const ERROR_NOTHING_TO_CLAIM: u8 = 12;
