use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::money::{Amount, WinThreshold, BASIS_POINTS_SCALE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_bet must be greater than zero")]
    ZeroMinBet,
    #[error("min_bet ({min}) exceeds max_bet ({max})")]
    InvertedBetLimits { min: Amount, max: Amount },
    #[error("sim_min_bet ({min}) exceeds sim_max_bet ({max})")]
    InvertedSimLimits { min: Amount, max: Amount },
    #[error("{field} must be below 10000 bps (got {value})")]
    RateOutOfRange { field: &'static str, value: u16 },
    #[error("max_exposure_bps must be in 1..=10000 (got {0})")]
    ExposureOutOfRange(u16),
    #[error("rolls_per_seed must be greater than zero")]
    ZeroRollsPerSeed,
}

/// Tunable parameters of a session.
///
/// Monetary fields are minor units, rates are basis points. Defaults reproduce
/// the demo table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_bet: Amount,
    pub max_bet: Amount,
    /// Extra limits applied to stakes planned for simulated players.
    pub sim_min_bet: Amount,
    pub sim_max_bet: Amount,
    pub house_edge_bps: u16,
    pub fee_bps: u16,
    pub max_exposure_bps: u16,
    /// Threshold used by the scheduler for automated bets.
    pub win_threshold: WinThreshold,
    /// Derive LP shares from minted pool tokens instead of raw balances.
    pub lp_tokenization: bool,
    /// Minimum lock applied when a player stakes into their own LP position.
    pub lp_min_lock_ms: u64,
    pub rolls_per_seed: u64,
    pub auto_reactivate: bool,
    pub rebuy_threshold: Amount,
    pub rebuy_amount: Amount,
    pub rebuy_cooldown_rounds: u64,
    /// Stop scheduling once this many rounds have run (0 = unlimited).
    pub max_rounds: u64,
    pub round_duration_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bet: DEFAULT_MIN_BET,
            max_bet: DEFAULT_MAX_BET,
            sim_min_bet: DEFAULT_SIM_MIN_BET,
            sim_max_bet: DEFAULT_SIM_MAX_BET,
            house_edge_bps: DEFAULT_HOUSE_EDGE_BPS,
            fee_bps: DEFAULT_FEE_BPS,
            max_exposure_bps: DEFAULT_MAX_EXPOSURE_BPS,
            win_threshold: WinThreshold::default(),
            lp_tokenization: true,
            lp_min_lock_ms: 0,
            rolls_per_seed: DEFAULT_ROLLS_PER_SEED,
            auto_reactivate: false,
            rebuy_threshold: DEFAULT_REBUY_THRESHOLD,
            rebuy_amount: DEFAULT_REBUY_AMOUNT,
            rebuy_cooldown_rounds: DEFAULT_REBUY_COOLDOWN_ROUNDS,
            max_rounds: 0,
            round_duration_ms: DEFAULT_ROUND_DURATION_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bet == 0 {
            return Err(ConfigError::ZeroMinBet);
        }
        if self.min_bet > self.max_bet {
            return Err(ConfigError::InvertedBetLimits {
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        if self.sim_min_bet > self.sim_max_bet {
            return Err(ConfigError::InvertedSimLimits {
                min: self.sim_min_bet,
                max: self.sim_max_bet,
            });
        }
        for (field, value) in [
            ("house_edge_bps", self.house_edge_bps),
            ("fee_bps", self.fee_bps),
        ] {
            if value as u64 >= BASIS_POINTS_SCALE {
                return Err(ConfigError::RateOutOfRange { field, value });
            }
        }
        if self.max_exposure_bps == 0 || self.max_exposure_bps as u64 > BASIS_POINTS_SCALE {
            return Err(ConfigError::ExposureOutOfRange(self.max_exposure_bps));
        }
        if self.rolls_per_seed == 0 {
            return Err(ConfigError::ZeroRollsPerSeed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_limits() {
        let config = EngineConfig {
            min_bet: 500,
            max_bet: 100,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedBetLimits { min: 500, max: 100 })
        );
    }

    #[test]
    fn rejects_full_house_edge() {
        let config = EngineConfig {
            house_edge_bps: 10_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange {
                field: "house_edge_bps",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_exposure() {
        let config = EngineConfig {
            max_exposure_bps: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ExposureOutOfRange(0)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"fee_bps": 50, "win_threshold": 300}"#).unwrap();
        assert_eq!(config.fee_bps, 50);
        assert_eq!(config.win_threshold.tenths(), 300);
        assert_eq!(config.max_bet, DEFAULT_MAX_BET);
    }
}
