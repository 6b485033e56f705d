//! Fixed-point money.
//!
//! Every balance, stake, fee and payout is an integer count of minor units
//! (cents). Conversion to and from decimal display units only happens at the
//! session boundary; rates are expressed in basis points and applied with
//! widened integer arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsigned money in minor units.
pub type Amount = u64;

/// Signed money movement in minor units (pool deltas, profit counters).
pub type Delta = i64;

/// Minor units per display unit.
pub const MINOR_UNITS_PER_UNIT: u64 = 100;

/// Basis-point scale (10_000 bps = 100%).
pub const BASIS_POINTS_SCALE: u64 = 10_000;

/// Convert a display value (e.g. `12.34`) into minor units, rounding to the
/// nearest cent. Returns `None` for non-finite, negative or out-of-range input.
pub fn to_minor_units(display: f64) -> Option<Amount> {
    if !display.is_finite() || display < 0.0 {
        return None;
    }
    let scaled = (display * MINOR_UNITS_PER_UNIT as f64).round();
    if scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as Amount)
}

/// Convert minor units into a display value. Presentation only.
pub fn to_display(amount: Amount) -> f64 {
    amount as f64 / MINOR_UNITS_PER_UNIT as f64
}

/// Render minor units as a fixed two-decimal string.
pub fn format_amount(amount: Amount) -> String {
    format!(
        "{}.{:02}",
        amount / MINOR_UNITS_PER_UNIT,
        amount % MINOR_UNITS_PER_UNIT
    )
}

/// Render a signed delta with an explicit sign.
pub fn format_delta(delta: Delta) -> String {
    let sign = if delta < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_amount(delta.unsigned_abs()))
}

/// `round(amount * numerator / denominator)` with half-up rounding.
///
/// Returns `None` when the denominator is zero or the result does not fit.
pub fn mul_div_round(amount: u64, numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    let product = (amount as u128).checked_mul(numerator as u128)?;
    let rounded = product.checked_add(denominator as u128 / 2)? / denominator as u128;
    u64::try_from(rounded).ok()
}

/// `round(amount * bps / 10_000)`.
pub fn apply_bps(amount: Amount, bps: u16) -> Amount {
    // bps <= u16::MAX keeps the product well inside u128.
    mul_div_round(amount, bps as u64, BASIS_POINTS_SCALE).unwrap_or(Amount::MAX)
}

/// Signed variant of [`mul_div_round`] used for proportional pool deltas.
///
/// Rounds half away from zero, matching the rounding applied to positive values.
pub fn signed_mul_div_round(delta: Delta, numerator: u64, denominator: u64) -> Delta {
    if denominator == 0 {
        return 0;
    }
    let magnitude = mul_div_round(delta.unsigned_abs(), numerator, denominator).unwrap_or(0);
    let magnitude = Delta::try_from(magnitude).unwrap_or(Delta::MAX);
    if delta < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Lowest threshold accepted, in tenths of a percent (1.0%).
pub const MIN_WIN_THRESHOLD_TENTHS: u16 = 10;
/// Highest threshold accepted, in tenths of a percent (98.9%).
pub const MAX_WIN_THRESHOLD_TENTHS: u16 = 989;
/// Rolls span `1..=ROLL_RANGE`; one roll step is a tenth of a percent.
pub const ROLL_RANGE: u16 = 1_000;

/// Player-facing win probability with one decimal of precision.
///
/// Stored in tenths of a percent so that it lines up with the `1..=1000` roll
/// range: a roll wins iff `roll <= tenths`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct WinThreshold(u16);

impl WinThreshold {
    /// Parse a percent value (e.g. `49.5`), clamping it into the safe range.
    ///
    /// Non-finite and non-positive input yields `None`: the derived odds would be
    /// infinite or negative.
    pub fn from_percent(percent: f64) -> Option<Self> {
        if !percent.is_finite() || percent <= 0.0 {
            return None;
        }
        let tenths = (percent * 10.0).round();
        let tenths = tenths.clamp(
            MIN_WIN_THRESHOLD_TENTHS as f64,
            MAX_WIN_THRESHOLD_TENTHS as f64,
        );
        Some(Self(tenths as u16))
    }

    /// Build from tenths, clamping into the safe range.
    pub fn from_tenths(tenths: u16) -> Self {
        Self(tenths.clamp(MIN_WIN_THRESHOLD_TENTHS, MAX_WIN_THRESHOLD_TENTHS))
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }

    pub fn percent(&self) -> f64 {
        self.0 as f64 / 10.0
    }

    /// Fair payout multiplier `100 / threshold` in basis points, rounded.
    pub fn odds_bps(&self) -> u64 {
        mul_div_round(ROLL_RANGE as u64, BASIS_POINTS_SCALE, self.0 as u64).unwrap_or(0)
    }

    /// Whether a roll in `1..=ROLL_RANGE` wins against this threshold.
    pub fn wins(&self, roll: u16) -> bool {
        roll <= self.0
    }
}

impl From<u16> for WinThreshold {
    fn from(tenths: u16) -> Self {
        Self::from_tenths(tenths)
    }
}

impl From<WinThreshold> for u16 {
    fn from(threshold: WinThreshold) -> Self {
        threshold.0
    }
}

impl Default for WinThreshold {
    fn default() -> Self {
        Self(495)
    }
}

impl fmt::Display for WinThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_minor_units_rounds_to_nearest_cent() {
        assert_eq!(to_minor_units(12.346), Some(1235));
        assert_eq!(to_minor_units(0.125), Some(13));
        assert_eq!(to_minor_units(0.0), Some(0));
        assert_eq!(to_minor_units(100.0), Some(10_000));
        assert_eq!(to_minor_units(-1.0), None);
        assert_eq!(to_minor_units(f64::NAN), None);
        assert_eq!(to_minor_units(f64::INFINITY), None);
    }

    #[test]
    fn format_amount_pads_cents() {
        assert_eq!(format_amount(5096), "50.96");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_delta(-97), "-0.97");
        assert_eq!(format_delta(1_000), "+10.00");
    }

    #[test]
    fn apply_bps_rounds_half_up() {
        assert_eq!(apply_bps(100, 100), 1);
        assert_eq!(apply_bps(150, 100), 2);
        assert_eq!(apply_bps(149, 100), 1);
        assert_eq!(apply_bps(0, 100), 0);
    }

    #[test]
    fn mul_div_round_rejects_zero_denominator() {
        assert_eq!(mul_div_round(10, 1, 0), None);
        assert_eq!(mul_div_round(u64::MAX, u64::MAX, 1), None);
    }

    #[test]
    fn signed_mul_div_round_is_symmetric() {
        assert_eq!(signed_mul_div_round(-97, 1, 3), -32);
        assert_eq!(signed_mul_div_round(97, 1, 3), 32);
        assert_eq!(signed_mul_div_round(-5, 1, 2), -3);
        assert_eq!(signed_mul_div_round(5, 1, 0), 0);
    }

    #[test]
    fn win_threshold_clamps_and_rejects_malformed() {
        assert_eq!(WinThreshold::from_percent(49.5).unwrap().tenths(), 495);
        assert_eq!(WinThreshold::from_percent(0.2).unwrap().tenths(), 10);
        assert_eq!(WinThreshold::from_percent(250.0).unwrap().tenths(), 989);
        assert!(WinThreshold::from_percent(0.0).is_none());
        assert!(WinThreshold::from_percent(-3.0).is_none());
        assert!(WinThreshold::from_percent(f64::NAN).is_none());
        assert!(WinThreshold::from_percent(f64::INFINITY).is_none());
    }

    #[test]
    fn win_threshold_odds() {
        let threshold = WinThreshold::from_tenths(495);
        assert_eq!(threshold.odds_bps(), 20_202);
        assert!(threshold.wins(495));
        assert!(!threshold.wins(496));
        assert_eq!(threshold.to_string(), "49.5");
    }
}
