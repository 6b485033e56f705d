use crate::money::{
    apply_bps, format_amount, mul_div_round, signed_mul_div_round, to_minor_units, WinThreshold,
    MAX_WIN_THRESHOLD_TENTHS, MIN_WIN_THRESHOLD_TENTHS,
};
use crate::{Player, PlayerId, Strategy};
use proptest::prelude::*;

proptest! {
    #[test]
    fn mul_div_round_is_within_half_unit(amount in 0u64..1_000_000_000, num in 0u64..1_000_000, den in 1u64..1_000_000) {
        let rounded = mul_div_round(amount, num, den).unwrap() as u128;
        let exact_scaled = amount as u128 * num as u128;
        // |rounded * den - exact| <= den / 2
        let lhs = rounded * den as u128;
        let diff = lhs.abs_diff(exact_scaled);
        prop_assert!(diff * 2 <= den as u128);
    }

    #[test]
    fn signed_rounding_mirrors_unsigned(delta in -1_000_000_000i64..1_000_000_000, num in 0u64..1_000_000, den in 1u64..1_000_000) {
        let positive = signed_mul_div_round(delta.abs(), num, den);
        let signed = signed_mul_div_round(delta, num, den);
        prop_assert_eq!(signed.abs(), positive);
    }

    #[test]
    fn fee_never_exceeds_stake(stake in 0u64..u64::MAX / 2, bps in 0u16..10_000) {
        prop_assert!(apply_bps(stake, bps) <= stake);
    }

    #[test]
    fn threshold_always_in_range(percent in -1_000.0f64..1_000.0) {
        match WinThreshold::from_percent(percent) {
            Some(threshold) => {
                prop_assert!(percent > 0.0);
                prop_assert!(threshold.tenths() >= MIN_WIN_THRESHOLD_TENTHS);
                prop_assert!(threshold.tenths() <= MAX_WIN_THRESHOLD_TENTHS);
            }
            None => prop_assert!(percent <= 0.0),
        }
    }

    #[test]
    fn display_conversion_is_stable(cents in 0u64..10_000_000_000) {
        let rendered = format_amount(cents);
        let parsed: f64 = rendered.parse().unwrap();
        prop_assert_eq!(to_minor_units(parsed), Some(cents));
    }
}

#[test]
fn strategy_names_round_trip() {
    for strategy in Strategy::ALL {
        assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
        let json = serde_json::to_string(&strategy).unwrap();
        assert_eq!(json, format!("\"{}\"", strategy.name()));
    }
    assert!("roulette".parse::<Strategy>().is_err());
}

#[test]
fn streak_counter_flips_sign() {
    let mut player = Player::new(PlayerId(1), 1_000, Strategy::Fixed, true);
    player.record_streak(true);
    player.record_streak(true);
    assert_eq!(player.streak, 2);
    player.record_streak(false);
    assert_eq!(player.streak, -1);
    player.record_streak(false);
    assert_eq!(player.streak, -2);
    player.record_streak(true);
    assert_eq!(player.streak, 1);
}

#[test]
fn stop_bounds_are_inclusive() {
    let mut player = Player::new(PlayerId(0), 1_000, Strategy::Fixed, false);
    player.stop_loss = Some(1_000);
    assert_eq!(
        player.stop_bound_reached(),
        Some(crate::DisableReason::StopLoss)
    );
    player.stop_loss = Some(500);
    player.take_profit = Some(1_000);
    assert_eq!(
        player.stop_bound_reached(),
        Some(crate::DisableReason::TakeProfit)
    );
    player.take_profit = Some(2_000);
    assert_eq!(player.stop_bound_reached(), None);
    assert!(!player.is_scheduled());
    player.autobet = true;
    assert!(player.is_scheduled());
}

#[test]
fn rejection_codes_are_distinct() {
    use crate::{LpId, Rejection};
    let rejections = [
        Rejection::StakeOutOfBounds { stake: 1, min: 2, max: 3 },
        Rejection::InsufficientBalance { balance: 1, stake: 2 },
        Rejection::InvalidOdds,
        Rejection::InsufficientCoverage { payout: 2, coverage: 1 },
        Rejection::ExposureLimit { payout: 2, cap: 1 },
        Rejection::PlayerNotFound(PlayerId(1)),
        Rejection::ProviderNotFound(LpId(1)),
        Rejection::InvalidAmount,
        Rejection::FundsLocked { until_ms: 5 },
        Rejection::NotOwner { player: PlayerId(1), lp: LpId(2) },
        Rejection::InsufficientCash { available: 1, requested: 2 },
        Rejection::NothingToClaim,
    ];
    let mut codes: Vec<u8> = rejections.iter().map(Rejection::code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes, (1..=12).collect::<Vec<u8>>());
}
