use band_trade::strategies::var_band::VarBands;
use band_trade::{
    BandStrategy, Bar, BarContext, Decision, Fill, OrderIntent, Reason, Side, VarBandConfig,
    VarBandState, VarBandStrategy,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use risk_math::{FitMethod, LogNormalParams};

const CLOSES: [f64; 10] = [
    100.0, 102.0, 98.0, 101.0, 103.0, 97.0, 100.5, 99.5, 101.5, 98.5,
];

fn strategy() -> VarBandStrategy {
    VarBandStrategy::new(VarBandConfig::default()).unwrap()
}

fn bar(high: f64, low: f64) -> Bar {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mid = (high + low) / 2.0;
    Bar::new(ts, mid, high, low, mid, 1_000.0).unwrap()
}

fn evaluate(state: VarBandState, bar: &Bar) -> (VarBandState, Decision) {
    let ctx = BarContext {
        closes: &CLOSES,
        bar,
        exposure: 0.0,
    };
    strategy().evaluate(state, &ctx).unwrap()
}

fn bands() -> VarBands {
    strategy().bands(&CLOSES).unwrap()
}

#[test]
fn test_bands_match_fitted_distribution() {
    let params = LogNormalParams::fit(&CLOSES, FitMethod::MaximumLikelihood).unwrap();
    let bands = bands();

    assert_eq!(bands.lower, params.value_at_risk(1.0 - 0.8).unwrap());
    assert_eq!(bands.upper, params.value_at_risk(0.8).unwrap());
    assert_eq!(bands.tail, params.tail_value_at_risk(0.8).unwrap());
}

#[test]
fn test_quiet_bar_holds() {
    let b = bands();
    let (_, decision) = evaluate(VarBandState::default(), &bar(b.upper, b.lower));
    assert_eq!(decision, Decision::Hold);
}

#[test]
fn test_high_over_tail_is_strong_sell() {
    let b = bands();
    let (_, decision) = evaluate(VarBandState::default(), &bar(b.tail * 1.01, b.lower));
    assert_eq!(
        decision,
        Decision::Submit {
            intent: OrderIntent::limit(Side::Sell, 0.9, b.tail),
            reason: Reason::StrongSell,
        }
    );
}

#[test]
fn test_low_under_lower_is_buy() {
    let b = bands();
    let (_, decision) = evaluate(VarBandState::default(), &bar(b.upper, b.lower * 0.99));
    assert_eq!(
        decision,
        Decision::Submit {
            intent: OrderIntent::limit(Side::Buy, 1.0, b.lower),
            reason: Reason::VarBuy,
        }
    );
}

#[test]
fn test_high_between_upper_and_tail_is_sell() {
    let b = bands();
    let high = (b.upper + b.tail) / 2.0;
    let (_, decision) = evaluate(VarBandState::default(), &bar(high, b.lower));
    assert_eq!(
        decision,
        Decision::Submit {
            intent: OrderIntent::limit(Side::Sell, 0.75, b.upper),
            reason: Reason::VarSell,
        }
    );
}

#[test]
fn test_strong_sell_takes_priority_over_buy() {
    let b = bands();
    let (_, decision) = evaluate(VarBandState::default(), &bar(b.tail * 1.01, b.lower * 0.99));
    assert_eq!(decision.reason(), Some(Reason::StrongSell));
}

#[test]
fn test_buy_takes_priority_over_sell() {
    let b = bands();
    let high = (b.upper + b.tail) / 2.0;
    let (_, decision) = evaluate(VarBandState::default(), &bar(high, b.lower * 0.99));
    assert_eq!(decision.reason(), Some(Reason::VarBuy));
}

#[test]
fn test_recent_buy_above_thresholds_blocks_sells() {
    let b = bands();
    let state = VarBandState {
        recent_buy_price: b.tail * 1.1,
        ..VarBandState::default()
    };
    let (_, decision) = evaluate(state, &bar(b.tail * 1.01, b.lower));
    assert_eq!(decision, Decision::Hold);
}

#[test]
fn test_recent_buy_between_bands_falls_through_to_strong_sell_only() {
    let b = bands();
    let state = VarBandState {
        recent_buy_price: (b.upper + b.tail) / 2.0,
        ..VarBandState::default()
    };

    // Over the tail: the last buy is still under it
    let (_, decision) = evaluate(state, &bar(b.tail * 1.01, b.lower));
    assert_eq!(decision.reason(), Some(Reason::StrongSell));

    // Over the upper band only: the last buy is above it
    let (_, decision) = evaluate(state, &bar((b.upper + b.tail) / 2.0, b.lower));
    assert_eq!(decision, Decision::Hold);
}

#[test]
fn test_recent_sell_under_lower_blocks_buy() {
    let b = bands();
    let state = VarBandState {
        recent_sell_price: b.lower * 0.9,
        ..VarBandState::default()
    };
    let (_, decision) = evaluate(state, &bar(b.upper, b.lower * 0.99));
    assert_eq!(decision, Decision::Hold);
}

#[test]
fn test_evaluate_leaves_state_untouched() {
    let b = bands();
    let state = VarBandState {
        recent_buy_price: 95.0,
        recent_sell_price: 105.0,
    };
    let (next, _) = evaluate(state, &bar(b.tail * 1.01, b.lower * 0.99));
    assert_eq!(next, state);
}

#[test]
fn test_fills_update_recent_prices() {
    let strategy = strategy();
    let state = VarBandState::default();

    let state = strategy.on_fill(
        state,
        &Fill {
            reason: Reason::VarBuy,
            side: Side::Buy,
            price: 98.0,
            complete: true,
        },
    );
    assert_eq!(state.recent_buy_price, 98.0);
    assert_eq!(state.recent_sell_price, f64::INFINITY);

    let state = strategy.on_fill(
        state,
        &Fill {
            reason: Reason::VarSell,
            side: Side::Sell,
            price: 103.0,
            complete: false,
        },
    );
    assert_eq!(state.recent_buy_price, 98.0);
    assert_eq!(state.recent_sell_price, 103.0);
}

#[test]
fn test_history_is_limited_to_configured_length() {
    let strategy = VarBandStrategy::new(VarBandConfig {
        history_len: 4,
        ..VarBandConfig::default()
    })
    .unwrap();

    let all = strategy.bands(&CLOSES).unwrap();
    let last_four = strategy.bands(&CLOSES[CLOSES.len() - 4..]).unwrap();
    assert_eq!(all, last_four);
}

#[test]
fn test_method_of_moments_bands() {
    let strategy = VarBandStrategy::new(VarBandConfig {
        fit_method: FitMethod::MethodOfMoments,
        ..VarBandConfig::default()
    })
    .unwrap();
    let params = LogNormalParams::fit(&CLOSES, FitMethod::MethodOfMoments).unwrap();

    let bands = strategy.bands(&CLOSES).unwrap();
    assert_eq!(bands.upper, params.value_at_risk(0.8).unwrap());
}

#[test]
fn test_invalid_configs_are_rejected() {
    for config in [
        VarBandConfig {
            history_len: 1,
            ..VarBandConfig::default()
        },
        VarBandConfig {
            confidence: 1.0,
            ..VarBandConfig::default()
        },
        VarBandConfig {
            sell_fraction: 0.0,
            ..VarBandConfig::default()
        },
        VarBandConfig {
            strong_sell_fraction: 1.5,
            ..VarBandConfig::default()
        },
    ] {
        assert!(VarBandStrategy::new(config).is_err());
    }
}

#[test]
fn test_non_positive_close_is_an_error() {
    let strategy = strategy();
    let b = bar(101.0, 99.0);
    let closes = [100.0, 0.0, 101.0];
    let ctx = BarContext {
        closes: &closes,
        bar: &b,
        exposure: 0.0,
    };
    let err = strategy.evaluate(VarBandState::default(), &ctx).unwrap_err();
    assert!(!err.is_insufficient_data());
}
