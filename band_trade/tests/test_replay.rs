use band_trade::replay::replay;
use band_trade::{
    AdaptiveMaConfig, AdaptiveMaStrategy, Bar, Reason, TradeError, VarBandConfig,
    VarBandStrategy,
};
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use risk_math::WindowConfig;
use std::collections::BTreeMap;
use std::f64::consts::PI;

fn day(i: usize) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

fn flat_bars(prices: &[f64]) -> Vec<Bar> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Bar::flat(day(i), p).unwrap())
        .collect()
}

fn zigzag(n: usize) -> Vec<f64> {
    (0..n).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
}

#[test]
fn test_var_band_buys_the_dip() {
    let mut bars = flat_bars(&zigzag(50));
    bars.push(Bar::new(day(50), 100.0, 100.0, 90.0, 100.0, 0.0).unwrap());

    let strategy = VarBandStrategy::new(VarBandConfig::default()).unwrap();
    let lower = strategy.bands(&zigzag(50)).unwrap().lower;
    let summary = replay(&strategy, &bars, 10_000.0).unwrap();

    assert_eq!(summary.strategy, "VaR Band");
    assert_eq!(summary.skipped, 50);
    assert_eq!(summary.evaluated, 1);
    assert_eq!(summary.decisions, BTreeMap::from([(Reason::VarBuy, 1)]));
    assert_eq!(summary.fills, 1);
    assert!((summary.final_quantity - 10_000.0 / lower).abs() < 1e-9);
    assert!((summary.final_exposure - summary.final_quantity * 100.0).abs() < 1e-9);
}

#[test]
fn test_adaptive_ma_round_trip() {
    let config = AdaptiveMaConfig {
        window: WindowConfig {
            lookback: 20,
            rolling_window: 2,
            rolling_reset: 3,
            default_window: 5,
            coefficient: 1.0,
            min_window: 2,
        },
        close_volatility_lookback: 5,
        ..AdaptiveMaConfig::default()
    };
    let strategy = AdaptiveMaStrategy::new(config).unwrap();

    // Settle under the band, break out, hold, fall back
    let mut prices = zigzag(20);
    prices.extend([100.2, 130.0, 131.0, 100.0]);
    let summary = replay(&strategy, &flat_bars(&prices), 10_000.0).unwrap();

    assert_eq!(summary.skipped, 20);
    assert_eq!(summary.evaluated, 4);
    assert_eq!(
        summary.decisions,
        BTreeMap::from([(Reason::EnterLong, 1), (Reason::BandExit, 1)])
    );
    assert_eq!(summary.fills, 2);
    assert_eq!(summary.final_quantity, 0.0);
    assert_eq!(summary.final_exposure, 0.0);
}

#[test]
fn test_every_bar_is_accounted_for() {
    let prices: Vec<f64> = (0..300)
        .map(|i| 100.0 + 8.0 * (2.0 * PI * i as f64 / 25.0).sin() + 0.01 * i as f64)
        .collect();
    let bars = flat_bars(&prices);

    let var_band = VarBandStrategy::new(VarBandConfig::default()).unwrap();
    let summary = replay(&var_band, &bars, 10_000.0).unwrap();
    assert_eq!(summary.evaluated + summary.skipped, bars.len());
    assert_eq!(summary.evaluated, 250);

    let adaptive = AdaptiveMaStrategy::new(AdaptiveMaConfig::default()).unwrap();
    let summary = replay(&adaptive, &bars, 10_000.0).unwrap();
    assert_eq!(summary.evaluated + summary.skipped, bars.len());
    assert_eq!(summary.evaluated, 200);
    assert!(summary.final_exposure >= 0.0);
}

#[test]
fn test_short_history_only_skips() {
    let bars = flat_bars(&zigzag(10));
    let strategy = VarBandStrategy::new(VarBandConfig::default()).unwrap();
    let summary = replay(&strategy, &bars, 10_000.0).unwrap();

    assert_eq!(summary.evaluated, 0);
    assert_eq!(summary.skipped, 10);
    assert!(summary.decisions.is_empty());
}

#[test]
fn test_summary_serializes_reasons_as_keys() {
    let mut bars = flat_bars(&zigzag(50));
    bars.push(Bar::new(day(50), 100.0, 100.0, 90.0, 100.0, 0.0).unwrap());
    let strategy = VarBandStrategy::new(VarBandConfig::default()).unwrap();
    let summary = replay(&strategy, &bars, 10_000.0).unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["decisions"]["VarBuy"], 1);
    assert_eq!(json["evaluated"], 1);
}

#[test]
fn test_non_positive_notional_is_rejected() {
    let bars = flat_bars(&zigzag(5));
    let strategy = VarBandStrategy::new(VarBandConfig::default()).unwrap();
    assert!(matches!(
        replay(&strategy, &bars, 0.0),
        Err(TradeError::InvalidParameter(_))
    ));
}
