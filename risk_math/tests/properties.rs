use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, LogNormal};
use risk_math::swing::swing_points;
use risk_math::{AdaptiveWindowEstimator, FitMethod, LogNormalParams, SwingKind, WindowConfig};
use rstest::rstest;
use std::f64::consts::PI;

fn sample_lognormal(mu: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = LogNormal::new(mu, sigma).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

fn alpha_grid() -> Vec<f64> {
    (1..100).map(|i| i as f64 / 100.0).collect()
}

#[rstest]
#[case(FitMethod::MaximumLikelihood, 0.01, 0.01)]
#[case(FitMethod::MethodOfMoments, 0.02, 0.02)]
fn test_fit_recovers_parameters(
    #[case] method: FitMethod,
    #[case] mu_tol: f64,
    #[case] sigma_tol: f64,
) {
    let (mu0, sigma0) = (4.6, 0.2);
    let prices = sample_lognormal(mu0, sigma0, 20_000, 7);

    let params = LogNormalParams::fit(&prices, method).unwrap();
    assert_eq!(params.n(), prices.len());
    assert_abs_diff_eq!(params.mu(), mu0, epsilon = mu_tol);
    assert_abs_diff_eq!(params.sigma(), sigma0, epsilon = sigma_tol);
}

#[rstest]
#[case(2)]
#[case(10)]
#[case(250)]
fn test_fit_sigma_non_negative_and_n_matches(#[case] n: usize) {
    let prices = sample_lognormal(3.0, 0.5, n, n as u64);
    for method in [FitMethod::MaximumLikelihood, FitMethod::MethodOfMoments] {
        let params = LogNormalParams::fit(&prices, method).unwrap();
        assert!(params.sigma() >= 0.0);
        assert_eq!(params.n(), n);
    }
}

#[test]
fn test_value_at_risk_monotone_in_alpha() {
    let prices = sample_lognormal(4.0, 0.3, 200, 11);
    let params = LogNormalParams::fit(&prices, FitMethod::MaximumLikelihood).unwrap();

    let quantiles: Vec<f64> = alpha_grid()
        .into_iter()
        .map(|a| params.value_at_risk(a).unwrap())
        .collect();
    for pair in quantiles.windows(2) {
        assert!(pair[1] > pair[0], "{} !> {}", pair[1], pair[0]);
    }
}

#[rstest]
#[case(0.0, 0.05)]
#[case(4.6, 0.2)]
#[case(1.0, 1.5)]
fn test_tail_value_at_risk_dominates_quantile(#[case] mu: f64, #[case] sigma: f64) {
    let params = LogNormalParams::new(mu, sigma, 100).unwrap();
    for alpha in alpha_grid() {
        let var = params.value_at_risk(alpha).unwrap();
        let tvar = params.tail_value_at_risk(alpha).unwrap();
        assert!(tvar >= var, "alpha={}: tvar {} < var {}", alpha, tvar, var);
    }
}

#[test]
fn test_sine_wave_window_tracks_period() {
    let period = 20.0;
    let prices: Vec<f64> = (0..100)
        .map(|i| 100.0 + 10.0 * (2.0 * PI * i as f64 / period).sin())
        .collect();

    let config = WindowConfig::default();
    let coefficient = config.coefficient;
    let estimator = AdaptiveWindowEstimator::new(config).unwrap();
    let estimate = estimator.estimate(&prices).unwrap();

    let expected = period * coefficient;
    assert!(
        (estimate.window as f64 - expected).abs() <= 2.0,
        "window {} vs expected {}",
        estimate.window,
        expected
    );
}

#[rstest]
#[case(24.0, 15)]
#[case(40.0, 30)]
fn test_longer_periods_with_matching_patience(#[case] period: f64, #[case] reset: usize) {
    let prices: Vec<f64> = (0..200)
        .map(|i| 50.0 + 5.0 * (2.0 * PI * i as f64 / period).sin())
        .collect();

    let estimator = AdaptiveWindowEstimator::new(WindowConfig {
        lookback: 200,
        rolling_window: 5,
        rolling_reset: reset,
        default_window: 50,
        coefficient: 1.0,
        min_window: 1,
    })
    .unwrap();

    let estimate = estimator.estimate(&prices).unwrap();
    assert!((estimate.peak_spacing - period).abs() <= 1.0);
    assert!((estimate.trough_spacing - period).abs() <= 1.0);
}

#[test]
fn test_trending_series_swing_points() {
    let rising: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
    let falling: Vec<f64> = (0..100).map(|i| 200.0 - i as f64).collect();
    let stale = vec![5, 17, 29, 41, 53, 65, 77, 89];

    assert!(swing_points(&rising, 5, 10, SwingKind::Peak).is_empty());
    assert_eq!(swing_points(&rising, 5, 10, SwingKind::Trough), stale);
    assert_eq!(swing_points(&falling, 5, 10, SwingKind::Peak), stale);
    assert!(swing_points(&falling, 5, 10, SwingKind::Trough).is_empty());
}
