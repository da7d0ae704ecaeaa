//! Adaptive moving-average window estimation
//!
//! Scans a price series for swing points (confirmed local peaks and troughs)
//! with a rolling window and turns the average spacing between swings into a
//! moving-average window length. The scan is run once per side:
//!
//! 1. From index `rolling_window` onward, take the rolling extremum over the
//!    trailing `rolling_window + 1` prices.
//! 2. An extremum that beats the current candidate close to it extends the
//!    candidate; one that beats it further away starts a new swing and
//!    commits the old candidate.
//! 3. A candidate left unbeaten for more than `rolling_reset` bars, or still
//!    open on the last bar, is committed and the scan resets.
//!
//! The two sides differ right after a reset. A new peak always extends the
//! empty candidate at index 0. A new trough does so only while index 0 is
//! still within reach; later it opens a swing, so the next distant trough
//! commits it. A series that never moves has no swing points on either side.
//!
//! `window = round(mean(spacing of peaks, spacing of troughs) * coefficient)`,
//! never below `min_window`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Candidate value standing in for "no peak yet"
const PEAK_SENTINEL: f64 = 0.0;
/// Candidate value standing in for "no trough yet"
const TROUGH_SENTINEL: f64 = 1_000_000_000.0;

/// Which side of the price swings to scan for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    /// Local highs
    Peak,
    /// Local lows
    Trough,
}

impl SwingKind {
    fn sentinel(self) -> f64 {
        match self {
            SwingKind::Peak => PEAK_SENTINEL,
            SwingKind::Trough => TROUGH_SENTINEL,
        }
    }

    /// Rolling extremum of the window for this side
    fn extremum(self, window: &[f64]) -> f64 {
        match self {
            SwingKind::Peak => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            SwingKind::Trough => window.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// True when `value` is strictly more extreme than `reference`
    fn beats(self, value: f64, reference: f64) -> bool {
        match self {
            SwingKind::Peak => value > reference,
            SwingKind::Trough => value < reference,
        }
    }
}

/// Configuration of the adaptive window estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Exact number of prices each estimate is computed over
    pub lookback: usize,
    /// Trailing span of the rolling extremum, and the reach of a swing
    pub rolling_window: usize,
    /// Bars a candidate may stay unbeaten before it is committed
    pub rolling_reset: usize,
    /// Spacing used for a side with fewer than two swing points
    pub default_window: usize,
    /// Multiplier applied to the average swing spacing
    pub coefficient: f64,
    /// Lower bound of the resulting window
    pub min_window: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback: 100,
            rolling_window: 5,
            rolling_reset: 10,
            default_window: 50,
            coefficient: 2.5,
            min_window: 10,
        }
    }
}

impl WindowConfig {
    /// Check every field against its valid range
    pub fn validate(&self) -> Result<()> {
        if self.rolling_window == 0 {
            return Err(MathError::InvalidInput(
                "rolling_window must be greater than zero".to_string(),
            ));
        }
        if self.lookback <= self.rolling_window {
            return Err(MathError::InvalidInput(format!(
                "lookback ({}) must be greater than rolling_window ({})",
                self.lookback, self.rolling_window
            )));
        }
        if self.default_window == 0 {
            return Err(MathError::InvalidInput(
                "default_window must be greater than zero".to_string(),
            ));
        }
        if self.min_window == 0 {
            return Err(MathError::InvalidInput(
                "min_window must be greater than zero".to_string(),
            ));
        }
        if !(self.coefficient.is_finite() && self.coefficient > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "coefficient must be positive and finite, got {}",
                self.coefficient
            )));
        }
        Ok(())
    }
}

/// Result of one window estimation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEstimate {
    /// Indices of confirmed peaks, in commit order
    pub peaks: Vec<usize>,
    /// Indices of confirmed troughs, in commit order
    pub troughs: Vec<usize>,
    /// Average gap between consecutive peaks (or the default)
    pub peak_spacing: f64,
    /// Average gap between consecutive troughs (or the default)
    pub trough_spacing: f64,
    /// Moving-average window length to use
    pub window: usize,
}

/// Extremum under consideration as the next swing point
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    value: f64,
    index: usize,
}

/// Scan state for one side
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    /// Nothing tracked; comparisons use the side's sentinel at index 0
    NoCandidate,
    /// Candidate formed since the last commit or the start of the scan.
    /// Replacing it by a distant extremum does not commit it.
    JustCommitted(Candidate),
    /// Candidate that opened a new swing. Replacing it commits it.
    Tracking(Candidate),
}

impl ScanState {
    fn candidate(self, kind: SwingKind) -> Candidate {
        match self {
            ScanState::NoCandidate => Candidate {
                value: kind.sentinel(),
                index: 0,
            },
            ScanState::JustCommitted(c) | ScanState::Tracking(c) => c,
        }
    }

    fn reset_pending(self) -> bool {
        !matches!(self, ScanState::Tracking(_))
    }

    /// State after `next` beats the empty candidate at scan position `i`
    fn first(kind: SwingKind, next: Candidate, i: usize, rolling_window: usize) -> Self {
        match kind {
            SwingKind::Peak => ScanState::JustCommitted(next),
            SwingKind::Trough if i <= rolling_window => ScanState::JustCommitted(next),
            SwingKind::Trough => ScanState::Tracking(next),
        }
    }
}

/// Collect the swing points of one side of `prices`
///
/// Indices are the scan positions at which each committed candidate was
/// last extended, in the order they were committed.
pub fn swing_points(
    prices: &[f64],
    rolling_window: usize,
    rolling_reset: usize,
    kind: SwingKind,
) -> Vec<usize> {
    if prices.windows(2).all(|w| w[0] == w[1]) {
        return Vec::new();
    }

    let n = prices.len();
    let mut points = Vec::new();
    let mut state = ScanState::NoCandidate;

    for i in rolling_window..n {
        let current = kind.extremum(&prices[i - rolling_window..=i]);
        let candidate = state.candidate(kind);

        if kind.beats(current, candidate.value) {
            let next = Candidate {
                value: current,
                index: i,
            };
            state = match state {
                ScanState::NoCandidate => ScanState::first(kind, next, i, rolling_window),
                ScanState::JustCommitted(c) | ScanState::Tracking(c)
                    if c.index + rolling_window >= i =>
                {
                    // Same swing, still within reach
                    if state.reset_pending() {
                        ScanState::JustCommitted(next)
                    } else {
                        ScanState::Tracking(next)
                    }
                }
                ScanState::JustCommitted(_) => ScanState::Tracking(next),
                ScanState::Tracking(c) => {
                    points.push(c.index);
                    ScanState::Tracking(next)
                }
            };
        }

        let candidate = state.candidate(kind);
        if i - candidate.index > rolling_reset || i == n - 1 {
            if !state.reset_pending() || kind.beats(candidate.value, current) {
                points.push(candidate.index);
            }
            state = ScanState::NoCandidate;
        }
    }

    points
}

/// Mean gap between consecutive points, or `None` with fewer than two
fn mean_spacing(points: &[usize]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let total: f64 = points
        .windows(2)
        .map(|w| w[1] as f64 - w[0] as f64)
        .sum();
    Some(total / (points.len() - 1) as f64)
}

/// Derives a moving-average window from the rhythm of swing points
#[derive(Debug, Clone)]
pub struct AdaptiveWindowEstimator {
    config: WindowConfig,
}

impl AdaptiveWindowEstimator {
    /// Create an estimator from a validated configuration
    pub fn new(config: WindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Number of prices [`estimate`](Self::estimate) expects
    pub fn lookback(&self) -> usize {
        self.config.lookback
    }

    /// Estimate the moving-average window over exactly `lookback` prices
    ///
    /// # Errors
    /// * `MathError::InsufficientData` if `prices.len() != lookback`
    /// * `MathError::InvalidInput` if any price is not finite
    pub fn estimate(&self, prices: &[f64]) -> Result<WindowEstimate> {
        let cfg = &self.config;
        if prices.len() != cfg.lookback {
            return Err(MathError::InsufficientData(format!(
                "Window estimation needs exactly {} prices, got {}",
                cfg.lookback,
                prices.len()
            )));
        }
        if let Some(i) = prices.iter().position(|p| !p.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Price at index {} is not finite",
                i
            )));
        }

        let peaks = swing_points(
            prices,
            cfg.rolling_window,
            cfg.rolling_reset,
            SwingKind::Peak,
        );
        let troughs = swing_points(
            prices,
            cfg.rolling_window,
            cfg.rolling_reset,
            SwingKind::Trough,
        );

        let default = cfg.default_window as f64;
        let peak_spacing = mean_spacing(&peaks).unwrap_or(default);
        let trough_spacing = mean_spacing(&troughs).unwrap_or(default);

        let raw = ((peak_spacing + trough_spacing) / 2.0 * cfg.coefficient).round();
        let window = if raw.is_finite() && raw > 0.0 {
            (raw as usize).max(cfg.min_window)
        } else {
            cfg.min_window
        };

        debug!(
            peaks = peaks.len(),
            troughs = troughs.len(),
            peak_spacing,
            trough_spacing,
            window,
            "estimated adaptive window"
        );

        Ok(WindowEstimate {
            peaks,
            troughs,
            peak_spacing,
            trough_spacing,
            window,
        })
    }
}
