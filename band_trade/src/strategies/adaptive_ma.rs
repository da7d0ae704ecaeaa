//! Adaptive moving-average band strategy
//!
//! The moving-average window follows the rhythm of recent swing points. Two
//! volatility-scaled envelopes sit around the average: the entry band opens a
//! long on an upward cross of `ma * (1 + entry)` or a short on a downward
//! cross of `ma / (1 + entry)`, and the narrower exit band closes the
//! position when price falls back through it. Optional take-profit and
//! trailing-stop exits take precedence over the band exit.
//!
//! Band volatility is either the sample deviation of recent returns or a
//! GARCH(1,1) one-step forecast over the same closes.

use crate::error::{Result, TradeError};
use crate::strategies::{
    tail, BandStrategy, BarContext, Decision, Fill, OrderIntent, Reason, Side,
};
use risk_math::moving_averages::trailing_mean;
use risk_math::volatility::returns_volatility;
use risk_math::{
    AdaptiveWindowEstimator, GarchModel, MathError, WindowConfig, WindowEstimate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Volatility estimate the band widths scale with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilitySource {
    /// Sample standard deviation of percent changes
    #[default]
    Returns,
    /// GARCH(1,1) forecast standard deviation of the next log return
    Garch,
}

/// Parameters of the adaptive moving-average strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveMaConfig {
    /// Swing-point window estimation
    pub window: WindowConfig,
    /// How band volatility is estimated
    pub volatility_source: VolatilitySource,
    /// Closes used for the entry band volatility
    pub volatility_lookback: usize,
    /// Entry band width per unit of returns volatility
    pub volatility_coefficient: f64,
    /// Closes used for the exit band volatility
    pub close_volatility_lookback: usize,
    /// Exit band width per unit of returns volatility
    pub close_volatility_coefficient: f64,
    /// Relative gain since entry that closes the position
    pub take_profit: Option<f64>,
    /// Relative retreat from the water mark that closes the position
    pub trailing_stop: Option<f64>,
    /// Exposure above which the strategy considers itself invested
    pub min_exposure: f64,
}

impl Default for AdaptiveMaConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            volatility_source: VolatilitySource::Returns,
            volatility_lookback: 5,
            volatility_coefficient: 0.5,
            close_volatility_lookback: 20,
            close_volatility_coefficient: 0.05,
            take_profit: None,
            trailing_stop: None,
            min_exposure: 10.0,
        }
    }
}

impl AdaptiveMaConfig {
    /// Check every field against its valid range
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;

        for (name, lookback) in [
            ("volatility_lookback", self.volatility_lookback),
            ("close_volatility_lookback", self.close_volatility_lookback),
        ] {
            if lookback < 3 || lookback > self.window.lookback {
                return Err(TradeError::InvalidParameter(format!(
                    "{} must be between 3 and {}, got {}",
                    name, self.window.lookback, lookback
                )));
            }
        }

        for (name, coefficient) in [
            ("volatility_coefficient", self.volatility_coefficient),
            ("close_volatility_coefficient", self.close_volatility_coefficient),
        ] {
            if !(coefficient > 0.0 && coefficient.is_finite()) {
                return Err(TradeError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, coefficient
                )));
            }
        }

        for (name, level) in [
            ("take_profit", self.take_profit),
            ("trailing_stop", self.trailing_stop),
        ] {
            if let Some(level) = level {
                if !(level > 0.0 && level < 1.0) {
                    return Err(TradeError::InvalidParameter(format!(
                        "{} must be between 0 and 1, got {}",
                        name, level
                    )));
                }
            }
        }

        if !(self.min_exposure >= 0.0 && self.min_exposure.is_finite()) {
            return Err(TradeError::InvalidParameter(format!(
                "min_exposure must be non-negative, got {}",
                self.min_exposure
            )));
        }

        Ok(())
    }
}

/// Where the last price sat relative to a band line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinePosition {
    /// Price on or beyond the line on its outer side
    Above,
    /// Price on the inner side of the line
    Below,
}

/// Direction of the most recent entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PositionSide {
    /// No entry yet
    #[default]
    Flat,
    /// Entered through the upper band
    Long,
    /// Entered through the lower band
    Short,
}

/// Memory of the adaptive MA strategy
#[derive(Debug, Clone, PartialEq)]
pub struct MaBandState {
    /// Price position against the upper entry line on the previous bar
    pub upper_line: Option<LinePosition>,
    /// Price position against the lower entry line on the previous bar
    pub lower_line: Option<LinePosition>,
    /// Direction of the last entry
    pub side: PositionSide,
    /// Price of the last entry, 0 before any entry
    pub entry_price: f64,
    /// Highest price seen while invested
    pub high_water: f64,
    /// Lowest price seen while invested
    pub low_water: f64,
    /// A previous exit did not fully fill
    pub liquidating: bool,
}

impl Default for MaBandState {
    fn default() -> Self {
        Self {
            upper_line: None,
            lower_line: None,
            side: PositionSide::Flat,
            entry_price: 0.0,
            high_water: 0.0,
            low_water: f64::INFINITY,
            liquidating: false,
        }
    }
}

impl MaBandState {
    /// Mark the last exit as partially filled
    pub fn exit_incomplete(mut self) -> Self {
        self.liquidating = true;
        self
    }

    fn enter(&mut self, side: PositionSide, price: f64) {
        self.side = side;
        self.entry_price = price;
        self.high_water = price;
        self.low_water = price;
    }
}

/// Moving average and band widths computed for one bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaBands {
    /// Window estimate the average was computed with
    pub estimate: WindowEstimate,
    /// Closes actually averaged
    pub window: usize,
    /// Moving average
    pub ma: f64,
    /// Relative width of the entry band
    pub entry_band: f64,
    /// Relative width of the exit band
    pub exit_band: f64,
}

impl MaBands {
    /// Upper entry line
    pub fn upper_entry(&self) -> f64 {
        self.ma * (1.0 + self.entry_band)
    }

    /// Lower entry line
    pub fn lower_entry(&self) -> f64 {
        self.ma / (1.0 + self.entry_band)
    }

    /// Exit line of a long position
    pub fn long_exit(&self) -> f64 {
        self.ma * (1.0 + self.exit_band)
    }

    /// Exit line of a short position
    pub fn short_exit(&self) -> f64 {
        self.ma / (1.0 + self.exit_band)
    }
}

/// Adaptive moving-average band strategy
#[derive(Debug, Clone)]
pub struct AdaptiveMaStrategy {
    config: AdaptiveMaConfig,
    estimator: AdaptiveWindowEstimator,
}

impl AdaptiveMaStrategy {
    /// Create a strategy from a validated configuration
    pub fn new(config: AdaptiveMaConfig) -> Result<Self> {
        config.validate()?;
        let estimator = AdaptiveWindowEstimator::new(config.window.clone())?;
        Ok(Self { config, estimator })
    }

    /// Get the configuration
    pub fn config(&self) -> &AdaptiveMaConfig {
        &self.config
    }

    /// Compute the moving average and both band widths from past closes
    ///
    /// Needs at least `window.lookback` closes. When the estimated window is
    /// longer than the history at hand the whole history is averaged.
    pub fn bands(&self, closes: &[f64]) -> Result<MaBands> {
        let lookback = self.estimator.lookback();
        if closes.len() < lookback {
            return Err(MathError::InsufficientData(format!(
                "Adaptive MA needs {} closes, have {}",
                lookback,
                closes.len()
            ))
            .into());
        }

        let estimate = self.estimator.estimate(tail(closes, lookback))?;
        let window = estimate.window.min(closes.len());
        if window < estimate.window {
            debug!(
                estimated = estimate.window,
                available = closes.len(),
                "moving-average window clamped to available history"
            );
        }
        let ma = trailing_mean(closes, window)?;

        let entry_band = self.volatility(closes, self.config.volatility_lookback)?
            * self.config.volatility_coefficient;
        let exit_band = self.volatility(closes, self.config.close_volatility_lookback)?
            * self.config.close_volatility_coefficient;

        Ok(MaBands {
            estimate,
            window,
            ma,
            entry_band,
            exit_band,
        })
    }

    /// Volatility of the last `lookback` closes
    fn volatility(&self, closes: &[f64], lookback: usize) -> Result<f64> {
        let closes = tail(closes, lookback);
        let vol = match self.config.volatility_source {
            VolatilitySource::Returns => returns_volatility(closes)?,
            VolatilitySource::Garch => GarchModel::fit(closes)?.forecast().std_dev,
        };
        Ok(vol)
    }

    /// Order that flattens the current position
    fn liquidate(side: PositionSide, reason: Reason) -> Decision {
        let side = match side {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
            PositionSide::Flat => return Decision::Hold,
        };
        Decision::Submit {
            intent: OrderIntent::market(side, 1.0),
            reason,
        }
    }

    /// Exit checks while a position is open
    fn manage_position(&self, state: &mut MaBandState, bands: &MaBands, price: f64) -> Decision {
        state.high_water = state.high_water.max(price);
        state.low_water = state.low_water.min(price);

        if state.liquidating {
            return Self::liquidate(state.side, Reason::RetryLiquidation);
        }

        if let Some(level) = self.config.take_profit {
            if state.entry_price > 0.0 {
                let gain = match state.side {
                    PositionSide::Long => price / state.entry_price - 1.0,
                    PositionSide::Short => 1.0 - price / state.entry_price,
                    PositionSide::Flat => 0.0,
                };
                if gain > level {
                    return Self::liquidate(state.side, Reason::TakeProfit);
                }
            }
        }

        if let Some(level) = self.config.trailing_stop {
            let stopped = match state.side {
                PositionSide::Long => price / state.high_water < 1.0 - level,
                PositionSide::Short => price / state.low_water > 1.0 + level,
                PositionSide::Flat => false,
            };
            if stopped {
                return Self::liquidate(state.side, Reason::TrailingStop);
            }
        }

        let crossed_back = match state.side {
            PositionSide::Long => price <= bands.long_exit(),
            PositionSide::Short => price >= bands.short_exit(),
            PositionSide::Flat => false,
        };
        if crossed_back {
            Self::liquidate(state.side, Reason::BandExit)
        } else {
            Decision::Hold
        }
    }

    /// Entry checks while flat
    fn seek_entry(state: &mut MaBandState, bands: &MaBands, price: f64) -> Decision {
        state.liquidating = false;

        if state.upper_line == Some(LinePosition::Below) && price >= bands.upper_entry() {
            state.enter(PositionSide::Long, price);
            Decision::Submit {
                intent: OrderIntent::market(Side::Buy, 1.0),
                reason: Reason::EnterLong,
            }
        } else if state.lower_line == Some(LinePosition::Above) && price <= bands.lower_entry() {
            state.enter(PositionSide::Short, price);
            Decision::Submit {
                intent: OrderIntent::market(Side::Sell, 1.0),
                reason: Reason::EnterShort,
            }
        } else {
            Decision::Hold
        }
    }
}

impl BandStrategy for AdaptiveMaStrategy {
    type State = MaBandState;

    fn name(&self) -> &str {
        "Adaptive MA Band"
    }

    fn history_len(&self) -> usize {
        self.estimator.lookback()
    }

    fn evaluate(
        &self,
        mut state: MaBandState,
        ctx: &BarContext<'_>,
    ) -> Result<(MaBandState, Decision)> {
        let bands = self.bands(ctx.closes)?;
        let price = ctx.bar.close;
        debug!(
            window = bands.window,
            ma = bands.ma,
            entry_band = bands.entry_band,
            exit_band = bands.exit_band,
            price,
            "adaptive ma bands"
        );

        let decision = if ctx.exposure > self.config.min_exposure {
            self.manage_position(&mut state, &bands, price)
        } else {
            Self::seek_entry(&mut state, &bands, price)
        };

        state.upper_line = Some(if price >= bands.upper_entry() {
            LinePosition::Above
        } else {
            LinePosition::Below
        });
        state.lower_line = Some(if price <= bands.lower_entry() {
            LinePosition::Below
        } else {
            LinePosition::Above
        });

        if let Some(reason) = decision.reason() {
            info!(
                ?reason,
                price,
                ma = bands.ma,
                at = %ctx.bar.timestamp,
                "adaptive ma signal triggered"
            );
        }

        Ok((state, decision))
    }

    fn on_fill(&self, state: MaBandState, fill: &Fill) -> MaBandState {
        if fill.reason.is_exit() && !fill.complete {
            state.exit_incomplete()
        } else {
            state
        }
    }
}
