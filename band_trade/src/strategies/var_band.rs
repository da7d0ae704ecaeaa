//! Log-normal VaR band strategy
//!
//! Fits a log-normal distribution to recent closes and places limit orders at
//! its quantiles: buy under the lower VaR, trim over the upper VaR, and trim
//! harder over the tail VaR. The last buy and sell fill prices keep the
//! strategy from chasing its own fills.

use crate::error::{Result, TradeError};
use crate::strategies::{
    tail, BandStrategy, BarContext, Decision, Fill, OrderIntent, Reason, Side,
};
use risk_math::{FitMethod, LogNormalParams, MathError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters of the VaR band strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarBandConfig {
    /// Number of past closes the distribution is fitted on
    pub history_len: usize,
    /// Quantile level of the upper band; the lower band uses `1 - confidence`
    pub confidence: f64,
    /// Parameter estimation method
    pub fit_method: FitMethod,
    /// Share of the position sold over the upper band
    pub sell_fraction: f64,
    /// Share of the position sold over the tail band
    pub strong_sell_fraction: f64,
}

impl Default for VarBandConfig {
    fn default() -> Self {
        Self {
            history_len: 50,
            confidence: 0.8,
            fit_method: FitMethod::MaximumLikelihood,
            sell_fraction: 0.75,
            strong_sell_fraction: 0.9,
        }
    }
}

impl VarBandConfig {
    /// Check every field against its valid range
    pub fn validate(&self) -> Result<()> {
        if self.history_len < 2 {
            return Err(TradeError::InvalidParameter(format!(
                "history_len must be at least 2, got {}",
                self.history_len
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(TradeError::InvalidParameter(format!(
                "confidence must be between 0 and 1, got {}",
                self.confidence
            )));
        }
        for (name, value) in [
            ("sell_fraction", self.sell_fraction),
            ("strong_sell_fraction", self.strong_sell_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(TradeError::InvalidParameter(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Prices of the most recent fills on each side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarBandState {
    /// Last buy fill price, 0 before any buy
    pub recent_buy_price: f64,
    /// Last sell fill price, +inf before any sell
    pub recent_sell_price: f64,
}

impl Default for VarBandState {
    fn default() -> Self {
        Self {
            recent_buy_price: 0.0,
            recent_sell_price: f64::INFINITY,
        }
    }
}

/// Band levels computed for one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarBands {
    /// `VaR(1 - confidence)`
    pub lower: f64,
    /// `VaR(confidence)`
    pub upper: f64,
    /// `TVaR(confidence)`
    pub tail: f64,
}

/// Log-normal VaR band strategy
#[derive(Debug, Clone)]
pub struct VarBandStrategy {
    config: VarBandConfig,
}

impl VarBandStrategy {
    /// Create a strategy from a validated configuration
    pub fn new(config: VarBandConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &VarBandConfig {
        &self.config
    }

    /// Fit the distribution to the last `history_len` closes and compute the bands
    pub fn bands(&self, closes: &[f64]) -> Result<VarBands> {
        let history = tail(closes, self.config.history_len);
        if history.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "VaR bands need at least 2 closes, have {}",
                history.len()
            ))
            .into());
        }

        let params = LogNormalParams::fit(history, self.config.fit_method)?;
        let confidence = self.config.confidence;
        Ok(VarBands {
            lower: params.value_at_risk(1.0 - confidence)?,
            upper: params.value_at_risk(confidence)?,
            tail: params.tail_value_at_risk(confidence)?,
        })
    }
}

impl BandStrategy for VarBandStrategy {
    type State = VarBandState;

    fn name(&self) -> &str {
        "VaR Band"
    }

    fn history_len(&self) -> usize {
        self.config.history_len
    }

    fn evaluate(
        &self,
        state: VarBandState,
        ctx: &BarContext<'_>,
    ) -> Result<(VarBandState, Decision)> {
        let bands = self.bands(ctx.closes)?;
        let bar = ctx.bar;
        debug!(?bands, high = bar.high, low = bar.low, "var bands");

        let cfg = &self.config;
        let decision = if bar.high > bands.tail && state.recent_buy_price < bands.tail {
            Decision::Submit {
                intent: OrderIntent::limit(Side::Sell, cfg.strong_sell_fraction, bands.tail),
                reason: Reason::StrongSell,
            }
        } else if bar.low < bands.lower && state.recent_sell_price > bands.lower {
            Decision::Submit {
                intent: OrderIntent::limit(Side::Buy, 1.0, bands.lower),
                reason: Reason::VarBuy,
            }
        } else if bar.high > bands.upper && state.recent_buy_price < bands.upper {
            Decision::Submit {
                intent: OrderIntent::limit(Side::Sell, cfg.sell_fraction, bands.upper),
                reason: Reason::VarSell,
            }
        } else {
            Decision::Hold
        };

        if let Some(reason) = decision.reason() {
            info!(?reason, at = %bar.timestamp, "var band signal triggered");
        }

        Ok((state, decision))
    }

    fn on_fill(&self, mut state: VarBandState, fill: &Fill) -> VarBandState {
        match fill.side {
            Side::Buy => state.recent_buy_price = fill.price,
            Side::Sell => state.recent_sell_price = fill.price,
        }
        state
    }
}
