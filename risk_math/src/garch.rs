//! GARCH(1,1) one-step volatility forecast
//!
//! Prices are turned into log-differenced returns with a constant mean. The
//! conditional variance follows
//! `s2[t] = omega + alpha * e[t-1]^2 + beta * s2[t-1]`, seeded with the sample
//! variance of the returns.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fewest prices a model can be fitted on
pub const MIN_PRICES: usize = 3;

/// Coefficients of the variance recursion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchParams {
    /// Constant term
    pub omega: f64,
    /// Weight of the last squared residual
    pub alpha: f64,
    /// Weight of the last conditional variance
    pub beta: f64,
}

impl GarchParams {
    /// Create parameters, checking stationarity
    pub fn new(omega: f64, alpha: f64, beta: f64) -> Result<Self> {
        let params = Self { omega, alpha, beta };
        params.validate()?;
        Ok(params)
    }

    /// Moment-matched parameters for returns with variance `variance`
    ///
    /// `alpha` and `beta` take typical values for daily financial returns and
    /// `omega` is chosen so the long-run variance equals `variance`.
    pub fn moment_matched(variance: f64) -> Self {
        let alpha = 0.15;
        let beta = 0.8;
        Self {
            omega: (1.0 - alpha - beta) * variance,
            alpha,
            beta,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.omega >= 0.0 && self.omega.is_finite()) {
            return Err(MathError::InvalidArgument(format!(
                "omega must be non-negative, got {}",
                self.omega
            )));
        }
        if !(self.alpha >= 0.0 && self.beta >= 0.0) {
            return Err(MathError::InvalidArgument(format!(
                "alpha and beta must be non-negative, got {} and {}",
                self.alpha, self.beta
            )));
        }
        if !(self.persistence() < 1.0) {
            return Err(MathError::InvalidArgument(format!(
                "alpha + beta must be below 1, got {}",
                self.persistence()
            )));
        }
        Ok(())
    }

    /// `alpha + beta`
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Unconditional variance `omega / (1 - alpha - beta)`
    pub fn long_run_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }
}

/// One-step-ahead forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GarchForecast {
    /// Expected log return
    pub mean: f64,
    /// Conditional standard deviation of the next log return
    pub std_dev: f64,
    /// Last price moved by the expected return
    pub price: f64,
}

/// GARCH(1,1) model fitted to a price series
#[derive(Debug, Clone)]
pub struct GarchModel {
    params: GarchParams,
    mean: f64,
    last_residual: f64,
    last_variance: f64,
    last_price: f64,
}

impl GarchModel {
    /// Fit with moment-matched parameters
    ///
    /// # Errors
    /// * `MathError::InsufficientData` with fewer than [`MIN_PRICES`] prices
    /// * `MathError::InvalidInput` if a price is not positive and finite
    pub fn fit(prices: &[f64]) -> Result<Self> {
        let returns = log_returns(prices)?;
        let variance = population_variance(&returns);
        Self::filter(prices, &returns, GarchParams::moment_matched(variance))
    }

    /// Run the variance recursion over `prices` with fixed parameters
    pub fn with_params(prices: &[f64], params: GarchParams) -> Result<Self> {
        params.validate()?;
        let returns = log_returns(prices)?;
        Self::filter(prices, &returns, params)
    }

    fn filter(prices: &[f64], returns: &[f64], params: GarchParams) -> Result<Self> {
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let mut variance = population_variance(returns);
        let mut residual = returns[0] - mean;

        for &r in &returns[1..] {
            variance = params.omega + params.alpha * residual * residual + params.beta * variance;
            residual = r - mean;
        }

        let last_price = prices[prices.len() - 1];
        debug!(
            omega = params.omega,
            alpha = params.alpha,
            beta = params.beta,
            variance,
            "garch filter done"
        );

        Ok(Self {
            params,
            mean,
            last_residual: residual,
            last_variance: variance,
            last_price,
        })
    }

    /// Get the parameters
    pub fn params(&self) -> &GarchParams {
        &self.params
    }

    /// Conditional variance of the last observed return
    pub fn last_variance(&self) -> f64 {
        self.last_variance
    }

    /// Forecast the next return
    pub fn forecast(&self) -> GarchForecast {
        let p = &self.params;
        let variance = p.omega
            + p.alpha * self.last_residual * self.last_residual
            + p.beta * self.last_variance;
        GarchForecast {
            mean: self.mean,
            std_dev: variance.max(0.0).sqrt(),
            price: self.last_price * self.mean.exp(),
        }
    }
}

/// Log-differenced prices `ln(p[i] / p[i - 1])`
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < MIN_PRICES {
        return Err(MathError::InsufficientData(format!(
            "GARCH needs at least {} prices, have {}",
            MIN_PRICES,
            prices.len()
        )));
    }
    if prices.iter().any(|&p| !(p > 0.0 && p.is_finite())) {
        return Err(MathError::InvalidInput(
            "Prices must be positive and finite".to_string(),
        ));
    }
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
