//! Log-normal risk model
//!
//! Fits a two-parameter log-normal distribution to a price series and answers
//! closed-form quantile queries:
//! - Value-at-Risk: the `alpha`-quantile of the fitted distribution
//! - Tail Value-at-Risk: the expected price beyond that quantile
//!
//! Both fit methods produce `sigma` as a standard deviation in log space.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use tracing::debug;

/// Parameter estimation method for [`LogNormalParams::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitMethod {
    /// Maximum likelihood on log prices
    #[default]
    #[serde(rename = "mle")]
    MaximumLikelihood,
    /// Method of moments on raw prices
    #[serde(rename = "mm")]
    MethodOfMoments,
}

/// Fitted log-normal distribution parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParams")]
pub struct LogNormalParams {
    mu: f64,
    sigma: f64,
    n: usize,
}

/// Unchecked wire form of [`LogNormalParams`]
#[derive(Deserialize)]
struct RawParams {
    mu: f64,
    sigma: f64,
    n: usize,
}

impl TryFrom<RawParams> for LogNormalParams {
    type Error = MathError;

    fn try_from(raw: RawParams) -> Result<Self> {
        Self::new(raw.mu, raw.sigma, raw.n)
    }
}

impl LogNormalParams {
    /// Create parameters directly from known values
    pub fn new(mu: f64, sigma: f64, n: usize) -> Result<Self> {
        if !mu.is_finite() {
            return Err(MathError::InvalidInput(format!("mu must be finite, got {}", mu)));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(MathError::InvalidInput(format!(
                "sigma must be finite and non-negative, got {}",
                sigma
            )));
        }
        if n < 2 {
            return Err(MathError::InvalidInput(format!(
                "Need at least 2 observations, got {}",
                n
            )));
        }

        Ok(Self { mu, sigma, n })
    }

    /// Fit the distribution to a series of strictly positive prices
    ///
    /// # Errors
    /// * `MathError::InvalidInput` if fewer than 2 prices are given or any
    ///   price is non-positive or not finite
    pub fn fit(prices: &[f64], method: FitMethod) -> Result<Self> {
        let n = prices.len();
        if n < 2 {
            return Err(MathError::InvalidInput(format!(
                "Need at least 2 prices to fit a log-normal distribution, got {}",
                n
            )));
        }
        if let Some(i) = prices.iter().position(|&p| !(p > 0.0 && p.is_finite())) {
            return Err(MathError::InvalidInput(format!(
                "Price at index {} must be positive and finite, got {}",
                i, prices[i]
            )));
        }

        let (mu, sigma) = match method {
            FitMethod::MaximumLikelihood => {
                let logs: Vec<f64> = prices.iter().map(|p| p.ln()).collect();
                let mu = logs.iter().mean();
                let variance = logs.iter().variance();
                (mu, variance.max(0.0).sqrt())
            }
            FitMethod::MethodOfMoments => {
                let y_bar = prices.iter().mean();
                let s_squared = prices.iter().variance();
                let sigma = (s_squared / (y_bar * y_bar) + 1.0).ln().max(0.0).sqrt();
                (y_bar.ln() - sigma * sigma / 2.0, sigma)
            }
        };

        if !mu.is_finite() || !sigma.is_finite() {
            return Err(MathError::CalculationError(format!(
                "Log-normal fit produced non-finite parameters (mu={}, sigma={})",
                mu, sigma
            )));
        }

        debug!(?method, mu, sigma, n, "fitted log-normal parameters");
        Ok(Self { mu, sigma, n })
    }

    /// Location parameter (mean of log prices)
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Scale parameter (standard deviation of log prices)
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Variance of log prices
    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    /// Number of observations the parameters were fitted on
    pub fn n(&self) -> usize {
        self.n
    }

    /// Median of the fitted distribution
    pub fn median(&self) -> f64 {
        self.mu.exp()
    }

    /// Mean of the fitted distribution
    pub fn mean(&self) -> f64 {
        (self.mu + self.variance() / 2.0).exp()
    }

    /// Price level not exceeded with probability `alpha`
    ///
    /// # Errors
    /// * `MathError::InvalidArgument` unless `0 < alpha < 1`
    pub fn value_at_risk(&self, alpha: f64) -> Result<f64> {
        check_alpha(alpha)?;
        let z = standard_normal()?.inverse_cdf(alpha);
        Ok((z * self.sigma + self.mu).exp())
    }

    /// Expected price given that it exceeds the `alpha` quantile
    ///
    /// Always at least [`value_at_risk`](Self::value_at_risk) for the same `alpha`.
    ///
    /// # Errors
    /// * `MathError::InvalidArgument` unless `0 < alpha < 1`
    pub fn tail_value_at_risk(&self, alpha: f64) -> Result<f64> {
        check_alpha(alpha)?;
        let normal = standard_normal()?;
        let z = normal.inverse_cdf(alpha);
        Ok(self.mean() * normal.cdf(self.sigma - z) / (1.0 - alpha))
    }
}

fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(MathError::InvalidArgument(format!(
            "alpha must be strictly between 0 and 1, got {}",
            alpha
        )))
    }
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))
}
