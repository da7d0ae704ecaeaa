//! Volatility measures used to size the strategy bands
//!
//! Contains:
//! - Rolling sample standard deviation
//! - Percent-change returns and their volatility

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Rolling sample standard deviation
#[derive(Debug, Clone)]
pub struct StandardDeviation {
    period: usize,
    values: VecDeque<f64>,
}

impl StandardDeviation {
    /// Create a new StandardDeviation with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(MathError::InvalidInput(
                "Period must be at least 2 for a sample standard deviation".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Update the StandardDeviation with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Standard deviation input must be finite, got {}",
                value
            )));
        }

        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }

        Ok(())
    }

    /// Get the current standard deviation (n - 1 denominator)
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for standard deviation calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let variance = self
            .values
            .iter()
            .map(|&value| {
                let diff = value - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1.0);

        Ok(variance.sqrt())
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the StandardDeviation, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Simple returns `p[i] / p[i - 1] - 1`
pub fn percent_changes(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample standard deviation of the percent changes of `prices`
///
/// # Errors
/// * `MathError::InsufficientData` with fewer than 3 prices
/// * `MathError::InvalidInput` if a price is not positive and finite
pub fn returns_volatility(prices: &[f64]) -> Result<f64> {
    if prices.len() < 3 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 3 prices for returns volatility, have {}",
            prices.len()
        )));
    }
    if prices.iter().any(|&p| !(p > 0.0 && p.is_finite())) {
        return Err(MathError::InvalidInput(
            "Prices must be positive and finite".to_string(),
        ));
    }

    let returns = percent_changes(prices);
    let mut std_dev = StandardDeviation::new(returns.len())?;
    for r in returns {
        std_dev.update(r)?;
    }
    std_dev.value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_deviation() {
        let mut sd = StandardDeviation::new(4).unwrap();
        for v in [2.0, 4.0, 4.0, 4.0] {
            sd.update(v).unwrap();
        }
        // mean 3.5, squared deviations 2.25 + 3 * 0.25 = 3.0, / 3
        assert_relative_eq!(sd.value().unwrap(), 1.0, epsilon = 1e-12);

        sd.update(4.0).unwrap();
        assert_relative_eq!(sd.value().unwrap(), 0.0, epsilon = 1e-12);

        sd.reset();
        assert!(sd.value().is_err());
    }

    #[test]
    fn test_percent_changes() {
        let changes = percent_changes(&[100.0, 110.0, 99.0]);
        assert_eq!(changes.len(), 2);
        assert_relative_eq!(changes[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(changes[1], -0.1, epsilon = 1e-12);
        assert!(percent_changes(&[100.0]).is_empty());
    }

    #[test]
    fn test_returns_volatility() {
        // Returns 0.1 and -0.1: mean 0, sample variance 0.02
        let vol = returns_volatility(&[100.0, 110.0, 99.0]).unwrap();
        assert_relative_eq!(vol, 0.02f64.sqrt(), epsilon = 1e-12);

        assert_eq!(returns_volatility(&[5.0, 5.0, 5.0, 5.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_returns_volatility_errors() {
        assert!(matches!(
            returns_volatility(&[100.0, 101.0]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            returns_volatility(&[100.0, 0.0, 101.0]),
            Err(MathError::InvalidInput(_))
        ));
    }
}
