//! # Risk Math
//!
//! Numerical building blocks for the band strategies.
//! This crate provides the log-normal risk model (VaR and Tail-VaR), the
//! adaptive swing-point moving-average window estimator, a GARCH(1,1)
//! volatility forecast and the small indicator helpers the strategies draw on.

use thiserror::Error;

pub mod garch;
pub mod lognormal;
pub mod moving_averages;
pub mod swing;
pub mod volatility;

pub use garch::{GarchForecast, GarchModel, GarchParams};
pub use lognormal::{FitMethod, LogNormalParams};
pub use swing::{AdaptiveWindowEstimator, SwingKind, WindowConfig, WindowEstimate};

/// Errors that can occur in risk and indicator calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for risk math operations
pub type Result<T> = std::result::Result<T, MathError>;
