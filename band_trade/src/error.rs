//! Error types for the band_trade crate

use risk_math::MathError;
use thiserror::Error;

/// Custom error types for the band_trade crate
#[derive(Debug, Error)]
pub enum TradeError {
    /// Error related to bar data validation or loading
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid strategy parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from the numerical core
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl TradeError {
    /// True when the caller supplied too little history for this bar
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, TradeError::Math(MathError::InsufficientData(_)))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, TradeError>;
