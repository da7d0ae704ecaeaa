//! # Band Trade
//!
//! Band strategies on top of the `risk_math` numerical core.
//!
//! ## Features
//!
//! - VaR band strategy: limit orders at log-normal quantiles of recent closes
//! - Adaptive MA band strategy: volatility bands around a moving average whose
//!   window follows the spacing of swing points, with returns or GARCH
//!   volatility
//! - OHLCV bars and CSV loading
//! - TOML configuration with validated defaults
//! - Bar-by-bar replay driving either strategy
//!
//! ## Quick Start
//!
//! ```no_run
//! use band_trade::data::load_bars_csv;
//! use band_trade::replay::replay;
//! use band_trade::strategies::var_band::{VarBandConfig, VarBandStrategy};
//!
//! # fn main() -> band_trade::Result<()> {
//! let bars = load_bars_csv("bars.csv")?;
//! let strategy = VarBandStrategy::new(VarBandConfig::default())?;
//! let summary = replay(&strategy, &bars, 10_000.0)?;
//! println!("{} bars evaluated", summary.evaluated);
//! # Ok(())
//! # }
//! ```
//!
//! Strategies never hold state themselves: each evaluation takes the previous
//! state by value and returns the next one with its decision.

pub mod config;
pub mod data;
pub mod error;
pub mod replay;
pub mod strategies;

pub use data::Bar;
pub use error::{Result, TradeError};
pub use strategies::adaptive_ma::{
    AdaptiveMaConfig, AdaptiveMaStrategy, MaBandState, VolatilitySource,
};
pub use strategies::var_band::{VarBandConfig, VarBandState, VarBandStrategy};
pub use strategies::{BandStrategy, BarContext, Decision, Fill, OrderIntent, Reason, Side};
