//! # Swing Risk
//!
//! Umbrella crate over the workspace members.
//!
//! - [`risk_math`]: log-normal VaR/Tail-VaR and the adaptive swing-point
//!   moving-average window
//! - [`band_trade`]: the band strategies, bar loading, configuration and replay
//!
//! ## Example
//!
//! ```
//! use swing_risk_workspace::risk_math::{FitMethod, LogNormalParams};
//!
//! let prices = [100.0, 102.0, 98.0, 101.0, 99.0];
//! let params = LogNormalParams::fit(&prices, FitMethod::MaximumLikelihood).unwrap();
//! let var = params.value_at_risk(0.95).unwrap();
//! let tvar = params.tail_value_at_risk(0.95).unwrap();
//! assert!(tvar >= var);
//! ```

pub use band_trade;
pub use risk_math;
