//! Band strategies and the vocabulary they share
//!
//! Every strategy is a pure state machine: the caller owns the state value,
//! passes it into [`BandStrategy::evaluate`] together with the bar being
//! processed, and keeps whatever state comes back for the next bar.

use crate::data::Bar;
use crate::error::Result;
use serde::Serialize;
use std::fmt::Debug;

pub mod adaptive_ma;
pub mod var_band;

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    /// Buy (enter long or cover a short)
    Buy,
    /// Sell (reduce a long or enter short)
    Sell,
}

/// Why a strategy asked for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Reason {
    /// Bar high cleared the tail VaR
    StrongSell,
    /// Bar low fell under the lower VaR quantile
    VarBuy,
    /// Bar high cleared the upper VaR quantile
    VarSell,
    /// Price crossed above the upper moving-average band
    EnterLong,
    /// Price crossed below the lower moving-average band
    EnterShort,
    /// Gain since entry exceeded the take-profit level
    TakeProfit,
    /// Price retreated from its water mark by the trailing stop
    TrailingStop,
    /// Price crossed back through the exit band
    BandExit,
    /// Previous exit did not fill completely
    RetryLiquidation,
}

impl Reason {
    /// True for reasons that close an open position
    pub fn is_exit(self) -> bool {
        matches!(
            self,
            Reason::TakeProfit | Reason::TrailingStop | Reason::BandExit | Reason::RetryLiquidation
        )
    }
}

/// Order request produced by an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderIntent {
    /// Direction
    pub side: Side,
    /// Share of the sizing base: available cash when opening, held quantity when reducing
    pub fraction: f64,
    /// Limit price; `None` for a market order
    pub limit_price: Option<f64>,
}

impl OrderIntent {
    /// Market order for the given share
    pub fn market(side: Side, fraction: f64) -> Self {
        Self {
            side,
            fraction,
            limit_price: None,
        }
    }

    /// Limit order for the given share
    pub fn limit(side: Side, fraction: f64, price: f64) -> Self {
        Self {
            side,
            fraction,
            limit_price: Some(price),
        }
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Decision {
    /// Do nothing this bar
    Hold,
    /// Submit an order
    Submit {
        /// The order
        intent: OrderIntent,
        /// Why it was requested
        reason: Reason,
    },
}

impl Decision {
    /// Reason of a submitted order
    pub fn reason(&self) -> Option<Reason> {
        match self {
            Decision::Hold => None,
            Decision::Submit { reason, .. } => Some(*reason),
        }
    }
}

/// Execution report fed back into a strategy state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Reason of the order that filled
    pub reason: Reason,
    /// Direction
    pub side: Side,
    /// Fill price
    pub price: f64,
    /// False when only part of the requested quantity filled
    pub complete: bool,
}

/// Inputs of one evaluation
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    /// Closing prices strictly before `bar`, oldest first
    pub closes: &'a [f64],
    /// Bar being processed
    pub bar: &'a Bar,
    /// Absolute notional currently held in the instrument
    pub exposure: f64,
}

/// Common interface of the band strategies
pub trait BandStrategy {
    /// Memory carried from one bar to the next
    type State: Clone + Default + Debug;

    /// Name of the strategy
    fn name(&self) -> &str;

    /// Minimum number of past closes in [`BarContext::closes`] before a bar can be evaluated
    fn history_len(&self) -> usize;

    /// Evaluate one bar
    fn evaluate(
        &self,
        state: Self::State,
        ctx: &BarContext<'_>,
    ) -> Result<(Self::State, Decision)>;

    /// Fold an execution report into the state
    fn on_fill(&self, state: Self::State, fill: &Fill) -> Self::State;
}

/// The last `n` values of `values` (all of them if fewer)
pub(crate) fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}
