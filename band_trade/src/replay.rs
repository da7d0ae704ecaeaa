//! Bar-by-bar replay of a band strategy
//!
//! Drives a [`BandStrategy`] over historical bars so its state can be
//! inspected. Every submitted order is assumed to fill completely at its
//! reference price (the limit price, or the bar close for market orders)
//! against a paper balance. Only the quantity held is tracked, to feed the
//! exposure back into the next evaluation.

use crate::data::{closes, Bar};
use crate::error::{Result, TradeError};
use crate::strategies::{
    BandStrategy, BarContext, Decision, Fill, OrderIntent, Reason, Side,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Counts collected over one replay
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    /// Strategy name
    pub strategy: String,
    /// Bars the strategy evaluated
    pub evaluated: usize,
    /// Bars skipped for lack of history
    pub skipped: usize,
    /// Non-hold decisions by reason
    pub decisions: BTreeMap<Reason, usize>,
    /// Orders that moved the paper position
    pub fills: usize,
    /// Signed quantity held after the last bar
    pub final_quantity: f64,
    /// Absolute notional held at the last close
    pub final_exposure: f64,
}

/// Paper balance the fills are applied to
#[derive(Debug, Clone, Copy)]
struct PaperBook {
    cash: f64,
    quantity: f64,
}

impl PaperBook {
    /// Quantity traded for `intent` at `price`; negative sells
    ///
    /// Reducing orders size against the held quantity, opening orders against
    /// cash. Only an explicit short entry may sell from a flat book.
    fn order_quantity(&self, intent: &OrderIntent, reason: Reason, price: f64) -> f64 {
        match intent.side {
            Side::Buy if self.quantity < 0.0 => -self.quantity * intent.fraction,
            Side::Buy => (self.cash.max(0.0) * intent.fraction) / price,
            Side::Sell if self.quantity > 0.0 => -self.quantity * intent.fraction,
            Side::Sell if reason == Reason::EnterShort => {
                -(self.cash.max(0.0) * intent.fraction) / price
            }
            Side::Sell => 0.0,
        }
    }

    fn apply(&mut self, quantity: f64, price: f64) {
        self.cash -= quantity * price;
        self.quantity += quantity;
    }
}

/// Replay `strategy` over `bars` starting from `notional` in paper cash
///
/// Bar `i` is evaluated with the closes of bars `0..i`. Bars with fewer than
/// `history_len` prior closes, and bars the strategy rejects for lack of
/// data, are counted as skipped.
pub fn replay<S: BandStrategy>(
    strategy: &S,
    bars: &[Bar],
    notional: f64,
) -> Result<ReplaySummary> {
    if !(notional > 0.0 && notional.is_finite()) {
        return Err(TradeError::InvalidParameter(format!(
            "Notional must be positive, got {}",
            notional
        )));
    }

    let closes = closes(bars);
    let mut book = PaperBook {
        cash: notional,
        quantity: 0.0,
    };
    let mut state = S::State::default();
    let mut summary = ReplaySummary {
        strategy: strategy.name().to_string(),
        ..ReplaySummary::default()
    };

    for (i, bar) in bars.iter().enumerate() {
        if i < strategy.history_len() {
            summary.skipped += 1;
            continue;
        }

        let ctx = BarContext {
            closes: &closes[..i],
            bar,
            exposure: book.quantity.abs() * bar.close,
        };
        let (next, decision) = match strategy.evaluate(state.clone(), &ctx) {
            Ok(outcome) => outcome,
            Err(e) if e.is_insufficient_data() => {
                debug!(at = %bar.timestamp, error = %e, "bar skipped");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        state = next;
        summary.evaluated += 1;

        if let Decision::Submit { intent, reason } = decision {
            *summary.decisions.entry(reason).or_insert(0) += 1;

            let price = intent.limit_price.unwrap_or(bar.close);
            let quantity = book.order_quantity(&intent, reason, price);
            if quantity != 0.0 {
                book.apply(quantity, price);
                summary.fills += 1;
                let fill = Fill {
                    reason,
                    side: intent.side,
                    price,
                    complete: true,
                };
                state = strategy.on_fill(state, &fill);
            }
        }
    }

    summary.final_quantity = book.quantity;
    summary.final_exposure = bars
        .last()
        .map_or(0.0, |bar| book.quantity.abs() * bar.close);

    debug!(?summary, "replay finished");
    Ok(summary)
}
