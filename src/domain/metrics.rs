//! Performance statistics derived from a run's value history.
//!
//! Returns, volatility and drawdown are computed in [`Decimal`]. The
//! fractional power in the annualized return has no exact decimal form and
//! goes through `f64`, converting back immediately; square roots use the
//! decimal-native `sqrt` from `rust_decimal`.
//!
//! Short runs extrapolate to a year with a large exponent, so the annualized
//! return can fall outside what a `Decimal` holds. It is then reported as
//! `None` rather than failing the run.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use tracing::warn;

use super::error::StatisticsError;
use super::money::{self, Amount};
use super::portfolio::ValuePoint;

/// Seconds in a Julian year (365.25 days).
pub const SECONDS_PER_YEAR: i64 = 31_557_600;

/// Outcome of a completed run. Built once; the statistics are never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_value: Amount,
    pub final_value: Amount,
    pub value_history: Vec<ValuePoint>,
    pub total_return: Decimal,
    /// `None` when the extrapolation to a year does not fit in a `Decimal`.
    pub annualized_return: Option<Decimal>,
    pub sharpe: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_amount: Amount,
}

impl BacktestResult {
    /// Derives every statistic from `value_history`; `final_value` is the
    /// post-rebalance value on the last snapshot.
    pub fn from_history(
        value_history: Vec<ValuePoint>,
        final_value: Amount,
    ) -> Result<Self, StatisticsError> {
        if value_history.len() < 2 {
            return Err(StatisticsError::InsufficientHistory {
                points: value_history.len(),
            });
        }
        let initial_value = value_history[0].value;

        let total_return = total_return(initial_value, final_value)?;
        let annualized_return = annualized_return(total_return, span_ms(&value_history))?;
        let sharpe = sharpe_ratio(&value_history)?;
        let (max_drawdown, max_drawdown_amount) = max_drawdown(&value_history)?;

        Ok(BacktestResult {
            initial_value,
            final_value,
            value_history,
            total_return,
            annualized_return,
            sharpe,
            max_drawdown,
            max_drawdown_amount,
        })
    }

    pub fn snapshots_processed(&self) -> usize {
        self.value_history.len()
    }
}

fn span_ms(history: &[ValuePoint]) -> i64 {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) => (last.time - first.time).num_milliseconds(),
        _ => 0,
    }
}

/// `(final - initial) / initial`.
pub fn total_return(initial: Amount, final_value: Amount) -> Result<Decimal, StatisticsError> {
    if initial.is_zero() {
        return Err(StatisticsError::ZeroInitialValue);
    }
    let gain = money::checked_sub(final_value.value(), initial.value())?;
    Ok(money::checked_div(gain, initial.value())?)
}

/// `(1 + total_return) ^ (year / span) - 1` for a span in milliseconds.
///
/// Only a non-positive span is an error. A figure too large for a `Decimal`
/// is `Ok(None)`.
pub fn annualized_return(
    total_return: Decimal,
    span_ms: i64,
) -> Result<Option<Decimal>, StatisticsError> {
    if span_ms <= 0 {
        return Err(StatisticsError::DegenerateTimeSpan { span_ms });
    }

    let growth = money::checked_add(Decimal::ONE, total_return)?;
    let exponent = (SECONDS_PER_YEAR as f64 * 1000.0) / span_ms as f64;
    let annualized = growth
        .to_f64()
        .map(|g| g.powf(exponent) - 1.0)
        .filter(|a| a.is_finite())
        .and_then(Decimal::from_f64);
    if annualized.is_none() {
        warn!(
            %total_return,
            span_ms,
            exponent,
            "annualized return out of decimal range"
        );
    }
    Ok(annualized)
}

/// Annualized mean / population standard deviation of per-step returns,
/// assuming a zero risk-free rate. Steps starting from a zero value are
/// skipped. Fewer than two usable returns, or zero deviation, yield zero.
pub fn sharpe_ratio(history: &[ValuePoint]) -> Result<Decimal, StatisticsError> {
    let not_representable = StatisticsError::NotRepresentable { metric: "sharpe" };

    let mut returns = Vec::with_capacity(history.len().saturating_sub(1));
    for w in history.windows(2) {
        let prev = w[0].value.value();
        if prev.is_zero() {
            continue;
        }
        let change = money::checked_sub(w[1].value.value(), prev)?;
        returns.push(money::checked_div(change, prev)?);
    }
    if returns.len() < 2 {
        return Ok(Decimal::ZERO);
    }

    let n = Decimal::from(returns.len());
    let mut sum = Decimal::ZERO;
    for r in &returns {
        sum = money::checked_add(sum, *r)?;
    }
    let mean = money::checked_div(sum, n)?;

    let mut squares = Decimal::ZERO;
    for r in &returns {
        let dev = money::checked_sub(*r, mean)?;
        squares = money::checked_add(squares, money::checked_mul(dev, dev)?)?;
    }
    let variance = money::checked_div(squares, n)?;
    let stddev = variance.sqrt().ok_or_else(|| not_representable.clone())?;
    if stddev.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let span = span_ms(history);
    if span <= 0 {
        return Err(StatisticsError::DegenerateTimeSpan { span_ms: span });
    }
    let steps = Decimal::from(history.len() - 1);
    let step_seconds = money::checked_div(
        money::checked_div(Decimal::from(span), Decimal::ONE_THOUSAND)?,
        steps,
    )?;
    let periods_per_year = money::checked_div(Decimal::from(SECONDS_PER_YEAR), step_seconds)?;
    let factor = periods_per_year.sqrt().ok_or(not_representable)?;

    let ratio = money::checked_div(mean, stddev)?;
    Ok(money::checked_mul(ratio, factor)?)
}

/// Largest fractional decline from a running peak, with its absolute amount.
pub fn max_drawdown(history: &[ValuePoint]) -> Result<(Decimal, Amount), StatisticsError> {
    let Some(first) = history.first() else {
        return Ok((Decimal::ZERO, Amount::ZERO));
    };

    let mut peak = first.value;
    let mut max_dd = Decimal::ZERO;
    let mut max_dd_amount = Amount::ZERO;

    for point in history {
        if point.value > peak {
            peak = point.value;
        } else if !peak.is_zero() {
            let decline = peak.checked_sub(point.value)?;
            let dd = money::checked_div(decline.value(), peak.value())?;
            if dd > max_dd {
                max_dd = dd;
                max_dd_amount = decline;
            }
        }
    }

    Ok((max_dd, max_dd_amount))
}
