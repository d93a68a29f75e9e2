//! Backtest engine and event loop.
//!
//! For each snapshot, in order: check for cancellation, value the portfolio
//! and record it, ask the strategy for actions, apply them. The value recorded
//! for a snapshot is the one the strategy saw before acting; the final value
//! is taken after the last snapshot's actions have been applied.

use tracing::{debug, info, warn};

use super::cancel::CancellationToken;
use super::error::BacktestError;
use super::metrics::BacktestResult;
use super::money::Amount;
use super::portfolio::{Portfolio, ValuePoint};
use super::snapshot::MarketSnapshot;
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: Amount,
}

/// Drives one strategy over a snapshot sequence. Each call to [`run`](Self::run)
/// starts from a fresh portfolio holding `initial_cash`.
pub struct BacktestEngine {
    config: BacktestConfig,
    strategy: Option<Box<dyn Strategy>>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        BacktestEngine {
            config,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(
        &mut self,
        cancel: &CancellationToken,
        snapshots: &[MarketSnapshot],
    ) -> Result<BacktestResult, BacktestError> {
        let strategy = self
            .strategy
            .as_deref_mut()
            .ok_or(BacktestError::MissingStrategy)?;
        let (last_index, last_snapshot) = match snapshots.len() {
            0 => return Err(BacktestError::NoSnapshots),
            n => (n - 1, &snapshots[n - 1]),
        };

        info!(
            strategy = strategy.name(),
            snapshots = snapshots.len(),
            initial_cash = %self.config.initial_cash,
            "starting backtest"
        );

        let mut portfolio = Portfolio::new(self.config.initial_cash);
        let mut value_history = Vec::with_capacity(snapshots.len());

        for (index, snapshot) in snapshots.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(index, "backtest cancelled");
                return Err(BacktestError::Cancelled { index });
            }

            let value = portfolio
                .value(snapshot)
                .map_err(|source| abort(BacktestError::Valuation { index, source }))?;
            value_history.push(ValuePoint {
                time: snapshot.time(),
                value,
            });

            let actions = strategy
                .rebalance(&portfolio, snapshot)
                .map_err(|source| abort(BacktestError::Strategy { index, source }))?;
            debug!(
                index,
                time = %snapshot.time(),
                value = %value,
                actions = actions.len(),
                "processed snapshot"
            );

            for (action_index, action) in actions.iter().enumerate() {
                debug!(index, action = %action, "applying action");
                action.apply(&mut portfolio).map_err(|source| {
                    abort(BacktestError::Action {
                        index,
                        action: action_index,
                        source,
                    })
                })?;
            }
        }

        let final_value = portfolio.value(last_snapshot).map_err(|source| {
            abort(BacktestError::Valuation {
                index: last_index,
                source,
            })
        })?;

        let result = BacktestResult::from_history(value_history, final_value)
            .map_err(|e| abort(BacktestError::Statistics(e)))?;

        info!(
            final_value = %result.final_value,
            total_return = %result.total_return,
            sharpe = %result.sharpe,
            max_drawdown = %result.max_drawdown,
            "backtest complete"
        );
        Ok(result)
    }
}

fn abort(err: BacktestError) -> BacktestError {
    warn!(error = %err, "backtest aborted");
    err
}
