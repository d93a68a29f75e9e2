//! The strategy contract and the strategies shipped with the crate.

use rust_decimal::Decimal;

use super::action::Action;
use super::error::StrategyError;
use super::money::Amount;
use super::portfolio::Portfolio;
use super::position::SpotPosition;
use super::snapshot::{MarketSnapshot, PairKey};

/// Decides what to do with a portfolio at each snapshot.
///
/// `rebalance` sees the portfolio read-only; the returned actions are the
/// only way a strategy changes it. It must not have side effects outside the
/// actions it returns (the engine does not check this).
pub trait Strategy {
    fn name(&self) -> &str {
        "unnamed"
    }

    fn rebalance(
        &mut self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
    ) -> Result<Vec<Action>, StrategyError>;
}

impl std::fmt::Debug for dyn Strategy + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name()).finish()
    }
}

/// Never acts. The portfolio keeps its initial cash for the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hold;

impl Strategy for Hold {
    fn name(&self) -> &str {
        "hold"
    }

    fn rebalance(
        &mut self,
        _portfolio: &Portfolio,
        _snapshot: &MarketSnapshot,
    ) -> Result<Vec<Action>, StrategyError> {
        Ok(Vec::new())
    }
}

/// Spends `allocation` of the cash balance on one spot position the first
/// time it runs, then holds.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    pub pair: PairKey,
    pub allocation: Decimal,
    pub position_id: String,
}

impl BuyAndHold {
    pub fn new(pair: PairKey, allocation: Decimal) -> Self {
        let position_id = format!("spot:{pair}");
        BuyAndHold {
            pair,
            allocation,
            position_id,
        }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn rebalance(
        &mut self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
    ) -> Result<Vec<Action>, StrategyError> {
        if portfolio.has_position(&self.position_id) {
            return Ok(Vec::new());
        }
        if portfolio.cash() <= Decimal::ZERO {
            return Err(StrategyError::Rejected(format!(
                "no cash to allocate to {}",
                self.pair
            )));
        }

        let budget = Amount::new(portfolio.cash())?.scale(self.allocation)?;
        let price = snapshot.price(&self.pair)?;
        let quantity = budget.convert_at(price)?;

        Ok(vec![Action::Batch(vec![
            Action::adjust_cash(-budget.value(), format!("buy {}", self.pair)),
            Action::add(SpotPosition::new(
                self.position_id.clone(),
                self.pair.clone(),
                quantity,
            )),
        ])])
    }
}

/// Adapts a closure into a [`Strategy`].
pub struct FnStrategy<F> {
    name: String,
    decide: F,
}

impl<F> FnStrategy<F>
where
    F: FnMut(&Portfolio, &MarketSnapshot) -> Result<Vec<Action>, StrategyError>,
{
    pub fn new(name: impl Into<String>, decide: F) -> Self {
        FnStrategy {
            name: name.into(),
            decide,
        }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: FnMut(&Portfolio, &MarketSnapshot) -> Result<Vec<Action>, StrategyError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn rebalance(
        &mut self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
    ) -> Result<Vec<Action>, StrategyError> {
        (self.decide)(portfolio, snapshot)
    }
}
