//! Portfolio state: a cash balance plus a keyed set of positions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{ActionError, MoneyError, ValuationError};
use super::money::{self, Amount};
use super::position::Position;
use super::snapshot::MarketSnapshot;

/// One recorded portfolio value, taken before the strategy acted on that snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePoint {
    pub time: DateTime<Utc>,
    pub value: Amount,
}

/// Cash may go negative (borrowing/leverage); position ids are unique.
///
/// Cloning is cheap: positions are shared behind `Arc`, so a clone is an
/// independent copy of the position set that can be mutated and swapped in.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    cash: Decimal,
    positions: BTreeMap<String, Arc<dyn Position>>,
}

impl Portfolio {
    pub fn new(initial_cash: Amount) -> Self {
        Portfolio {
            cash: initial_cash.value(),
            positions: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn has_position(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get_position(&self, id: &str) -> Option<Arc<dyn Position>> {
        self.positions.get(id).cloned()
    }

    /// A copy of the current position list, in id order.
    pub fn positions(&self) -> Vec<Arc<dyn Position>> {
        self.positions.values().cloned().collect()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn add_position(&mut self, position: Arc<dyn Position>) -> Result<(), ActionError> {
        let id = position.id().to_string();
        if self.positions.contains_key(&id) {
            return Err(ActionError::DuplicatePosition { id });
        }
        self.positions.insert(id, position);
        Ok(())
    }

    pub fn remove_position(&mut self, id: &str) -> Result<Arc<dyn Position>, ActionError> {
        self.positions
            .remove(id)
            .ok_or_else(|| ActionError::PositionNotFound { id: id.to_string() })
    }

    /// Remove `old_id`, then add `position`.
    ///
    /// Not transactional: if the add fails (the new id collides with another
    /// position) the removed position stays removed.
    pub fn replace_position(
        &mut self,
        old_id: &str,
        position: Arc<dyn Position>,
    ) -> Result<(), ActionError> {
        self.remove_position(old_id)?;
        self.add_position(position)
    }

    /// Adds `delta` to cash. The sign of `delta` never causes a failure.
    pub fn adjust_cash(&mut self, delta: Decimal) -> Result<(), MoneyError> {
        self.cash = money::checked_add(self.cash, delta)?;
        Ok(())
    }

    /// Signed total: cash plus every position's value. Any position failing
    /// to value fails the whole valuation.
    pub fn net_value(&self, snapshot: &MarketSnapshot) -> Result<Decimal, ValuationError> {
        let mut total = self.cash;
        for position in self.positions.values() {
            let value = position.value(snapshot)?;
            total = money::checked_add(total, value.value())?;
        }
        Ok(total)
    }

    /// Total value as an [`Amount`]; a negative net value is a valuation failure.
    pub fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount, ValuationError> {
        let net = self.net_value(snapshot)?;
        Amount::new(net).map_err(|_| ValuationError::NegativePortfolioValue { value: net })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use crate::domain::position::SpotPosition;
    use crate::domain::snapshot::PairKey;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn spot(id: &str, qty: Decimal) -> Arc<dyn Position> {
        Arc::new(SpotPosition::new(
            id,
            PairKey::new("ETH", "USDC"),
            Amount::new(qty).unwrap(),
        ))
    }

    fn snapshot(price: Decimal) -> MarketSnapshot {
        MarketSnapshot::builder(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
            .price(PairKey::new("ETH", "USDC"), Price::new(price).unwrap())
            .build()
    }

    fn portfolio(cash: Decimal) -> Portfolio {
        Portfolio::new(Amount::new(cash).unwrap())
    }

    #[test]
    fn new_portfolio() {
        let p = portfolio(dec!(10000));
        assert_eq!(p.cash(), dec!(10000));
        assert_eq!(p.position_count(), 0);
        assert!(p.positions().is_empty());
    }

    #[test]
    fn add_and_get_position() {
        let mut p = portfolio(dec!(10000));
        p.add_position(spot("p1", dec!(1))).unwrap();
        assert!(p.has_position("p1"));
        assert_eq!(p.get_position("p1").unwrap().id(), "p1");
        assert_eq!(p.position_count(), 1);
    }

    #[test]
    fn add_duplicate_fails() {
        let mut p = portfolio(dec!(10000));
        p.add_position(spot("p1", dec!(1))).unwrap();
        assert_eq!(
            p.add_position(spot("p1", dec!(2))),
            Err(ActionError::DuplicatePosition { id: "p1".into() })
        );
        assert_eq!(p.position_count(), 1);
    }

    #[test]
    fn remove_position() {
        let mut p = portfolio(dec!(10000));
        p.add_position(spot("p1", dec!(1))).unwrap();
        let removed = p.remove_position("p1").unwrap();
        assert_eq!(removed.id(), "p1");
        assert!(!p.has_position("p1"));
    }

    #[test]
    fn remove_nonexistent_fails() {
        let mut p = portfolio(dec!(10000));
        assert!(matches!(
            p.remove_position("xyz"),
            Err(ActionError::PositionNotFound { .. })
        ));
    }

    #[test]
    fn replace_position_swaps_in_place() {
        let mut p = portfolio(dec!(0));
        p.add_position(spot("p1", dec!(1))).unwrap();
        p.replace_position("p1", spot("p1", dec!(3))).unwrap();
        assert_eq!(p.value(&snapshot(dec!(10))).unwrap().value(), dec!(30));
    }

    #[test]
    fn replace_failure_leaves_old_position_removed() {
        let mut p = portfolio(dec!(0));
        p.add_position(spot("p1", dec!(1))).unwrap();
        p.add_position(spot("p2", dec!(1))).unwrap();
        let err = p.replace_position("p1", spot("p2", dec!(5))).unwrap_err();
        assert_eq!(err, ActionError::DuplicatePosition { id: "p2".into() });
        assert!(!p.has_position("p1"));
        assert!(p.has_position("p2"));
    }

    #[test]
    fn replace_missing_old_id_fails_without_adding() {
        let mut p = portfolio(dec!(0));
        assert!(p.replace_position("ghost", spot("p1", dec!(1))).is_err());
        assert!(!p.has_position("p1"));
    }

    #[test]
    fn adjust_cash_allows_negative_balance() {
        let mut p = portfolio(dec!(100));
        p.adjust_cash(dec!(-250)).unwrap();
        assert_eq!(p.cash(), dec!(-150));
        p.adjust_cash(dec!(50.5)).unwrap();
        assert_eq!(p.cash(), dec!(-99.5));
    }

    #[test]
    fn value_sums_cash_and_positions() {
        let mut p = portfolio(dec!(1000));
        p.add_position(spot("a", dec!(2))).unwrap();
        p.add_position(spot("b", dec!(0.5))).unwrap();
        assert_eq!(p.value(&snapshot(dec!(100))).unwrap().value(), dec!(1250.0));
    }

    #[test]
    fn value_fails_when_any_position_fails() {
        let mut p = portfolio(dec!(1000));
        p.add_position(Arc::new(SpotPosition::new(
            "btc",
            PairKey::new("BTC", "USDC"),
            Amount::new(dec!(1)).unwrap(),
        )))
        .unwrap();
        assert!(matches!(
            p.value(&snapshot(dec!(100))),
            Err(ValuationError::MissingPrice { .. })
        ));
    }

    #[test]
    fn negative_net_value_is_reported() {
        let mut p = portfolio(dec!(0));
        p.adjust_cash(dec!(-500)).unwrap();
        p.add_position(spot("a", dec!(1))).unwrap();
        let snap = snapshot(dec!(100));
        assert_eq!(p.net_value(&snap).unwrap(), dec!(-400));
        assert_eq!(
            p.value(&snap),
            Err(ValuationError::NegativePortfolioValue { value: dec!(-400) })
        );
    }

    #[test]
    fn positions_returns_a_copy() {
        let mut p = portfolio(dec!(0));
        p.add_position(spot("a", dec!(1))).unwrap();
        let mut listed = p.positions();
        listed.clear();
        assert_eq!(p.position_count(), 1);
    }

    #[test]
    fn clone_is_independent() {
        let mut p = portfolio(dec!(10));
        let snapshot_copy = p.clone();
        p.add_position(spot("a", dec!(1))).unwrap();
        p.adjust_cash(dec!(5)).unwrap();
        assert_eq!(snapshot_copy.position_count(), 0);
        assert_eq!(snapshot_copy.cash(), dec!(10));
    }
}
