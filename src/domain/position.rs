//! The position valuation contract and the built-in spot holding.

use std::fmt;

use super::error::ValuationError;
use super::money::Amount;
use super::snapshot::{MarketSnapshot, PairKey};

/// Type tag reported by a position; opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PositionKind {
    Spot,
    LiquidityPool,
    Option,
    Perpetual,
    Other(String),
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionKind::Spot => write!(f, "spot"),
            PositionKind::LiquidityPool => write!(f, "liquidity_pool"),
            PositionKind::Option => write!(f, "option"),
            PositionKind::Perpetual => write!(f, "perpetual"),
            PositionKind::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// Anything whose worth can be computed from a [`MarketSnapshot`].
///
/// Positions are immutable once handed to a portfolio: changing one means
/// replacing it through [`Action::ReplacePosition`](super::action::Action::ReplacePosition).
pub trait Position: fmt::Debug + Send + Sync {
    /// Identifier, unique within a portfolio.
    fn id(&self) -> &str;

    fn kind(&self) -> PositionKind;

    /// Current value in the portfolio's cash denomination.
    fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount, ValuationError>;
}

/// A plain holding of `quantity` base units, valued at the pair's price.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotPosition {
    pub id: String,
    pub pair: PairKey,
    pub quantity: Amount,
}

impl SpotPosition {
    pub fn new(id: impl Into<String>, pair: PairKey, quantity: Amount) -> Self {
        SpotPosition {
            id: id.into(),
            pair,
            quantity,
        }
    }
}

impl Position for SpotPosition {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> PositionKind {
        PositionKind::Spot
    }

    fn value(&self, snapshot: &MarketSnapshot) -> Result<Amount, ValuationError> {
        let price = snapshot.price(&self.pair)?;
        Ok(price.times(self.quantity)?)
    }
}
