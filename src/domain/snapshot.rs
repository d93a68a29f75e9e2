//! Immutable, time-stamped market state for one simulation step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::ValuationError;
use super::money::Price;

/// A trading pair such as `ETH/USDC`: price is quote units per one base unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub base: String,
    pub quote: String,
}

impl PairKey {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        PairKey {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for PairKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("pair {s:?} must be BASE/QUOTE"))?;
        let (base, quote) = (base.trim(), quote.trim());
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(format!("pair {s:?} must be BASE/QUOTE"));
        }
        Ok(PairKey::new(base.to_uppercase(), quote.to_uppercase()))
    }
}

/// Auxiliary snapshot data consumed by position valuation models.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Decimal(Decimal),
    Integer(i64),
    Text(String),
    Flag(bool),
}

impl MetaValue {
    /// Parses a raw string into the narrowest matching variant.
    pub fn parse(raw: &str) -> MetaValue {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            return MetaValue::Integer(i);
        }
        if let Ok(d) = Decimal::from_str(raw) {
            return MetaValue::Decimal(d);
        }
        match raw.to_lowercase().as_str() {
            "true" => MetaValue::Flag(true),
            "false" => MetaValue::Flag(false),
            _ => MetaValue::Text(raw.to_string()),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            MetaValue::Decimal(d) => Some(*d),
            MetaValue::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Decimal(d) => write!(f, "{d}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Text(s) => write!(f, "{s}"),
            MetaValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Read-only market view for one step. Construct through [`MarketSnapshot::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    timestamp: DateTime<Utc>,
    prices: HashMap<PairKey, Price>,
    metadata: HashMap<String, MetaValue>,
}

impl MarketSnapshot {
    pub fn builder(timestamp: DateTime<Utc>) -> SnapshotBuilder {
        SnapshotBuilder {
            snapshot: MarketSnapshot {
                timestamp,
                prices: HashMap::new(),
                metadata: HashMap::new(),
            },
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn price(&self, pair: &PairKey) -> Result<Price, ValuationError> {
        self.prices
            .get(pair)
            .copied()
            .ok_or_else(|| ValuationError::MissingPrice {
                pair: pair.to_string(),
            })
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }

    /// Numeric metadata lookup; absent or non-numeric keys are a valuation failure.
    pub fn get_decimal(&self, key: &str) -> Result<Decimal, ValuationError> {
        self.get(key)
            .and_then(MetaValue::as_decimal)
            .ok_or_else(|| ValuationError::MissingMetadata {
                key: key.to_string(),
            })
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairKey> {
        self.prices.keys()
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }
}

pub struct SnapshotBuilder {
    snapshot: MarketSnapshot,
}

impl SnapshotBuilder {
    pub fn price(mut self, pair: PairKey, price: Price) -> Self {
        self.snapshot.prices.insert(pair, price);
        self
    }

    pub fn has_price(&self, pair: &PairKey) -> bool {
        self.snapshot.prices.contains_key(pair)
    }

    pub fn meta(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.snapshot.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> MarketSnapshot {
        self.snapshot
    }
}
