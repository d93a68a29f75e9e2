//! Market data port trait.

use crate::domain::error::SimfolioError;
use crate::domain::snapshot::MarketSnapshot;

/// Source of the ordered snapshot sequence a backtest runs over.
pub trait SnapshotPort {
    /// Snapshots in strictly increasing time order.
    fn load_snapshots(&self) -> Result<Vec<MarketSnapshot>, SimfolioError>;
}
