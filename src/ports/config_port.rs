//! Configuration access port trait.

use rust_decimal::Decimal;

/// Section/key lookups over a backtest configuration source.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Exact decimal value, or `default` when the key is absent or malformed.
    fn get_decimal(&self, section: &str, key: &str, default: Decimal) -> Decimal;
}
