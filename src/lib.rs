//! Event-driven portfolio backtesting with decimal-exact accounting.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and the command-line front end in
//! [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

pub use domain::money::{Amount, Decimal, Price};
pub use rust_decimal_macros::dec;
