//! Core domain types and logic.

pub mod money;
pub mod snapshot;
pub mod position;
pub mod portfolio;
pub mod action;
pub mod strategy;
pub mod cancel;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
