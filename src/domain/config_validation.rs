//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use rust_decimal::Decimal;

use crate::domain::error::SimfolioError;
use crate::domain::money::parse_decimal;
use crate::domain::snapshot::PairKey;
use crate::ports::config_port::ConfigPort;

pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
pub const STRATEGIES: [&str; 2] = ["hold", "buy_and_hold"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    validate_initial_cash(config)?;
    validate_log_level(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    let name = validate_strategy_name(config)?;
    if name == "buy_and_hold" {
        validate_pair(config)?;
        validate_allocation(config)?;
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SimfolioError {
    SimfolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SimfolioError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SimfolioError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    let raw = required(config, "backtest", "initial_cash")?;
    let value =
        parse_decimal(&raw).map_err(|e| invalid("backtest", "initial_cash", e.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    if let Some(level) = config.get_string("backtest", "log_level") {
        let level = level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(invalid(
                "backtest",
                "log_level",
                format!("log_level must be one of {}", LOG_LEVELS.join(", ")),
            ));
        }
    }
    Ok(())
}

fn validate_strategy_name(config: &dyn ConfigPort) -> Result<String, SimfolioError> {
    let name = required(config, "strategy", "name")?.to_lowercase();
    if !STRATEGIES.contains(&name.as_str()) {
        return Err(invalid(
            "strategy",
            "name",
            format!("unknown strategy {name:?}, expected one of {}", STRATEGIES.join(", ")),
        ));
    }
    Ok(name)
}

fn validate_pair(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    let raw = required(config, "strategy", "pair")?;
    raw.parse::<PairKey>()
        .map_err(|reason| invalid("strategy", "pair", reason))?;
    Ok(())
}

fn validate_allocation(config: &dyn ConfigPort) -> Result<(), SimfolioError> {
    let Some(raw) = config.get_string("strategy", "allocation") else {
        return Ok(());
    };
    let value =
        parse_decimal(&raw).map_err(|e| invalid("strategy", "allocation", e.to_string()))?;
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(
            "strategy",
            "allocation",
            "allocation must be in (0, 1]",
        ));
    }
    Ok(())
}
