//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::SigtraderError;
use crate::domain::signal::MaKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    require_non_empty(config, "data", "dir")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_macd(config)?;
    validate_rsi(config)?;
    validate_trend(config)?;
    Ok(())
}

/// Parse an optional `[section] key` date. Missing keys are `Ok(None)`.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SigtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))),
        _ => Ok(None),
    }
}

/// `[section] key` as an integer, `default` when absent. A present value
/// that does not parse is `ConfigInvalid`, never the default.
pub fn config_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SigtraderError> {
    match config.get_string(section, key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(section, key, format!("{} must be an integer, got {:?}", key, raw))),
        None => Ok(default),
    }
}

pub fn config_float(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigtraderError> {
    match config.get_string(section, key) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(section, key, format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(default),
    }
}

pub fn config_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, SigtraderError> {
    if config.get_string(section, key).is_none() {
        return Ok(default);
    }
    // The port falls back to its default on garbage, so disagreeing defaults expose it.
    let value = config.get_bool(section, key, true);
    if value != config.get_bool(section, key, false) {
        return Err(invalid(section, key, format!("{} must be true or false", key)));
    }
    Ok(value)
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_date = parse_optional_date(config, "data", "start_date")?;
    let end_date = parse_optional_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(invalid("data", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config_float(config, "backtest", "initial_capital", 1.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config_float(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("backtest", "risk_free_rate", "risk_free_rate must be between 0 and 1"));
    }
    Ok(())
}

fn validate_macd(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let fast = positive_int(config, "macd", "fast", 12)?;
    let slow = positive_int(config, "macd", "slow", 26)?;
    positive_int(config, "macd", "signal", 9)?;

    if fast >= slow {
        return Err(invalid("macd", "fast", "fast must be shorter than slow"));
    }
    Ok(())
}

fn validate_rsi(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    positive_int(config, "rsi", "period", 14)?;

    let oversold = config_float(config, "rsi", "oversold", 30.0)?;
    let overbought = config_float(config, "rsi", "overbought", 70.0)?;
    if oversold <= 0.0 || oversold >= 100.0 {
        return Err(invalid("rsi", "oversold", "oversold must be between 0 and 100"));
    }
    if overbought <= oversold || overbought >= 100.0 {
        return Err(invalid(
            "rsi",
            "overbought",
            "overbought must be above oversold and below 100",
        ));
    }
    Ok(())
}

fn validate_trend(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if !config_bool(config, "trend", "enabled", false)? {
        return Ok(());
    }

    if let Some(kind) = config.get_string("trend", "kind") {
        kind.parse::<MaKind>()
            .map_err(|_| invalid("trend", "kind", "kind must be sma or ema"))?;
    }

    let fast = positive_int(config, "trend", "fast", 20)?;
    let slow = positive_int(config, "trend", "slow", 50)?;
    if fast >= slow {
        return Err(invalid("trend", "fast", "fast must be shorter than slow"));
    }
    Ok(())
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SigtraderError> {
    let value = config_int(config, section, key, default)?;
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
