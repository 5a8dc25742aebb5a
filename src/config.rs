// Application configuration
//
// Read once at startup from the environment (after loading `.env`).
// Policy values are validated here so a bad deployment fails fast.

use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::calendar::{MonthDay, PeakSeason, PeakWindow};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Booking and cancellation policy knobs
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub peak_season: PeakSeason,
    pub default_nightly_rate: Decimal,
    pub cancellation_base_fee: Decimal,
    pub late_cancellation_hours: i64,
    pub cache_ttl: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            peak_season: PeakSeason::default(),
            default_nightly_rate: Decimal::new(3000, 2),
            cancellation_base_fee: Decimal::new(1000, 2),
            late_cancellation_hours: 48,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub storage_timeout: Duration,
    pub policy: PolicyConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let peak_start: MonthDay = parse_or(&lookup, "PEAK_SEASON_START", MonthDay { month: 6, day: 1 })?;
        let peak_end: MonthDay = parse_or(&lookup, "PEAK_SEASON_END", MonthDay { month: 9, day: 1 })?;
        if peak_start == peak_end {
            return Err(ConfigError::Invalid {
                name: "PEAK_SEASON_END",
                value: peak_end.to_string(),
                reason: "peak season cannot start and end on the same day".to_string(),
            });
        }

        let max_nights: i64 = parse_or(&lookup, "PEAK_MAX_NIGHTS", 14)?;
        require(max_nights > 0, "PEAK_MAX_NIGHTS", max_nights, "must be positive")?;

        let default_nightly_rate: Decimal = parse_or(&lookup, "DEFAULT_NIGHTLY_RATE", Decimal::new(3000, 2))?;
        require(
            default_nightly_rate > Decimal::ZERO,
            "DEFAULT_NIGHTLY_RATE",
            default_nightly_rate,
            "must be positive",
        )?;

        let cancellation_base_fee: Decimal = parse_or(&lookup, "CANCELLATION_BASE_FEE", Decimal::new(1000, 2))?;
        require(
            cancellation_base_fee >= Decimal::ZERO,
            "CANCELLATION_BASE_FEE",
            cancellation_base_fee,
            "cannot be negative",
        )?;

        let late_cancellation_hours: i64 = parse_or(&lookup, "LATE_CANCELLATION_HOURS", 48)?;
        require(
            late_cancellation_hours >= 0,
            "LATE_CANCELLATION_HOURS",
            late_cancellation_hours,
            "cannot be negative",
        )?;

        let cache_ttl_secs: u64 = parse_or(&lookup, "POLICY_CACHE_TTL_SECS", 60)?;
        let storage_timeout_ms: u64 = parse_or(&lookup, "STORAGE_TIMEOUT_MS", 3000)?;
        require(storage_timeout_ms > 0, "STORAGE_TIMEOUT_MS", storage_timeout_ms, "must be positive")?;

        let database_max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        require(
            database_max_connections > 0,
            "DATABASE_MAX_CONNECTIONS",
            database_max_connections,
            "must be positive",
        )?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_max_connections,
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            policy: PolicyConfig {
                peak_season: PeakSeason {
                    window: PeakWindow::new(peak_start, peak_end),
                    max_nights,
                },
                default_nightly_rate,
                cancellation_base_fee,
                late_cancellation_hours,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn require<T: ToString>(ok: bool, name: &'static str, value: T, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }
}
