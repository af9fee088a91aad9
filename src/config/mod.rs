use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Longest activity window and stay accepted from the environment.
pub const MAX_POLICY_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub mail: MailConfig,
    pub booking: BookingPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_json: bool,
}

// Without a URL the service runs on the in-memory demo catalog
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

// Without a URL catalog caching is disabled
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub cache_ttl_seconds: u64,
}

// Without an SMTP host confirmations are only logged
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

/// Business knobs for searches and bookings.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingPolicy {
    /// Days ahead of today that activity slots are offered.
    pub activity_window_days: i64,
    /// Upper bound on the guest count of any room search or booking.
    pub max_guests: i32,
    /// Longest stay, in nights, a room search or booking may cover.
    pub max_stay_nights: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            activity_window_days: 30,
            max_guests: 10,
            max_stay_nights: 365,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let policy = BookingPolicy::default();

        let config = Config {
            app: AppConfig {
                host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse(&lookup, "PORT", 8000)?,
                rust_log: optional("RUST_LOG")
                    .unwrap_or_else(|| "hotel_reservations=debug,tower_http=debug".to_string()),
                log_json: optional("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            },
            database: DatabaseConfig {
                url: optional("DATABASE_URL"),
                pool_size: parse(&lookup, "DB_POOL_SIZE", 20)?,
            },
            redis: RedisConfig {
                url: optional("REDIS_URL"),
                cache_ttl_seconds: parse(&lookup, "CATALOG_CACHE_TTL_SECONDS", 3600)?,
            },
            mail: MailConfig {
                smtp_host: optional("SMTP_HOST"),
                smtp_port: parse(&lookup, "SMTP_PORT", 587)?,
                smtp_username: optional("SMTP_USERNAME"),
                smtp_password: optional("SMTP_PASSWORD"),
                from_email: optional("MAIL_FROM")
                    .unwrap_or_else(|| "reservations@hotel-paradise.example".to_string()),
                from_name: optional("MAIL_FROM_NAME").unwrap_or_else(|| "Hotel Paradise".to_string()),
            },
            booking: BookingPolicy {
                activity_window_days: parse(&lookup, "ACTIVITY_WINDOW_DAYS", policy.activity_window_days)?,
                max_guests: parse(&lookup, "MAX_SEARCH_GUESTS", policy.max_guests)?,
                max_stay_nights: parse(&lookup, "MAX_STAY_NIGHTS", policy.max_stay_nights)?,
            },
        };

        let booking = &config.booking;
        if !(0..=MAX_POLICY_DAYS).contains(&booking.activity_window_days) {
            return Err(invalid(
                "ACTIVITY_WINDOW_DAYS",
                booking.activity_window_days,
                &format!("must be between 0 and {MAX_POLICY_DAYS}"),
            ));
        }
        if !(1..=MAX_POLICY_DAYS).contains(&booking.max_stay_nights) {
            return Err(invalid(
                "MAX_STAY_NIGHTS",
                booking.max_stay_nights,
                &format!("must be between 1 and {MAX_POLICY_DAYS}"),
            ));
        }
        if booking.max_guests < 1 {
            return Err(invalid("MAX_SEARCH_GUESTS", booking.max_guests, "must be at least 1"));
        }
        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
