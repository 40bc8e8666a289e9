use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

use crate::notifications::EmailConfig;
use crate::services::reminders::{MAX_REMINDER_WINDOW_HOURS, MIN_SCAN_INTERVAL};
use crate::worker::PoolConfig;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ticketing";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_VERIFY_BASE_URL: &str = "https://tkt.system/v1/verify";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub pool: PoolConfig,
    pub reminder_interval: Duration,
    pub reminder_window: chrono::Duration,
    pub ticket_verify_base_url: String,
    pub cors_allowed_origins: String,
    pub production: bool,
    /// `None` disables SMTP; mail is logged instead.
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            pool: PoolConfig {
                workers: parse_or("WORKER_COUNT", 5),
                queue_capacity: parse_or("QUEUE_CAPACITY", 100),
            },
            reminder_interval: reminder_interval(parse_or("REMINDER_INTERVAL_SECS", 1800)),
            reminder_window: reminder_window(parse_or("REMINDER_WINDOW_HOURS", 24)),
            ticket_verify_base_url: env::var("TICKET_VERIFY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_VERIFY_BASE_URL.to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            email: EmailConfig::from_env(),
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Seconds between reminder scans, at least one.
fn reminder_interval(secs: u64) -> Duration {
    let interval = Duration::from_secs(secs).max(MIN_SCAN_INTERVAL);
    if interval.as_secs() != secs {
        tracing::warn!(
            requested = secs,
            using = interval.as_secs(),
            "REMINDER_INTERVAL_SECS out of range"
        );
    }
    interval
}

/// Reminder look-ahead, kept within `1..=MAX_REMINDER_WINDOW_HOURS` hours.
fn reminder_window(hours: i64) -> chrono::Duration {
    let clamped = hours.clamp(1, MAX_REMINDER_WINDOW_HOURS);
    if clamped != hours {
        tracing::warn!(
            requested = hours,
            using = clamped,
            "REMINDER_WINDOW_HOURS out of range"
        );
    }
    chrono::Duration::hours(clamped)
}
