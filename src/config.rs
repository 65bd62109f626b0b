use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;

use crate::engine::Settings;
use crate::error::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub notification_webhook_url: Option<String>,
    pub engine: Settings,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let database_max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        let listen_addr = match optional("LISTEN_ADDR") {
            Some(addr) => parse("LISTEN_ADDR", &addr)?,
            None => parse("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?,
        };

        let store_timeout_ms = parse_or("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        let offset_minutes: i32 = parse_or("RIDE_UTC_OFFSET_MINUTES", 0)?;

        let timezone = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::config_error(format!(
                    "RIDE_UTC_OFFSET_MINUTES out of range: {}",
                    offset_minutes
                ))
            })?;

        Ok(Self {
            database_url,
            database_max_connections,
            listen_addr,
            notification_webhook_url: optional("NOTIFICATION_WEBHOOK_URL"),
            engine: Settings {
                store_timeout: Duration::from_millis(store_timeout_ms),
                timezone,
            },
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::config_error(format!("{} has an invalid value: {}", key, value)))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match optional(key) {
        Some(value) => parse(key, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_the_offending_key() {
        let err = parse::<u32>("DATABASE_MAX_CONNECTIONS", "many").unwrap_err();

        assert_eq!(err.code, 1);
        assert!(err.message.contains("DATABASE_MAX_CONNECTIONS"));
    }

    #[test]
    fn parse_accepts_socket_addresses() {
        let addr: SocketAddr = parse("LISTEN_ADDR", DEFAULT_LISTEN_ADDR).unwrap();

        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u64 = parse_or("CAMPUSRIDE_TEST_UNSET_VARIABLE", 42).unwrap();

        assert_eq!(value, 42);
    }
}
