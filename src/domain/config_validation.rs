//! Configuration validation.
//!
//! Run once after loading the INI file, before any store is opened.

use crate::domain::error::TradeMapError;
use crate::ports::config_port::ConfigPort;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_BATCH_SIZE: i64 = 200;
pub const DEFAULT_POOL_SIZE: i64 = 4;
pub const MAX_POOL_SIZE: u32 = 64;
pub const DEFAULT_PORT: u16 = 3001;
pub const KNOWN_BACKENDS: &[&str] = &["sqlite", "postgres"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradeMapError> {
    validate_backend(config)?;
    validate_positive(config, "stats", "country_top_n", 10)?;
    validate_positive(config, "stats", "company_top_n", 5)?;
    validate_positive(config, "import", "batch_size", DEFAULT_BATCH_SIZE)?;
    pool_size(config, "sqlite")?;
    pool_size(config, "postgres")?;
    validate_listen(config)?;
    Ok(())
}

/// Configured backend name, `sqlite` when unset.
pub fn backend(config: &dyn ConfigPort) -> String {
    config
        .get_string("database", "backend")
        .map(|b| b.trim().to_lowercase())
        .unwrap_or_else(|| "sqlite".to_string())
}

fn validate_backend(config: &dyn ConfigPort) -> Result<(), TradeMapError> {
    let backend = backend(config);
    if !KNOWN_BACKENDS.contains(&backend.as_str()) {
        return Err(TradeMapError::ConfigInvalid {
            section: "database".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{backend}', expected sqlite or postgres"),
        });
    }
    if backend == "postgres" && config.get_string("postgres", "connection_string").is_none() {
        return Err(TradeMapError::ConfigMissing {
            section: "postgres".to_string(),
            key: "connection_string".to_string(),
        });
    }
    Ok(())
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), TradeMapError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(TradeMapError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be at least 1"),
        });
    }
    Ok(())
}

/// `[section] pool_size` for an r2d2 pool, 1 to [`MAX_POOL_SIZE`].
pub fn pool_size(config: &dyn ConfigPort, section: &str) -> Result<u32, TradeMapError> {
    let value = config.get_int(section, "pool_size", DEFAULT_POOL_SIZE);
    u32::try_from(value)
        .ok()
        .filter(|n| (1..=MAX_POOL_SIZE).contains(n))
        .ok_or_else(|| TradeMapError::ConfigInvalid {
            section: section.to_string(),
            key: "pool_size".to_string(),
            reason: format!("pool_size must be between 1 and {MAX_POOL_SIZE}, got {value}"),
        })
}

pub fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

/// Parsed `[web] listen` address.
pub fn listen_addr(config: &dyn ConfigPort) -> Result<SocketAddr, TradeMapError> {
    let Some(raw) = config.get_string("web", "listen") else {
        return Ok(default_listen());
    };
    raw.trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| TradeMapError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("'{raw}': {e}"),
        })
}

fn validate_listen(config: &dyn ConfigPort) -> Result<(), TradeMapError> {
    listen_addr(config).map(|_| ())
}
