//! Server command-line and environment configuration.
//!
//! # Invariants
//! - Every flag has an environment fallback and a default.
//! - A resolved `ServerConfig` always has a `host:port` listen address and a
//!   non-zero call timeout. Hostnames are resolved when the listener binds.

use clap::{Parser, ValueHint};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8081";
pub const DEFAULT_DB_PATH: &str = "list.db";
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mailinglist-server",
    version,
    about = "Mailing list directory served over HTTP/JSON RPC"
)]
pub struct ServerArgs {
    #[arg(
        long,
        env = "MAILINGLIST_RPC_ADDR",
        default_value = DEFAULT_BIND,
        help = "Listen address (host:port, http://host:port, or :port for loopback)"
    )]
    pub bind: String,
    #[arg(
        long,
        env = "MAILINGLIST_DB",
        default_value = DEFAULT_DB_PATH,
        value_hint = ValueHint::FilePath,
        help = "SQLite database file"
    )]
    pub db: PathBuf,
    #[arg(
        long,
        env = "MAILINGLIST_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        help = "Per-call store deadline in milliseconds"
    )]
    pub timeout_ms: u64,
    #[arg(long, env = "MAILINGLIST_LOG_LEVEL", help = "trace|debug|info|warn|error")]
    pub log_level: Option<String>,
    #[arg(
        long,
        env = "MAILINGLIST_LOG_DIR",
        value_hint = ValueHint::DirPath,
        help = "Absolute directory for rotating log files (default: stderr)"
    )]
    pub log_dir: Option<String>,
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port`, where host may be a name, an IPv4 or a bracketed IPv6 literal.
    pub bind: String,
    pub db_path: PathBuf,
    pub call_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBind { raw: String, reason: String },
    ZeroTimeout,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBind { raw, reason } => {
                write!(f, "invalid listen address `{raw}`: {reason}")
            }
            Self::ZeroTimeout => write!(f, "--timeout-ms must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}

impl ServerArgs {
    pub fn to_config(&self) -> Result<ServerConfig, ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(ServerConfig {
            bind: parse_bind_addr(&self.bind)?,
            db_path: self.db.clone(),
            call_timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Normalizes a listen address to `host:port`.
///
/// Accepts `host:port`, an `http://host:port` endpoint as used by clients, or
/// `:port` which binds loopback. The host is left unresolved.
pub fn parse_bind_addr(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBind {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let authority = without_scheme.strip_suffix('/').unwrap_or(without_scheme);
    if authority.contains('/') {
        return Err(invalid("listen address must not include a path"));
    }

    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    port.parse::<u16>().map_err(|_| invalid("bad port"))?;

    let host = if host.is_empty() { "127.0.0.1" } else { host };
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(invalid("IPv6 hosts must be bracketed"));
    }
    Ok(format!("{host}:{port}"))
}
