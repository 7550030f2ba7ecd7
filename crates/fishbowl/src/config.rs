//! Server configuration from the environment.
//!
//! | variable           | default     | meaning                              |
//! |--------------------|-------------|--------------------------------------|
//! | `LOCAL_IP`         | `127.0.0.1` | address to listen on                 |
//! | `WS_LISTENER_PORT` | `10020`     | WebSocket port                       |
//! | `ENABLE_AUTH`      | unset (off) | require a token from `AUTH_TOKENS`   |
//! | `AUTH_TOKENS`      | empty       | `gid/token=user,…`                   |
//! | `RECV_TIMEOUT_MS`  | `250`       | handler receive poll interval        |
//! | `MIN_PLAYERS`      | `1`         | ready players needed to start        |

use std::str::FromStr;
use std::time::Duration;

use fishbowl_auth::{AllowAll, AuthError, Authenticator, TokenTable};
use fishbowl_protocol::{SessionId, UserId};
use fishbowl_session::TableConfig;

pub const DEFAULT_LOCAL_IP: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10020;

/// A variable that was set but couldn't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("invalid AUTH_TOKENS: {0}")]
    Tokens(#[from] AuthError),
}

/// Everything the server reads from its environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub local_ip: String,
    pub port: u16,
    pub enable_auth: bool,
    pub tokens: TokenTable,
    pub table: TableConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            local_ip: DEFAULT_LOCAL_IP.to_string(),
            port: DEFAULT_PORT,
            enable_auth: false,
            tokens: TokenTable::new(),
            table: TableConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the process environment. Unset variables keep their defaults.
    ///
    /// # Errors
    /// [`ConfigError`] if a variable is set to something unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ip) = lookup("LOCAL_IP").filter(|v| !v.trim().is_empty()) {
            config.local_ip = ip.trim().to_string();
        }
        if let Some(port) = parse(&lookup, "WS_LISTENER_PORT")? {
            config.port = port;
        }
        if let Some(value) = lookup("ENABLE_AUTH") {
            config.enable_auth = parse_flag("ENABLE_AUTH", &value)?;
        }
        if let Some(tokens) = lookup("AUTH_TOKENS") {
            config.tokens = tokens.parse()?;
        }
        if let Some(ms) = parse::<u64>(&lookup, "RECV_TIMEOUT_MS")? {
            config.table.recv_timeout = Duration::from_millis(ms);
        }
        if let Some(min) = parse(&lookup, "MIN_PLAYERS")? {
            config.table.min_players = min;
        }

        Ok(config)
    }

    /// `ip:port`, ready for [`FishbowlServerBuilder::bind`](crate::FishbowlServerBuilder::bind).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.local_ip, self.port)
    }

    /// The authenticator these settings call for.
    pub fn authenticator(&self) -> ConfiguredAuth {
        if self.enable_auth {
            ConfiguredAuth::Tokens(self.tokens.clone())
        } else {
            ConfiguredAuth::Open(AllowAll)
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

/// [`AllowAll`] or a [`TokenTable`], picked at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredAuth {
    Open(AllowAll),
    Tokens(TokenTable),
}

impl Authenticator for ConfiguredAuth {
    async fn validate(
        &self,
        session: &SessionId,
        credential: Option<&str>,
    ) -> Result<UserId, AuthError> {
        match self {
            Self::Open(auth) => auth.validate(session, credential).await,
            Self::Tokens(auth) => auth.validate(session, credential).await,
        }
    }
}
