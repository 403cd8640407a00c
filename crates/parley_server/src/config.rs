//! Server configuration.
//!
//! Sources, lowest precedence first:
//! 1. Bundled defaults (include_str! from parley.toml)
//! 2. `~/.config/parley/parley.toml`
//! 3. `./parley.toml`, or the file passed with `--config`
//! 4. `PARLEY_<SECTION>__<KEY>` environment variables
//! 5. `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`, `DATABASE_URL`, `AUTH_SECRET`

use config::{Config, Environment, File, FileFormat};
use parley_cache::ResponseCacheConfig;
use parley_error::{ConfigError, ParleyResult};
use parley_models::OpenAiConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../parley.toml");

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Listener and relay settings
    pub server: ServerSettings,
    /// Response cache policy
    pub cache: CacheSettings,
    /// Completion provider connection
    pub provider: OpenAiConfig,
    /// Caller identity
    pub auth: AuthSettings,
    /// Conversation storage
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Listener and relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to listen on (e.g., "127.0.0.1:3000")
    pub bind_addr: String,
    /// Tokens buffered between the provider and the client
    pub channel_capacity: usize,
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds a completed reply stays fresh
    pub default_ttl: u64,
    /// Most conversations held at once
    pub max_size: usize,
    /// Whether replies are cached at all
    pub enabled: bool,
    /// Seconds between sweeps of expired entries
    pub sweep_interval_secs: u64,
}

impl CacheSettings {
    /// Cache policy described by these settings.
    pub fn policy(&self) -> ResponseCacheConfig {
        ResponseCacheConfig::default()
            .with_default_ttl(self.default_ttl)
            .with_max_size(self.max_size)
            .with_enabled(self.enabled)
    }
}

/// How callers are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HS256 bearer tokens; the `sub` claim is the user id
    Jwt,
    /// A trusted header set by an upstream auth proxy
    Header,
}

/// Caller identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Identity scheme
    pub mode: AuthMode,
    /// Shared secret for verifying bearer tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Header carrying the user id in header mode
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

/// Conversation storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string; conversations stay in memory without one
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    8
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
        }
    }
}

impl ParleyConfig {
    /// Load configuration from every source, environment included.
    ///
    /// `path` replaces `./parley.toml` and must exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use parley_server::ParleyConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ParleyConfig::load(None)?;
    /// config.validate()?;
    /// println!("Listening on {}", config.server.bind_addr);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: Option<&Path>) -> ParleyResult<Self> {
        Ok(Self::load_from(path, None)?.with_env_overrides())
    }

    /// Load from files and `PARLEY_` variables.
    ///
    /// When `env` is given it stands in for the process environment.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> ParleyResult<Self> {
        debug!("Loading configuration with precedence: env > file > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/parley/parley.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("parley").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("PARLEY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Overlay the conventional variables from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay `OPENAI_*`, `DATABASE_URL` and `AUTH_SECRET` as resolved by `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.provider = self.provider.with_overrides_from(&lookup);
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = value("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(secret) = value("AUTH_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        self
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> ParleyResult<()> {
        if self.server.channel_capacity == 0 {
            Err(ConfigError::new("server.channel_capacity must be at least 1"))?
        }
        if self.cache.enabled && self.cache.max_size == 0 {
            Err(ConfigError::new("cache.max_size must be at least 1 when caching is enabled"))?
        }
        if self.cache.sweep_interval_secs == 0 {
            Err(ConfigError::new("cache.sweep_interval_secs must be at least 1"))?
        }
        if self.database.pool_size == 0 {
            Err(ConfigError::new("database.pool_size must be at least 1"))?
        }
        match self.auth.mode {
            AuthMode::Jwt
                if self
                    .auth
                    .jwt_secret
                    .as_deref()
                    .is_none_or(|s| s.trim().is_empty()) =>
            {
                Err(ConfigError::missing("auth.jwt_secret"))?
            }
            AuthMode::Header if self.auth.user_header.trim().is_empty() => {
                Err(ConfigError::missing("auth.user_header"))?
            }
            _ => {}
        }
        Ok(())
    }
}
