//! Connection settings for liteorm.
//!
//! Settings are built in code or read from the environment. `from_env` loads
//! a `.env` file from the current directory or any parent first, if present.

/// Environment variable holding the connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the schema used by table-existence checks.
pub const SCHEMA_VAR: &str = "LITEORM_SCHEMA";

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Connection string handed to `tokio_postgres::connect`.
    pub connection_string: String,

    /// Schema searched by `table_exists`.
    pub schema: String,
}

impl Config {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Read `DATABASE_URL` and `LITEORM_SCHEMA` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Dotenv(e)),
        }

        Self::from_lookup(|var| match std::env::var(var) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(source) => Err(ConfigError::Var {
                var: var.to_string(),
                source,
            }),
        })
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Result<Option<String>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let connection_string = lookup(DATABASE_URL_VAR)?
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;

        let mut config = Config::new(connection_string);
        if let Some(schema) = lookup(SCHEMA_VAR)?.filter(|s| !s.trim().is_empty()) {
            config.schema = schema;
        }
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    Missing(&'static str),
    /// The `.env` file could not be read or parsed
    Dotenv(dotenvy::Error),
    /// An environment variable is set but not valid unicode
    Var {
        var: String,
        source: std::env::VarError,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} is not set", var),
            ConfigError::Dotenv(e) => write!(f, "Failed to load .env: {}", e),
            ConfigError::Var { var, source } => write!(f, "Failed to read {}: {}", var, source),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Missing(_) => None,
            ConfigError::Dotenv(e) => Some(e),
            ConfigError::Var { source, .. } => Some(source),
        }
    }
}
