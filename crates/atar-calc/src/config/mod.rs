use crate::scoring::{ScalingParameterStore, ScalingTableError, Variation};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scaling: ScalingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scaling: ScalingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the subject scaling tables come from and the cohort-wide variation default.
#[derive(Debug, Clone, Default)]
pub struct ScalingConfig {
    pub tables: Option<ScalingTablePaths>,
    pub default_variation: Variation,
}

/// Parameter and grade-mapping CSV files replacing the bundled reference tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingTablePaths {
    pub parameters: PathBuf,
    pub grade_mappings: PathBuf,
}

impl ScalingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let parameters = env::var_os("ATAR_SCALING_PARAMETERS").map(PathBuf::from);
        let grade_mappings = env::var_os("ATAR_GRADE_MAPPINGS").map(PathBuf::from);

        let tables = match (parameters, grade_mappings) {
            (Some(parameters), Some(grade_mappings)) => Some(ScalingTablePaths {
                parameters,
                grade_mappings,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteScalingTables),
        };

        let default_variation = match env::var("ATAR_DEFAULT_VARIATION") {
            Ok(raw) => Variation::parse(&raw).ok_or(ConfigError::InvalidVariation { value: raw })?,
            Err(_) => Variation::default(),
        };

        Ok(Self {
            tables,
            default_variation,
        })
    }

    /// Builds the parameter store once at startup; callers share it by reference.
    pub fn load_store(&self) -> Result<ScalingParameterStore, ScalingTableError> {
        match &self.tables {
            Some(paths) => ScalingParameterStore::from_paths(&paths.parameters, &paths.grade_mappings),
            None => ScalingParameterStore::reference(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidVariation { value: String },
    IncompleteScalingTables,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidVariation { value } => {
                write!(f, "ATAR_DEFAULT_VARIATION must be numeric, got '{value}'")
            }
            ConfigError::IncompleteScalingTables => write!(
                f,
                "ATAR_SCALING_PARAMETERS and ATAR_GRADE_MAPPINGS must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidVariation { .. }
            | ConfigError::IncompleteScalingTables => None,
        }
    }
}
