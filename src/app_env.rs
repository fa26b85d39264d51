use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// URL for accessing the PostgreSQL database holding the tasks table
pub const DB_URL: &str = "DATABASE_URL";
/// Port the HTTP server listens on. Defaults to [DEFAULT_PORT].
pub const PORT: &str = "PORT";
/// Directory containing the frontend bundle served for non-API paths. Defaults to [DEFAULT_FRONTEND_DIR].
/// Relative paths resolve against the working directory of the process, not the binary's location,
/// so set this to an absolute path when the server is started from elsewhere.
pub const FRONTEND_DIR: &str = "FRONTEND_DIR";
/// Log level configuration for the application. For formatting info, see [tracing-subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// OpenTelemetry span export URL. Should be http://localhost:4317 when the service runs next to
/// an OpenTelemetry collector sidecar. Span export is disabled when unset.
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 when the service runs next to
/// an OpenTelemetry collector sidecar. Metric export is disabled when unset.
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

pub const DEFAULT_PORT: u16 = 8000;
/// Relative to the working directory the server is started from
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the {0} environment variable must be set")]
    Missing(&'static str),
    #[error("{var} must be a valid port number, got \"{value}\"")]
    InvalidPort {
        var: &'static str,
        value: String,
        #[source]
        cause: ParseIntError,
    },
}

/// Endpoints for exporting OpenTelemetry data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtelEndpoints {
    pub spans: String,
    pub metrics: String,
}

/// Settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
    pub otel: Option<OtelEndpoints>,
}

impl AppConfig {
    /// Reads configuration from the process environment. Call `dotenv()` beforehand
    /// if values should also come from a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = read(DB_URL).ok_or(ConfigError::Missing(DB_URL))?;
        let port = match read(PORT) {
            None => DEFAULT_PORT,
            Some(raw_port) => {
                raw_port
                    .trim()
                    .parse()
                    .map_err(|cause| ConfigError::InvalidPort {
                        var: PORT,
                        value: raw_port.clone(),
                        cause,
                    })?
            }
        };
        let frontend_dir = read(FRONTEND_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FRONTEND_DIR));
        let otel = match (read(OTEL_SPAN_EXPORT_URL), read(OTEL_METRIC_EXPORT_URL)) {
            (Some(spans), Some(metrics)) => Some(OtelEndpoints { spans, metrics }),
            _ => None,
        };

        Ok(AppConfig {
            database_url,
            port,
            frontend_dir,
            otel,
        })
    }
}
