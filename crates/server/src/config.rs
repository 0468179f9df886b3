use anyhow::Context;
use docingest::BackendConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Prefix shared by every backend setting, e.g. `MARKLOGIC_HOST`.
pub const BACKEND_ENV_PREFIX: &str = "MARKLOGIC";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of insert requests processed at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `KEY=VALUE` file with backend settings. Empty disables it.
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_workers: default_max_workers(),
            max_body_size_mb: default_max_body_size_mb(),
            log_level: default_log_level(),
            env_file: default_env_file(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("DOCINGEST_SERVER").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        if config.max_workers == 0 {
            tracing::warn!("max_workers must be at least 1, using 1");
            config.max_workers = 1;
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    /// Backend settings from `MARKLOGIC_*` variables and the env file.
    pub fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        let env_file = (!self.env_file.is_empty()).then(|| Path::new(&self.env_file));
        load_backend_config(None, env_file)
    }
}

/// Layer backend settings: built-in defaults, then the process environment
/// (or `process_env` when given), then the env file.
///
/// Entries in the env file win over the environment. Neither source is
/// written back into the process environment.
pub fn load_backend_config(
    process_env: Option<config::Map<String, String>>,
    env_file: Option<&Path>,
) -> anyhow::Result<BackendConfig> {
    let mut builder = config::Config::builder().add_source(backend_env().source(process_env));

    if let Some(path) = env_file {
        if let Some(vars) = read_env_file(path)? {
            tracing::debug!(path = %path.display(), entries = vars.len(), "loaded env file");
            builder = builder.add_source(backend_env().source(Some(vars)));
        }
    }

    let config: BackendConfig = builder
        .build()?
        .try_deserialize()
        .context("invalid MARKLOGIC_* settings")?;
    Ok(config)
}

fn backend_env() -> config::Environment {
    config::Environment::with_prefix(BACKEND_ENV_PREFIX).try_parsing(true)
}

/// Parse a `.env` style file. A missing file is not an error.
fn read_env_file(path: &Path) -> anyhow::Result<Option<config::Map<String, String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let vars = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .collect::<Result<config::Map<String, String>, _>>()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(vars))
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50052
}

fn default_max_workers() -> usize {
    10
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 50052);
        assert_eq!(cfg.max_workers, 10);
        assert_eq!(cfg.max_body_size_mb, 10);
        assert_eq!(cfg.env_file, ".env");
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 50052);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_backend_defaults_without_sources() {
        let cfg = load_backend_config(env(&[]), None).unwrap();
        assert_eq!(cfg, BackendConfig::default());
    }

    #[test]
    fn test_backend_from_environment() {
        let cfg = load_backend_config(
            env(&[
                ("MARKLOGIC_HOST", "ml.internal"),
                ("MARKLOGIC_PORT", "8010"),
                ("MARKLOGIC_DATABASE", "Ingest"),
                ("UNRELATED", "x"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.host, "ml.internal");
        assert_eq!(cfg.port, 8010);
        assert_eq!(cfg.database, "Ingest");
        assert_eq!(cfg.username, "admin");
    }

    #[test]
    fn test_env_file_overrides_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# MarkLogic connection").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "MARKLOGIC_HOST=from-file").unwrap();
        writeln!(file, "MARKLOGIC_PASSWORD=p=ss").unwrap();

        let cfg = load_backend_config(
            env(&[("MARKLOGIC_HOST", "from-env"), ("MARKLOGIC_USERNAME", "ingest")]),
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(cfg.host, "from-file");
        assert_eq!(cfg.username, "ingest");
        assert_eq!(cfg.password, "p=ss");
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let cfg =
            load_backend_config(env(&[]), Some(Path::new("/nonexistent/docingest/.env"))).unwrap();
        assert_eq!(cfg.host, "localhost");
    }

    #[test]
    fn test_numeric_password_stays_a_string() {
        let cfg = load_backend_config(env(&[("MARKLOGIC_PASSWORD", "1234")]), None).unwrap();
        assert_eq!(cfg.password, "1234");
    }

    #[test]
    fn test_bad_port_is_an_error() {
        assert!(load_backend_config(env(&[("MARKLOGIC_PORT", "not-a-port")]), None).is_err());
    }
}
