//! Configuration manager for ticketeer.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Secret used when none is configured. Flash cookies signed with it can be
/// forged by anyone reading this file.
pub const DEFAULT_SECRET: &str = "your_secret_key_here";

/// Errors that may occur while loading the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize `{path}`: {source}")]
    Deserialize {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Socket address to bind.
    pub address: String,
    /// Key signing flash cookies.
    #[serde(skip_serializing)]
    pub secret: String,
    #[serde(skip_deserializing)]
    version: String,
    /// File actually read, `None` when defaults are used.
    #[serde(skip)]
    pub source: Option<PathBuf>,
    #[serde(skip)]
    path: PathBuf,
    /// Related to SQLite configuration.
    #[serde(skip_serializing)]
    pub database: Database,
    /// Related to static files and generated images.
    pub storage: Storage,
    /// Related to OTLP and Prometheus.
    pub telemetry: Telemetry,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:5000".into(),
            secret: DEFAULT_SECRET.into(),
            version: VERSION.to_owned(),
            source: None,
            path: PathBuf::default(),
            database: Database::default(),
            storage: Storage::default(),
            telemetry: Telemetry::default(),
        }
    }
}

/// SQLite configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Connection string, e.g. `sqlite://site.db`.
    pub url: String,
    /// Maximum pool connections.
    pub pool_size: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite://site.db".into(),
            pool_size: crate::database::DEFAULT_POOL_SIZE,
        }
    }
}

/// Where generated files live.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Directory served under `/static`.
    pub directory: PathBuf,
    /// File name of the payment QR image inside `directory`.
    pub qr_file: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static"),
            qr_file: "payment_qr.png".into(),
        }
    }
}

impl Storage {
    /// Location of the payment QR image on disk.
    pub fn qr_path(&self) -> PathBuf {
        self.directory.join(&self.qr_file)
    }
}

/// Telemetry configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    /// gRPC endpoint receiving OTLP logs and traces.
    pub otlp_endpoint: Option<String>,
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics: bool,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// A missing file yields the default configuration.
    pub fn read(self) -> Result<Arc<Self>, ConfigError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(&file_path) {
            Ok(file) => {
                let mut config: Configuration = serde_yaml::from_reader(file)
                    .map_err(|source| ConfigError::Deserialize {
                        path: file_path.clone(),
                        source,
                    })?;

                // set app version.
                config.version = VERSION.to_owned();
                config.source = Some(file_path.clone());
                config.path = file_path;

                Ok(Arc::new(config))
            },
            Err(_) => Ok(Arc::new(Self {
                version: VERSION.to_owned(),
                ..Default::default()
            })),
        }
    }

    /// Current crate version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "secret: s3cr3t\ndatabase:\n  url: 'sqlite::memory:'\nstorage:\n  directory: /tmp/qr\ntelemetry:\n  metrics: true"
        )
        .unwrap();

        let config = Configuration::default()
            .path(file.path().to_path_buf())
            .read()
            .unwrap();

        assert_eq!(config.secret, "s3cr3t");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.database.pool_size,
            crate::database::DEFAULT_POOL_SIZE
        );
        assert_eq!(config.storage.qr_path(), PathBuf::from("/tmp/qr/payment_qr.png"));
        assert!(config.telemetry.metrics);
        assert_eq!(config.address, "0.0.0.0:5000");
        assert_eq!(config.version(), VERSION);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database: [not, a, map]").unwrap();

        let result = Configuration::default()
            .path(file.path().to_path_buf())
            .read();
        assert!(matches!(result, Err(ConfigError::Deserialize { .. })));
    }
}
