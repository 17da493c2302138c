//! Environment-driven application configuration.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::Key;
use tracing::warn;

/// Default bind address when `BIND_ADDR` is unset.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Default session key location when `SESSION_KEY_FILE` is unset.
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
/// Default uploads directory when `UPLOADS_DIR` is unset.
const DEFAULT_UPLOADS_DIR: &str = "./uploads";
/// Default upload cap when `MAX_IMAGE_BYTES` is unset: 2 MiB.
const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing required environment variable {name}")]
    Missing {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but unparseable.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Parse failure description.
        message: String,
    },
    /// The session key could not be loaded and no dev fallback applies.
    #[error("failed to read session key at {path}: {message}")]
    SessionKey {
        /// Configured key path.
        path: String,
        /// Read failure description.
        message: String,
    },
}

/// Typed application configuration collected at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,
    /// Path of the session key file.
    pub session_key_file: String,
    /// Whether session cookies require HTTPS.
    pub cookie_secure: bool,
    /// Directory uploaded images are stored in.
    pub uploads_dir: PathBuf,
    /// Upload size cap in bytes.
    pub max_image_bytes: usize,
}

impl AppConfig {
    /// Read the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing {
            name: "DATABASE_URL",
        })?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned())
            .parse()
            .map_err(|err| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: format!("{err}"),
            })?;

        let session_key_file = env::var("SESSION_KEY_FILE")
            .unwrap_or_else(|_| DEFAULT_SESSION_KEY_FILE.to_owned());

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v != "0")
            .unwrap_or(true);

        let uploads_dir =
            PathBuf::from(env::var("UPLOADS_DIR").unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.to_owned()));

        let max_image_bytes = match env::var("MAX_IMAGE_BYTES") {
            Ok(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
                name: "MAX_IMAGE_BYTES",
                message: format!("{err}"),
            })?,
            Err(_) => DEFAULT_MAX_IMAGE_BYTES,
        };

        Ok(Self {
            database_url,
            bind_addr,
            session_key_file,
            cookie_secure,
            uploads_dir,
            max_image_bytes,
        })
    }

    /// Load the session signing key, falling back to an ephemeral key in
    /// debug builds or when `SESSION_ALLOW_EPHEMERAL=1`.
    pub fn load_session_key(&self) -> Result<Key, ConfigError> {
        match std::fs::read(&self.session_key_file) {
            Ok(bytes) => Ok(Key::derive_from(&bytes)),
            Err(err) => {
                let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!(path = %self.session_key_file, error = %err, "using temporary session key (dev only)");
                    Ok(Key::generate())
                } else {
                    Err(ConfigError::SessionKey {
                        path: self.session_key_file.clone(),
                        message: err.to_string(),
                    })
                }
            }
        }
    }
}
