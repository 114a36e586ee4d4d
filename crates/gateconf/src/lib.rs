//! Configuration loading for cidgate.
//!
//! Infrastructure settings (`InfraConfig`) are fixed at startup: where copies
//! are written, what port to bind, which backend to talk to, where telemetry
//! goes. Cache sizing and the public gateway links sit alongside them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gateconf::GateConfig;
//!
//! let config = GateConfig::load().expect("Failed to load config");
//!
//! println!("HTTP port: {}", config.infra.bind.http_port);
//! println!("Backend: {}", config.infra.backend.api_url);
//! println!("Cache threshold: {}", config.cache.threshold);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/cidgate/config.toml` (system)
//! 2. `~/.config/cidgate/config.toml` (user)
//! 3. `./cidgate.toml` or the `--config` path (local override)
//! 4. Environment variables (`CIDGATE_*`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! upload_dir = "~/cidgate/upload"
//! retrieve_dir = "~/cidgate/retrieve"
//! persist_copies = true
//!
//! [bind]
//! http_port = 8081
//! max_upload_bytes = 52428800
//!
//! [telemetry]
//! otlp_endpoint = "127.0.0.1:4317"
//! log_level = "info"
//!
//! [backend]
//! api_url = "http://127.0.0.1:5001"
//! timeout_ms = 30000
//!
//! [cache]
//! threshold = 100
//! eviction = "clear-all"
//!
//! [gateway.public_gateways]
//! ipfs_io = "https://ipfs.io/ipfs/"
//! ```

pub mod gateway;
pub mod infra;
pub mod loader;

pub use cas::{CacheConfig, Eviction};
pub use gateway::{default_public_gateways, GatewayConfig, PublicGateways};
pub use infra::{BackendConfig, BindConfig, InfraConfig, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete cidgate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(flatten)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl GateConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` in place of `./cidgate.toml`.
    ///
    /// System and user configs still load first; env overrides still apply last.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars applied.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = GateConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# cidgate configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "upload_dir = {}\n",
            quoted(&self.infra.paths.upload_dir.display().to_string())
        ));
        output.push_str(&format!(
            "retrieve_dir = {}\n",
            quoted(&self.infra.paths.retrieve_dir.display().to_string())
        ));
        output.push_str(&format!(
            "persist_copies = {}\n",
            self.infra.paths.persist_copies
        ));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("http_port = {}\n", self.infra.bind.http_port));
        output.push_str(&format!(
            "max_upload_bytes = {}\n",
            self.infra.bind.max_upload_bytes
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "otlp_endpoint = {}\n",
            quoted(&self.infra.telemetry.otlp_endpoint)
        ));
        output.push_str(&format!(
            "log_level = {}\n",
            quoted(&self.infra.telemetry.log_level)
        ));

        output.push_str("\n[backend]\n");
        output.push_str(&format!(
            "api_url = {}\n",
            quoted(&self.infra.backend.api_url)
        ));
        output.push_str(&format!("timeout_ms = {}\n", self.infra.backend.timeout_ms));

        output.push_str("\n[cache]\n");
        output.push_str(&format!("threshold = {}\n", self.cache.threshold));
        output.push_str(&format!("eviction = {}\n", quoted(self.cache.eviction.as_str())));

        output.push_str("\n[gateway.public_gateways]\n");
        for (name, prefix) in &self.gateway.public_gateways {
            output.push_str(&format!("{} = {}\n", name, quoted(prefix)));
        }

        output
    }
}

/// TOML basic string, escaped.
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
