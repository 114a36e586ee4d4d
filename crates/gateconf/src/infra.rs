//! Infrastructure configuration - fixed for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where persisted copies go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Copies of uploaded originals.
    /// Default: ./upload
    #[serde(default = "PathsConfig::default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Copies of retrieved content.
    /// Default: ./retrieve
    #[serde(default = "PathsConfig::default_retrieve_dir")]
    pub retrieve_dir: PathBuf,

    /// Turn off to skip writing copies entirely.
    /// Default: true
    #[serde(default = "PathsConfig::default_persist_copies")]
    pub persist_copies: bool,
}

impl PathsConfig {
    fn default_upload_dir() -> PathBuf {
        PathBuf::from("upload")
    }

    fn default_retrieve_dir() -> PathBuf {
        PathBuf::from("retrieve")
    }

    fn default_persist_copies() -> bool {
        true
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upload_dir: Self::default_upload_dir(),
            retrieve_dir: Self::default_retrieve_dir(),
            persist_copies: Self::default_persist_copies(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Default: 8081
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,

    /// Largest accepted request body on /upload.
    /// Default: 52428800 (50 MiB)
    #[serde(default = "BindConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl BindConfig {
    fn default_http_port() -> u16 {
        8081
    }

    fn default_max_upload_bytes() -> usize {
        50 * 1024 * 1024
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            http_port: Self::default_http_port(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint. Empty disables OpenTelemetry export.
    /// Default: ""
    #[serde(default)]
    pub otlp_endpoint: String,

    /// Log level or full EnvFilter directive.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    pub fn otlp_enabled(&self) -> bool {
        !self.otlp_endpoint.trim().is_empty()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: String::new(),
            log_level: Self::default_log_level(),
        }
    }
}

/// Storage backend (Kubo RPC) client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the RPC API, without the `/api/v0` suffix.
    /// Default: http://127.0.0.1:5001
    #[serde(default = "BackendConfig::default_api_url")]
    pub api_url: String,

    /// Per-request timeout in milliseconds.
    /// Default: 30000
    #[serde(default = "BackendConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl BackendConfig {
    fn default_api_url() -> String {
        "http://127.0.0.1:5001".to_string()
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: Self::default_api_url(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Infrastructure configuration - cannot change at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_defaults() {
        let paths = PathsConfig::default();
        assert_eq!(paths.upload_dir, PathBuf::from("upload"));
        assert_eq!(paths.retrieve_dir, PathBuf::from("retrieve"));
        assert!(paths.persist_copies);
    }

    #[test]
    fn test_bind_defaults() {
        let bind = BindConfig::default();
        assert_eq!(bind.http_port, 8081);
        assert_eq!(bind.max_upload_bytes, 52_428_800);
    }

    #[test]
    fn test_telemetry_disabled_by_default() {
        let telemetry = TelemetryConfig::default();
        assert!(!telemetry.otlp_enabled());
        assert_eq!(telemetry.log_level, "info");
    }

    #[test]
    fn test_backend_defaults() {
        let backend = BackendConfig::default();
        assert_eq!(backend.api_url, "http://127.0.0.1:5001");
        assert_eq!(backend.timeout_ms, 30_000);
    }
}
