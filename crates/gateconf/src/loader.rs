//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, GateConfig};
use cas::Eviction;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// A CLI path replaces the local `./cidgate.toml` and is returned even if it
/// does not exist, so that loading it reports the missing file.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/cidgate/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("cidgate/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("cidgate.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and overlay its values onto `config`.
pub fn load_from_file(config: &mut GateConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

fn parse_error(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Overlay the keys present in `contents` onto `config`.
///
/// Keys that are absent keep their current value, so a later file only has to
/// mention what it changes.
pub fn apply_toml(config: &mut GateConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(path, e.to_string()))?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("upload_dir").and_then(|v| v.as_str()) {
            config.infra.paths.upload_dir = expand_path(v);
        }
        if let Some(v) = paths.get("retrieve_dir").and_then(|v| v.as_str()) {
            config.infra.paths.retrieve_dir = expand_path(v);
        }
        if let Some(v) = paths.get("persist_copies").and_then(|v| v.as_bool()) {
            config.infra.paths.persist_copies = v;
        }
    }

    if let Some(bind) = table.get("bind").and_then(|v| v.as_table()) {
        if let Some(v) = bind.get("http_port").and_then(|v| v.as_integer()) {
            config.infra.bind.http_port = u16::try_from(v)
                .map_err(|_| parse_error(path, format!("bind.http_port {} is out of range", v)))?;
        }
        if let Some(v) = bind.get("max_upload_bytes").and_then(|v| v.as_integer()) {
            config.infra.bind.max_upload_bytes = usize::try_from(v).map_err(|_| {
                parse_error(path, format!("bind.max_upload_bytes {} is out of range", v))
            })?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("otlp_endpoint").and_then(|v| v.as_str()) {
            config.infra.telemetry.otlp_endpoint = v.to_string();
        }
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.infra.telemetry.log_level = v.to_string();
        }
    }

    if let Some(backend) = table.get("backend").and_then(|v| v.as_table()) {
        if let Some(v) = backend.get("api_url").and_then(|v| v.as_str()) {
            config.infra.backend.api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = backend.get("timeout_ms").and_then(|v| v.as_integer()) {
            config.infra.backend.timeout_ms = u64::try_from(v)
                .map_err(|_| parse_error(path, format!("backend.timeout_ms {} is negative", v)))?;
        }
    }

    if let Some(cache) = table.get("cache").and_then(|v| v.as_table()) {
        if let Some(v) = cache.get("threshold").and_then(|v| v.as_integer()) {
            config.cache.threshold = usize::try_from(v)
                .map_err(|_| parse_error(path, format!("cache.threshold {} is negative", v)))?;
        }
        if let Some(v) = cache.get("eviction").and_then(|v| v.as_str()) {
            config.cache.eviction = v
                .parse::<Eviction>()
                .map_err(|e| parse_error(path, e.to_string()))?;
        }
    }

    if let Some(gateway) = table.get("gateway").and_then(|v| v.as_table()) {
        if let Some(links) = gateway.get("public_gateways").and_then(|v| v.as_table()) {
            config.gateway.public_gateways = links
                .iter()
                .filter_map(|(name, url)| url.as_str().map(|u| (name.clone(), u.to_string())))
                .collect();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut GateConfig, sources: &mut ConfigSources) {
    apply_env_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Same as [`apply_env_overrides`], reading variables through `lookup`.
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides_with<F>(config: &mut GateConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvOverlay { lookup, sources };

    if let Some(v) = env.string("CIDGATE_UPLOAD_DIR") {
        config.infra.paths.upload_dir = expand_path(&v);
    }
    if let Some(v) = env.string("CIDGATE_RETRIEVE_DIR") {
        config.infra.paths.retrieve_dir = expand_path(&v);
    }
    if let Some(port) = env.parsed("CIDGATE_HTTP_PORT") {
        config.infra.bind.http_port = port;
    }

    if let Some(v) = env.string("CIDGATE_BACKEND_URL") {
        config.infra.backend.api_url = v.trim_end_matches('/').to_string();
    }
    if let Some(ms) = env.parsed("CIDGATE_BACKEND_TIMEOUT_MS") {
        config.infra.backend.timeout_ms = ms;
    }

    if let Some(threshold) = env.parsed("CIDGATE_CACHE_THRESHOLD") {
        config.cache.threshold = threshold;
    }
    if let Some(eviction) = env.parsed::<Eviction>("CIDGATE_CACHE_EVICTION") {
        config.cache.eviction = eviction;
    }

    if let Some(v) = env.string("CIDGATE_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    // Also support standard OTEL env var
    if let Some(v) = env.string("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = env.string("CIDGATE_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
    }
    if let Some(v) = env.string("RUST_LOG") {
        config.infra.telemetry.log_level = v;
    }
}

struct EnvOverlay<'a, F> {
    lookup: F,
    sources: &'a mut ConfigSources,
}

impl<F: Fn(&str) -> Option<String>> EnvOverlay<'_, F> {
    fn string(&mut self, key: &str) -> Option<String> {
        let value = (self.lookup)(key)?;
        self.sources.env_overrides.push(key.to_string());
        Some(value)
    }

    fn parsed<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let value = (self.lookup)(key)?.trim().parse().ok()?;
        self.sources.env_overrides.push(key.to_string());
        Some(value)
    }
}

/// Expand `~/` and a leading `$VAR/` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
        return PathBuf::from(path);
    }

    if let Some(stripped) = path.strip_prefix('$') {
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], Some(&stripped[slash_pos + 1..])),
            None => (stripped, None),
        };
        return match (env::var(var_name), rest) {
            (Ok(value), Some(rest)) => PathBuf::from(value).join(rest),
            (Ok(value), None) => PathBuf::from(value),
            (Err(_), _) => PathBuf::from(path),
        };
    }

    PathBuf::from(path)
}
