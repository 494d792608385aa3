// Configuration loading and parsing (config/runeforge.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::projector::SortMode;
use crate::tier_list::Role;

const CONFIG_FILE: &str = "runeforge.toml";

/// Shipped defaults, written out when no `defaults/` directory is around.
const BUILTIN_DEFAULTS: &str = include_str!("../../../defaults/runeforge.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub connection: ConnectionConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub events_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// 0 disables automatic reconnection.
    pub reconnect_delay_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub default_sort: SortMode,
    #[serde(default)]
    pub default_role: Role,
}

impl Config {
    /// WebSocket URL of the event source, e.g. `ws://127.0.0.1:4246/lcu`.
    pub fn events_url(&self) -> String {
        format!(
            "ws://{}:{}{}",
            self.service.host, self.service.port, self.service.events_path
        )
    }

    /// Base URL of the HTTP endpoints, e.g. `http://127.0.0.1:4246`.
    pub fn service_url(&self) -> String {
        format!("http://{}:{}", self.service.host, self.service.port)
    }

    pub fn reconnect_delay(&self) -> Option<Duration> {
        match self.connection.reconnect_delay_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/runeforge.toml` relative to `base_dir`.
///
/// This does not auto-copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse config text. `path` is only used for error reporting.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Write the built-in defaults into `base_dir/config/` if no config exists.
pub fn write_builtin_defaults(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;
    std::fs::write(&target, BUILTIN_DEFAULTS).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;
    Ok(Some(target))
}

/// Directory the configuration is loaded from.
///
/// The working directory when it has `defaults/` or `config/` (running from
/// a checkout), otherwise the per-user config directory.
pub fn config_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("defaults").exists() || cwd.join("config").exists() {
        return Ok(cwd);
    }
    ProjectDirs::from("", "", "runeforge")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ConfigError::DefaultsCopyError {
            message: "no home directory to store configuration in".into(),
        })
}

/// Convenience wrapper: resolves the config directory, makes sure a config
/// file exists there and loads it.
pub fn load_config() -> Result<Config, ConfigError> {
    let base = config_base_dir()?;
    if base.join("defaults").exists() {
        ensure_config_files(&base)?;
    } else {
        write_builtin_defaults(&base)?;
    }
    load_config_from(&base)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.service.host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "service.host".into(),
            message: "must not be empty".into(),
        });
    }

    if config.service.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "service.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if !config.service.events_path.starts_with('/') {
        return Err(ConfigError::ValidationError {
            field: "service.events_path".into(),
            message: format!("must start with '/', got {:?}", config.service.events_path),
        });
    }

    if config.connection.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "connection.request_timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fresh scratch directory under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("runeforge_config_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(base: &Path, text: &str) {
        let config_dir = base.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), text).unwrap();
    }

    #[test]
    fn builtin_defaults_parse_and_validate() {
        let config = parse_config(BUILTIN_DEFAULTS, Path::new("builtin")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.service.port, 4246);
        assert_eq!(config.events_url(), "ws://127.0.0.1:4246/lcu");
        assert_eq!(config.service_url(), "http://127.0.0.1:4246");
        assert_eq!(config.ui.default_sort, SortMode::ByPopularity);
        assert_eq!(config.ui.default_role, Role::All);
        assert_eq!(config.reconnect_delay(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn load_valid_config_from_dir() {
        let tmp = scratch("valid");
        write_config(&tmp, BUILTIN_DEFAULTS);

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.service.host, "127.0.0.1");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn zero_reconnect_delay_disables_reconnect() {
        let text = BUILTIN_DEFAULTS.replace("reconnect_delay_secs = 3", "reconnect_delay_secs = 0");
        let config = parse_config(&text, Path::new("t")).unwrap();
        assert_eq!(config.reconnect_delay(), None);
    }

    #[test]
    fn ui_section_values_are_read() {
        let text = BUILTIN_DEFAULTS
            .replace("default_sort = \"ByPopularity\"", "default_sort = \"ByWinRate\"")
            .replace("default_role = \"ALL\"", "default_role = \"JUNGLE\"");
        let config = parse_config(&text, Path::new("t")).unwrap();
        assert_eq!(config.ui.default_sort, SortMode::ByWinRate);
        assert_eq!(config.ui.default_role, Role::Jungle);
    }

    #[test]
    fn rejects_port_zero() {
        let text = BUILTIN_DEFAULTS.replace("port = 4246", "port = 0");
        let config = parse_config(&text, Path::new("t")).unwrap();
        match validate(&config).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "service.port"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_relative_events_path() {
        let text = BUILTIN_DEFAULTS.replace("events_path = \"/lcu\"", "events_path = \"lcu\"");
        let config = parse_config(&text, Path::new("t")).unwrap();
        match validate(&config).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "service.events_path")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let text = BUILTIN_DEFAULTS.replace("request_timeout_secs = 10", "request_timeout_secs = 0");
        let config = parse_config(&text, Path::new("t")).unwrap();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = scratch("missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch("invalid");
        write_config(&tmp, "this is not valid [[[ toml");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = scratch("ensure_copy");
        let defaults = tmp.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), BUILTIN_DEFAULTS).unwrap();
        fs::write(defaults.join("extra.toml.example"), "x = 1").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);
        assert!(!tmp.join("config/extra.toml.example").exists());

        // Second run leaves the existing copy alone.
        assert!(ensure_config_files(&tmp).unwrap().is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = scratch("ensure_none");
        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn builtin_defaults_written_once() {
        let tmp = scratch("builtin");
        let written = write_builtin_defaults(&tmp).unwrap();
        assert_eq!(written, Some(tmp.join("config").join(CONFIG_FILE)));
        assert!(write_builtin_defaults(&tmp).unwrap().is_none());
        load_config_from(&tmp).unwrap();
        let _ = fs::remove_dir_all(&tmp);
    }
}
