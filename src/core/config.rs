//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.quizshell/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::route::{DEFAULT_MODULE, RouteDescriptor, default_routes};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct QuizshellConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Replaces the built-in route table when non-empty.
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Where `modules/<id>/<id>.{html,css,js}` are served from. Unset means
    /// the bundles compiled into the binary.
    pub base_url: Option<String>,
    pub default_route: Option<String>,
    pub crossfade_ms: Option<u64>,
    pub crossfade_module: Option<String>,
    pub probe_scripts: Option<bool>,
    pub preload: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: Option<StorageBackend>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_CROSSFADE_MS: u64 = 250;
pub const DEFAULT_CROSSFADE_MODULE: &str = "home";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: Option<String>,
    pub default_module: String,
    pub crossfade: Duration,
    pub crossfade_module: Option<String>,
    pub probe_scripts: bool,
    pub preload: Vec<String>,
    pub storage_backend: StorageBackend,
    /// `None` starts a fresh session.
    pub session_id: Option<String>,
    pub routes: Vec<RouteDescriptor>,
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub session_id: Option<String>,
    pub memory: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.quizshell/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".quizshell").join("config.toml"))
}

/// Load config from `~/.quizshell/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `QuizshellConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<QuizshellConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(QuizshellConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<QuizshellConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(QuizshellConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: QuizshellConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG: &str = r#"# quizshell configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# base_url = "http://localhost:8080"   # Or QUIZSHELL_BASE_URL; unset = built-in bundles
# default_route = "home"               # Module unknown paths redirect to
# crossfade_ms = 250                   # Or QUIZSHELL_CROSSFADE_MS; 0 disables
# crossfade_module = "home"
# probe_scripts = false                # Require modules/<id>/<id>.js to exist
# preload = ["home", "topic-list"]     # Warm the bundle cache at startup

# [storage]
# backend = "file"                     # "file" or "memory"
# session_id = "..."                   # Or QUIZSHELL_SESSION; resume a session

# [[routes]]                           # Replaces the built-in route table
# path = "/topics/:categoryId"
# module_id = "topic-list"
# name = "Topics"
# nav = true
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &QuizshellConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &QuizshellConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → embedded
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("QUIZSHELL_BASE_URL"))
        .or_else(|| config.general.base_url.clone())
        .filter(|url| !url.trim().is_empty());

    // Session: CLI → env → config → fresh
    let session_id = cli
        .session_id
        .clone()
        .or_else(|| env("QUIZSHELL_SESSION"))
        .or_else(|| config.storage.session_id.clone());

    // Cross-fade: env → config → default
    let crossfade_ms = env("QUIZSHELL_CROSSFADE_MS")
        .and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(e) => {
                warn!("Ignoring QUIZSHELL_CROSSFADE_MS={raw:?}: {e}");
                None
            }
        })
        .or(config.general.crossfade_ms)
        .unwrap_or(DEFAULT_CROSSFADE_MS);

    let storage_backend = if cli.memory {
        StorageBackend::Memory
    } else {
        config.storage.backend.unwrap_or_default()
    };

    let routes = if config.routes.is_empty() {
        default_routes()
    } else {
        config.routes.clone()
    };

    ResolvedConfig {
        base_url,
        default_module: config
            .general
            .default_route
            .clone()
            .unwrap_or_else(|| DEFAULT_MODULE.to_string()),
        crossfade: Duration::from_millis(crossfade_ms),
        crossfade_module: Some(
            config
                .general
                .crossfade_module
                .clone()
                .unwrap_or_else(|| DEFAULT_CROSSFADE_MODULE.to_string()),
        )
        .filter(|_| crossfade_ms > 0),
        probe_scripts: config.general.probe_scripts.unwrap_or(false),
        preload: config.general.preload.clone().unwrap_or_default(),
        storage_backend,
        session_id,
        routes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = QuizshellConfig::default();
        assert!(config.routes.is_empty());
        assert!(config.general.base_url.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&QuizshellConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.base_url, None);
        assert_eq!(resolved.default_module, "home");
        assert_eq!(resolved.crossfade, Duration::from_millis(DEFAULT_CROSSFADE_MS));
        assert_eq!(resolved.crossfade_module.as_deref(), Some("home"));
        assert!(!resolved.probe_scripts);
        assert_eq!(resolved.storage_backend, StorageBackend::File);
        assert_eq!(resolved.routes, default_routes());
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = QuizshellConfig {
            general: GeneralConfig {
                base_url: Some("http://cdn.local/app".to_string()),
                default_route: Some("topic-list".to_string()),
                crossfade_ms: Some(0),
                probe_scripts: Some(true),
                preload: Some(vec!["home".to_string()]),
                ..Default::default()
            },
            storage: StorageConfig {
                backend: Some(StorageBackend::Memory),
                session_id: Some("abc".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.base_url.as_deref(), Some("http://cdn.local/app"));
        assert_eq!(resolved.default_module, "topic-list");
        assert!(resolved.crossfade.is_zero());
        assert_eq!(resolved.crossfade_module, None);
        assert!(resolved.probe_scripts);
        assert_eq!(resolved.preload, vec!["home"]);
        assert_eq!(resolved.storage_backend, StorageBackend::Memory);
        assert_eq!(resolved.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = QuizshellConfig {
            general: GeneralConfig {
                base_url: Some("http://from-config".to_string()),
                crossfade_ms: Some(100),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "QUIZSHELL_BASE_URL" => Some("http://from-env".to_string()),
            "QUIZSHELL_CROSSFADE_MS" => Some("40".to_string()),
            "QUIZSHELL_SESSION" => Some("env-session".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.base_url.as_deref(), Some("http://from-env"));
        assert_eq!(resolved.crossfade, Duration::from_millis(40));
        assert_eq!(resolved.session_id.as_deref(), Some("env-session"));

        let cli = CliOverrides {
            base_url: Some("http://from-cli".to_string()),
            session_id: Some("cli-session".to_string()),
            memory: true,
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.base_url.as_deref(), Some("http://from-cli"));
        assert_eq!(resolved.session_id.as_deref(), Some("cli-session"));
        assert_eq!(resolved.storage_backend, StorageBackend::Memory);
    }

    #[test]
    fn test_bad_crossfade_env_falls_back() {
        let env = |key: &str| (key == "QUIZSHELL_CROSSFADE_MS").then(|| "soon".to_string());
        let resolved = resolve_with_env(&QuizshellConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.crossfade, Duration::from_millis(DEFAULT_CROSSFADE_MS));
    }

    #[test]
    fn test_toml_with_routes() {
        let toml_str = r#"
[general]
base_url = "http://localhost:8080"
crossfade_ms = 500

[storage]
backend = "memory"

[[routes]]
path = "/"
module_id = "home"
name = "Home"
full_bleed = true

[[routes]]
path = "/quiz/:topicId"
module_id = "quiz"
name = "Quiz"
icon = "?"
"#;
        let config: QuizshellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.crossfade_ms, Some(500));
        assert_eq!(config.storage.backend, Some(StorageBackend::Memory));
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[0].full_bleed);
        assert!(!config.routes[1].nav);
        assert_eq!(config.routes[1].icon.as_deref(), Some("?"));

        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.routes.len(), 2);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[general]
probe_scripts = true
"#;
        let config: QuizshellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.probe_scripts, Some(true));
        assert!(config.general.base_url.is_none());
        assert!(config.storage.backend.is_none());
    }

    #[test]
    fn test_generated_default_is_valid_toml() {
        let config: QuizshellConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_missing_file_generates_default() {
        let dir = std::env::temp_dir().join(format!("quizshell-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let config = load_config_from(&path).unwrap();
        assert!(config.general.base_url.is_none());
        assert!(path.exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("quizshell-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nbase_url = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(dir);
    }
}
