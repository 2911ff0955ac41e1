//! Locating, reading and writing ferrosync config files

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `FERROSYNC__SYNC__TIMEOUT_MS`
pub const ENV_PREFIX: &str = "FERROSYNC";

/// File names looked for in the working directory, first match wins
const LOCAL_NAMES: &[&str] = &[
    "ferrosync.yaml",
    "ferrosync.yml",
    "ferrosync.toml",
    ".ferrosync.yaml",
    ".ferrosync.yml",
    ".ferrosync.toml",
];

/// File names looked for under the user config directory
const USER_NAMES: &[&str] = &["config.yaml", "config.yml", "config.toml"];

/// Entry points for turning config files into a [`Config`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the first config file found, then the environment
    pub fn load_default() -> ConfigResult<Config> {
        let builder = ConfigBuilder::new();
        let builder = match Self::config_exists() {
            Some(path) => builder.add_source_file(path),
            None => builder,
        };
        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Defaults, then `path`, then the environment; `path` must exist
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }

        ConfigBuilder::new()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Load from `path` when given, otherwise from the default locations
    pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
        path.map_or_else(Self::load_default, Self::load_from_file)
    }

    /// Write `config` in the format implied by the extension (YAML otherwise)
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(config).map_err(|e| ConfigError::encode("toml", e))?
            }
            Some("json") => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::encode("json", e))?
            }
            _ => serde_yaml::to_string(config).map_err(|e| ConfigError::encode("yaml", e))?,
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the defaults to `path` as a starting point for users
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// First existing file among the local and per-user locations
    pub fn config_exists() -> Option<PathBuf> {
        let local = LOCAL_NAMES.iter().map(PathBuf::from);
        let user = user_config_dir()
            .into_iter()
            .flat_map(|dir| USER_NAMES.iter().map(move |name| dir.join(name)));
        local.chain(user).find(|path| path.is_file())
    }
}

/// `ferrosync` directory under the platform's per-user config location
fn user_config_dir() -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join("Library/Application Support"))
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
    };
    base.map(|dir| dir.join("ferrosync"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("ferrosync.yaml")]
    #[case("ferrosync.toml")]
    #[case("ferrosync.json")]
    fn test_save_and_load(#[case] file_name: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(file_name);

        let mut original = Config::default();
        original.watch.duration_ms = 750;
        original.sync.exclude = vec!["node_modules".to_string()];
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.watch.duration_ms, 750);
        assert_eq!(loaded.sync.exclude, vec!["node_modules".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load_from_file("/nonexistent/ferrosync.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_generate_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("default.yaml");

        ConfigLoader::generate_default_config(&config_path).unwrap();
        assert!(config_path.exists());

        let config = ConfigLoader::load(Some(&config_path)).unwrap();
        assert_eq!(config.sync.executable, "rsync");
    }
}
