//! Configuration builder for layered configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Key whose environment value is split on commas into a list
const EXCLUDE_KEY: &str = "sync.exclude";

/// Separator between prefix, section and key in variable names
const ENV_SEPARATOR: &str = "__";

/// Layers defaults, config files and `FERROSYNC__*` variables, later layers winning
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Empty builder; defaults are always applied underneath
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
        }
    }

    /// Add a configuration file source; missing files are skipped
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Read `{prefix}__section__key` variables
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Merge every layer over the defaults and validate the result
    pub fn build(self) -> ConfigResult<Config> {
        let defaults = serde_yaml::to_value(Config::default())
            .map_err(|e| ConfigError::encode("yaml", e))?;
        let mut layered = self.inner.add_source(config::Config::try_from(&defaults)?);

        for source in self.sources {
            layered = match source {
                ConfigSource::File { path, format } if path.is_file() => {
                    layered.add_source(File::from(path).format(format))
                }
                ConfigSource::File { .. } => layered,
                ConfigSource::Environment { prefix } => layered.add_source(
                    Environment::with_prefix(&prefix)
                        .separator(ENV_SEPARATOR)
                        .list_separator(",")
                        .with_list_parse_key(EXCLUDE_KEY)
                        .try_parsing(true),
                ),
            };
        }

        let config: Config = layered.build()?.try_deserialize()?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Reject settings the watcher cannot run with
    pub fn validate(config: &Config) -> ConfigResult<()> {
        let intervals = [
            ("watch.duration_ms", config.watch.duration_ms),
            ("watch.polling_interval_ms", config.watch.polling_interval_ms),
            ("sync.timeout_ms", config.sync.timeout_ms),
        ];
        if let Some((key, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::invalid(*key, "must be greater than 0"));
        }

        if config.sync.executable.trim().is_empty() {
            return Err(ConfigError::invalid("sync.executable", "must not be empty"));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
