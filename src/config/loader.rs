//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! `default.toml` (required), `{environment}.toml`, `local.toml`, then
//! `MEMBERS_*` environment variables. A single file named by
//! `MEMBERS_CONFIG_FILE` or `--config` replaces the three file layers.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "MEMBERS_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "MEMBERS_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";

/// `MEMBERS_DATABASE__URL` sets `database.url`.
const ENV_PREFIX: &str = "MEMBERS";
const ENV_SEPARATOR: &str = "__";

/// One configuration file and whether its absence is fatal.
struct Layer {
    path: PathBuf,
    required: bool,
}

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Set when a single file replaces the layered directory.
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Reads `MEMBERS_CONFIG_DIR`, `MEMBERS_CONFIG_FILE` and `MEMBERS_APP_ENV`.
    ///
    /// Setting both the directory and the file is an error.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set; pick a directory of layers or one file",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loads only `path`; environment variables still override it.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads and validates.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads without validating, for callers that still apply CLI overrides.
    pub fn load_unvalidated(&self) -> Result<Settings, ConfigError> {
        self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })
    }

    fn layers(&self) -> Vec<Layer> {
        if let Some(file) = &self.config_file {
            return vec![Layer {
                path: file.clone(),
                required: true,
            }];
        }

        vec![
            Layer {
                path: self.config_dir.join("default.toml"),
                required: true,
            },
            Layer {
                path: self.config_dir.join(self.environment.config_file_name()),
                required: false,
            },
            Layer {
                path: self.config_dir.join("local.toml"),
                required: false,
            },
        ]
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = self
            .layers()
            .into_iter()
            .try_fold(Config::builder(), Self::add_layer)?;

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigError::from)
    }

    fn add_layer(
        builder: ConfigBuilder<DefaultState>,
        layer: Layer,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if layer.required && !layer.path.exists() {
            return Err(ConfigError::file_not_found(layer.path.display().to_string()));
        }

        let file = File::new(&layer.path.to_string_lossy(), FileFormat::Toml);
        Ok(builder.add_source(file.required(layer.required)))
    }
}
