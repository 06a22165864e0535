use crate::models::ReplacerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Default configuration file name, looked up in the configuration directory
pub const CONFIG_FILE_NAME: &str = "FileReplacer.yaml";

/// Prefix of environment overrides, e.g. `FILE_REPLACER_EXCLUDE=Web.config,App.config`
pub const ENV_PREFIX: &str = "FILE_REPLACER";

/// Configuration manager for loading and saving `FileReplacer.yaml`.
///
/// Values are layered, later sources winning:
/// - Built-in defaults ([`ReplacerConfig::default`])
/// - The YAML file
/// - `FILE_REPLACER_*` environment variables (`__` separates nested keys,
///   so `FILE_REPLACER_LOGGING__DEBUG=true`; `exclude` is comma separated)
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager for the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `FileReplacer.yaml` (usually the project root)
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        }
    }

    /// Load the configuration.
    ///
    /// # Returns
    /// The layered ReplacerConfig; a missing file means defaults plus environment
    pub fn load(&self) -> Result<ReplacerConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let file = File::from(self.config_path.as_std_path())
            .format(FileFormat::Yaml)
            .required(false);

        let config = build(file, None)
            .with_context(|| format!("Failed to load config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Load an explicitly named configuration file, which must exist.
    pub fn load_from_file(path: &Utf8Path) -> Result<ReplacerConfig> {
        let file = File::from(path.as_std_path())
            .format(FileFormat::Yaml)
            .required(true);

        let config =
            build(file, None).with_context(|| format!("Failed to load config: {}", path))?;

        tracing::info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Save the configuration file.
    ///
    /// # Arguments
    /// * `config` - The ReplacerConfig to save
    pub fn save(&self, config: &ReplacerConfig) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("Failed to create config directory: {}", self.config_dir)
            })?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

/// Layer a YAML file and the environment into a ReplacerConfig.
///
/// `env` replaces the process environment when given.
fn build(
    file: File<config::FileSourceFile, FileFormat>,
    env: Option<config::Map<String, String>>,
) -> Result<ReplacerConfig> {
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("exclude")
        .source(env);

    let settings = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()
        .context("Failed to read configuration sources")?;

    settings
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
