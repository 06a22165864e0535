use serde::{Deserialize, Serialize};

/// Main configuration from FileReplacer.yaml
///
/// Contains the exclusion list, the fallback build configuration and logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacerConfig {
    /// Canonical `name.extension` entries that are never replaced (case-insensitive)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Active configuration used when the trigger does not supply one
    #[serde(default)]
    pub configuration: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rotating log files; no file logging when unset
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default = "default_log_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub debug: bool,

    /// Write the log file as JSON lines instead of plain text
    #[serde(default)]
    pub json: bool,

    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_log_prefix(),
            debug: false,
            json: false,
            console: default_console(),
        }
    }
}

impl Default for ReplacerConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            configuration: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec!["Web.config".to_string()]
}

fn default_log_prefix() -> String {
    "file-replacer".to_string()
}

fn default_console() -> bool {
    true
}
