//! Code for loading program settings.
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Default log level for the program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Program settings, read from `settings.toml` in the model folder
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the model folder.
    ///
    /// If the file is not present, default values are used.
    pub fn from_model_dir(model_dir: &Path) -> Result<Settings> {
        let file_path = model_dir.join(SETTINGS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(&file_path)
    }
}
