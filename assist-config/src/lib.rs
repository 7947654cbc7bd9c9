use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_DIR_NAME: &str = ".assist";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_COMPOSITOR_PROGRAM: &str = "convert";
pub const DEFAULT_CAPTION_POINT_SIZE: u32 = 28;
pub const DEFAULT_CAPTION_BAND_HEIGHT: u32 = 80;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    ConfigDirUnavailable,
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[from] toml::de::Error),
    #[error("Missing {var} in the environment or .env")]
    MissingApiKey { var: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that receives one `run-<timestamp>` folder per comic.
    pub output_root: String,
    pub openai: OpenAiConfig,
    pub compositor: CompositorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Name of the environment variable holding the API key.
    pub api_key_env_var: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// ImageMagick entry point, `convert` for v6 or `magick` for v7.
    pub program: String,
    pub point_size: u32,
    pub band_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: DEFAULT_OUTPUT_ROOT.to_string(),
            openai: OpenAiConfig::default(),
            compositor: CompositorConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env_var: DEFAULT_API_KEY_ENV_VAR.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMPOSITOR_PROGRAM.to_string(),
            point_size: DEFAULT_CAPTION_POINT_SIZE,
            band_height: DEFAULT_CAPTION_BAND_HEIGHT,
        }
    }
}

impl Config {
    /// Reads the API key from the environment variable named in the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when the variable is unset or
    /// holds only whitespace.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        let var = self.openai.api_key_env_var.trim();
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey {
                var: var.to_string(),
            }),
        }
    }
}

/// Loads the assist configuration from disk.
///
/// A missing file yields the defaults. Nothing is ever written.
pub fn load() -> Result<LoadOutcome, ConfigError> {
    let path = config_file_path()?;
    load_at(&path)
}

/// Same as [`load`] for an explicit configuration path.
pub fn load_at(path: &Path) -> Result<LoadOutcome, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(contents) => Some(toml::from_str(&contents)?),
        Err(error) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => return Err(error.into()),
    };

    Ok(LoadOutcome {
        found: config.is_some(),
        config: config.unwrap_or_default(),
        path: path.to_path_buf(),
    })
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub config: Config,
    pub path: PathBuf,
    /// False when no file existed and `config` holds the defaults.
    pub found: bool,
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::ConfigDirUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}
