use std::env;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{from_str, to_string_pretty};

/// Name of the configuration file.
pub(crate) const CONFIG_NAME: &str = "config.json";

/// Config that is used to do general setup.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Config {
    /// Where final selections are saved.
    #[serde(rename = "saveFolder")]
    save_folder: String,
    /// Where preview downloads are materialized before being removed.
    #[serde(rename = "tempFolder")]
    temp_folder: String,
    /// The editor `wallgrab edit` opens the config file with.
    #[serde(rename = "editor")]
    editor: String,
    /// Optional API key, sent with every API call when present.
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    /// Where final selections are saved.
    pub(crate) fn save_folder(&self) -> &Path {
        Path::new(&self.save_folder)
    }

    /// Where preview downloads are materialized before being removed.
    pub(crate) fn temp_folder(&self) -> &Path {
        Path::new(&self.temp_folder)
    }

    /// The editor `wallgrab edit` opens the config file with.
    pub(crate) fn editor(&self) -> &str {
        &self.editor
    }

    /// Optional API key, sent with every API call when present.
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Full path of the configuration file.
    pub(crate) fn config_path() -> PathBuf {
        config_dir().join(CONFIG_NAME)
    }

    /// Checks config and ensures it isn't missing.
    pub(crate) fn config_exists() -> bool {
        if !Self::config_path().exists() {
            trace!("{}: does not exist!", CONFIG_NAME);
            return false;
        }

        true
    }

    /// Creates the config file with default values.
    pub(crate) fn create_config() -> Result<(), Error> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = to_string_pretty(&Config::default())?;
        write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

        info!("The config file was created at {}.", path.display());
        Ok(())
    }

    /// Gets the global instance of the `Config`.
    pub(crate) fn get() -> &'static Self {
        CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                error!("Unable to load `{}`. Error: {}", CONFIG_NAME, e);
                warn!("The program will use default values; run `wallgrab edit` to fix the config file.");
                Config::default()
            })
        })
    }

    /// Loads and returns the config for quick management and settings.
    fn load() -> Result<Self, Error> {
        let path = Self::config_path();
        let contents = read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Ok(from_str(&contents)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            save_folder: String::from("wallpapers"),
            temp_folder: env::temp_dir()
                .join("wallgrab")
                .to_string_lossy()
                .into_owned(),
            editor: env::var("EDITOR").unwrap_or_else(|_| String::from("vi")),
            api_key: None,
        }
    }
}

/// Directory the config file lives in, `~/.config/wallgrab` on unix.
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wallgrab")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let json = to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = from_str(&json).unwrap();

        assert_eq!(parsed.save_folder, Config::default().save_folder);
        assert!(parsed.api_key.is_none());
    }

    #[test]
    fn api_key_is_optional_in_the_file() {
        let parsed: Config = from_str(
            r#"{"saveFolder": "walls", "tempFolder": "/tmp/w", "editor": "nano"}"#,
        )
        .unwrap();

        assert_eq!(parsed.editor(), "nano");
        assert!(parsed.api_key().is_none());
    }
}
